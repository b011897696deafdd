//! # proctor-realtime
//!
//! Connection registry and broadcast relay for proctored exams. Provides:
//!
//! - Classification of WebSocket connections as admin or student
//! - The authoritative student/admin registry
//! - Fan-out of screen frames and roster changes to every admin
//! - Targeted exam termination for a single student
//! - A WebSocket client speaking the same envelope

pub mod client;
pub mod connection;
pub mod message;
pub mod metrics;
pub mod registry;
pub mod server;
pub mod session_control;

pub use client::RelayClient;
pub use connection::manager::ConnectionManager;
pub use registry::Registry;
pub use server::RelayEngine;
