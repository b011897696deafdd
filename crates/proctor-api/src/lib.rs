//! # proctor-api
//!
//! HTTP layer for the proctor relay built on Axum.
//!
//! Serves the `/ws` upgrade endpoint that feeds the relay engine, plus a
//! small health side-channel under `/api`.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use state::AppState;
