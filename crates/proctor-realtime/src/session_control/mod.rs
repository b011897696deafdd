//! Delivery to admins and students: fan-out and exam termination.

pub mod broadcast;
pub mod terminator;

pub use broadcast::{Broadcaster, FanoutReport};
