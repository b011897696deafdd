//! WebSocket connection management: lifecycle, pool, handles and identity.

pub mod authenticator;
pub mod handle;
pub mod manager;
pub mod pool;

pub use handle::{ClientRole, ConnectionHandle, DeliveryError};
pub use manager::ConnectionManager;
