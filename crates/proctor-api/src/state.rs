//! Application state shared across all handlers.

use std::sync::Arc;

use proctor_core::config::AppConfig;
use proctor_realtime::server::RelayEngine;

/// Application state passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Relay engine
    pub relay: Arc<RelayEngine>,
}

impl AppState {
    /// Builds state with a fresh relay engine for `config`.
    pub fn new(config: AppConfig) -> Self {
        let relay = Arc::new(RelayEngine::new(&config.relay));
        Self {
            config: Arc::new(config),
            relay,
        }
    }
}
