//! Top-level relay engine that ties together all subsystems.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tokio::sync::broadcast;
use tracing::info;

use proctor_core::config::RelayConfig;

use crate::connection::authenticator::{ClientAssertedIdentity, IdentityVerifier, SharedAdminKey};
use crate::connection::manager::ConnectionManager;
use crate::metrics::RelayMetrics;
use crate::registry::Registry;

/// Central relay engine shared by every WebSocket task.
#[derive(Clone)]
pub struct RelayEngine {
    /// Connection manager and router.
    pub connections: Arc<ConnectionManager>,
    /// Student/admin registry.
    pub registry: Arc<Registry>,
    /// Metrics collector.
    pub metrics: Arc<RelayMetrics>,
    /// Shutdown signal sender.
    shutdown_tx: broadcast::Sender<()>,
    /// Set once shutdown has begun.
    shutting_down: Arc<AtomicBool>,
    /// Engine start time.
    started_at: Instant,
}

impl std::fmt::Debug for RelayEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayEngine").finish()
    }
}

impl RelayEngine {
    /// Creates a relay engine. Admins must present `admin_key` when one is
    /// configured; otherwise identities are taken as asserted.
    pub fn new(config: &RelayConfig) -> Self {
        let verifier: Arc<dyn IdentityVerifier> = match config.admin_key.as_deref() {
            Some(key) if !key.is_empty() => Arc::new(SharedAdminKey::new(key)),
            _ => Arc::new(ClientAssertedIdentity),
        };
        Self::with_verifier(config, verifier)
    }

    /// Creates a relay engine with a custom identity verifier.
    pub fn with_verifier(config: &RelayConfig, verifier: Arc<dyn IdentityVerifier>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        let metrics = Arc::new(RelayMetrics::new());
        let registry = Arc::new(Registry::new());
        let connections = Arc::new(ConnectionManager::new(
            config.clone(),
            registry.clone(),
            verifier,
            metrics.clone(),
        ));

        info!(
            outbound_buffer_size = config.outbound_buffer_size,
            admin_key = config.admin_key.is_some(),
            "Relay engine initialized"
        );

        Self {
            connections,
            registry,
            metrics,
            shutdown_tx,
            shutting_down: Arc::new(AtomicBool::new(false)),
            started_at: Instant::now(),
        }
    }

    /// Subscribes to the shutdown signal. Returns `None` if shutdown has
    /// already begun, in which case the signal may have been missed.
    pub fn subscribe_shutdown(&self) -> Option<broadcast::Receiver<()>> {
        // The flag is set before the signal is sent, so checking after
        // subscribing cannot miss both.
        let rx = self.shutdown_tx.subscribe();
        if self.is_shutting_down() {
            return None;
        }
        Some(rx)
    }

    /// Whether shutdown has begun.
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Seconds since the engine was created.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Initiates a graceful shutdown: signals every connection task to stop,
    /// then marks all connections closed and clears the registry.
    pub async fn shutdown(&self) {
        if self.shutting_down.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Shutting down relay engine");

        let _ = self.shutdown_tx.send(());
        self.connections.close_all().await;

        info!("Relay engine shut down");
    }
}
