//! Fan-out of relay events to their audience.
//!
//! Every broadcast iterates a snapshot of the recipient set taken from the
//! registry, so connections that close mid-broadcast cannot disturb the
//! iteration. A failed send affects only its own recipient.

use std::sync::Arc;

use tracing::{debug, error, warn};

use proctor_core::types::id::ConnectionId;

use crate::connection::handle::{ConnectionHandle, DeliveryError};
use crate::message::serializer;
use crate::message::types::OutboundMessage;
use crate::metrics::RelayMetrics;
use crate::registry::Registry;

/// Outcome of one fan-out pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutReport {
    /// Recipients the message was enqueued for.
    pub delivered: usize,
    /// Lagging recipients whose copy was dropped.
    pub dropped: usize,
    /// Closed recipients removed from the admin set.
    pub pruned: usize,
}

/// Delivers events to all admins or to one student.
#[derive(Debug)]
pub struct Broadcaster {
    registry: Arc<Registry>,
    metrics: Arc<RelayMetrics>,
}

impl Broadcaster {
    /// Creates a broadcaster over the given registry.
    pub fn new(registry: Arc<Registry>, metrics: Arc<RelayMetrics>) -> Self {
        Self { registry, metrics }
    }

    /// Sends `message` to every admin registered right now, pruning those
    /// whose connection has closed.
    pub async fn to_all_admins(&self, message: &OutboundMessage) -> FanoutReport {
        let snapshot = self.registry.admin_snapshot().await;
        if snapshot.expired > 0 {
            debug!(count = snapshot.expired, "Dropped expired admin entries");
            self.metrics.admins_pruned_count(snapshot.expired as u64);
        }
        let mut report = self.to_admins(&snapshot.admins, message).await;
        report.pruned += snapshot.expired;
        report
    }

    /// Sends `message` to an already-snapshotted admin set, pruning any
    /// admin whose connection turns out to be closed.
    pub async fn to_admins(
        &self,
        admins: &[Arc<ConnectionHandle>],
        message: &OutboundMessage,
    ) -> FanoutReport {
        let mut report = FanoutReport::default();
        if admins.is_empty() {
            return report;
        }

        let text = match serializer::serialize_outbound(message) {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "Failed to serialize broadcast message");
                return report;
            }
        };

        let mut dead: Vec<ConnectionId> = Vec::new();
        for admin in admins {
            match admin.send_text(text.clone()) {
                Ok(()) => report.delivered += 1,
                Err(DeliveryError::Lagging) => report.dropped += 1,
                Err(e) => {
                    debug!(conn_id = %admin.id, error = %e, "Admin unreachable, pruning");
                    dead.push(admin.id);
                }
            }
        }

        if !dead.is_empty() {
            report.pruned = self.registry.prune_admins(&dead).await;
            self.metrics.admins_pruned_count(report.pruned as u64);
        }

        self.metrics.message_sent_count(report.delivered as u64);
        self.metrics.message_dropped_count(report.dropped as u64);
        report
    }

    /// Sends `message` to the connection registered under `student_id`.
    ///
    /// Closed student connections are not pruned here; their own teardown
    /// removes the entry and notifies admins.
    pub async fn to_student(
        &self,
        student_id: &str,
        message: &OutboundMessage,
    ) -> Result<(), DeliveryError> {
        let conn = self
            .registry
            .lookup_student(student_id)
            .await
            .ok_or(DeliveryError::NotRegistered)?;

        match conn.send(message) {
            Ok(()) => {
                self.metrics.message_sent_count(1);
                Ok(())
            }
            Err(e) => {
                if matches!(e, DeliveryError::Lagging) {
                    self.metrics.message_dropped_count(1);
                }
                warn!(conn_id = %conn.id, student_id = %student_id, error = %e, "Send to student failed");
                Err(e)
            }
        }
    }
}
