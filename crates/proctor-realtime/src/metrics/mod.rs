//! Relay metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Relay-level metrics counters.
#[derive(Debug, Default)]
pub struct RelayMetrics {
    /// Total connections accepted
    connections_total: AtomicU64,
    /// Connections currently open
    connections_active: AtomicU64,
    /// Total inbound messages received
    messages_received: AtomicU64,
    /// Total outbound messages enqueued to a recipient
    messages_sent: AtomicU64,
    /// Outbound messages dropped for a lagging recipient
    messages_dropped: AtomicU64,
    /// Inbound messages discarded as malformed
    messages_malformed: AtomicU64,
    /// Screen frames fanned out
    frames_relayed: AtomicU64,
    /// Admin connections pruned during fan-out
    admins_pruned: AtomicU64,
    /// Termination notices that reached their student
    terminations_delivered: AtomicU64,
    /// Termination requests for students that were not connected
    terminations_missed: AtomicU64,
}

impl RelayMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new connection
    pub fn connection_opened(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a disconnection
    pub fn connection_closed(&self) {
        // Saturate at zero so a double close cannot wrap the gauge.
        let _ = self
            .connections_active
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1));
    }

    /// Record an inbound message
    pub fn message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record `count` outbound messages enqueued
    pub fn message_sent_count(&self, count: u64) {
        self.messages_sent.fetch_add(count, Ordering::Relaxed);
    }

    /// Record `count` outbound messages dropped
    pub fn message_dropped_count(&self, count: u64) {
        self.messages_dropped.fetch_add(count, Ordering::Relaxed);
    }

    /// Record a malformed inbound message
    pub fn message_malformed(&self) {
        self.messages_malformed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a relayed frame
    pub fn frame_relayed(&self) {
        self.frames_relayed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record pruned admin connections
    pub fn admins_pruned_count(&self, count: u64) {
        self.admins_pruned.fetch_add(count, Ordering::Relaxed);
    }

    /// Record the outcome of a termination request
    pub fn termination(&self, delivered: bool) {
        if delivered {
            self.terminations_delivered.fetch_add(1, Ordering::Relaxed);
        } else {
            self.terminations_missed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            messages_malformed: self.messages_malformed.load(Ordering::Relaxed),
            frames_relayed: self.frames_relayed.load(Ordering::Relaxed),
            admins_pruned: self.admins_pruned.load(Ordering::Relaxed),
            terminations_delivered: self.terminations_delivered.load(Ordering::Relaxed),
            terminations_missed: self.terminations_missed.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Total connections ever accepted
    pub connections_total: u64,
    /// Currently open connections
    pub connections_active: u64,
    /// Total inbound messages
    pub messages_received: u64,
    /// Total outbound messages enqueued
    pub messages_sent: u64,
    /// Outbound messages dropped for lagging recipients
    pub messages_dropped: u64,
    /// Inbound messages discarded as malformed
    pub messages_malformed: u64,
    /// Screen frames fanned out
    pub frames_relayed: u64,
    /// Admin connections pruned during fan-out
    pub admins_pruned: u64,
    /// Termination notices delivered
    pub terminations_delivered: u64,
    /// Termination requests for absent students
    pub terminations_missed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_gauge_never_underflows() {
        let metrics = RelayMetrics::new();
        metrics.connection_opened();
        metrics.connection_closed();
        metrics.connection_closed();

        let snap = metrics.snapshot();
        assert_eq!(snap.connections_total, 1);
        assert_eq!(snap.connections_active, 0);
    }

    #[test]
    fn test_termination_outcomes_counted_separately() {
        let metrics = RelayMetrics::new();
        metrics.termination(true);
        metrics.termination(false);
        metrics.termination(false);

        let snap = metrics.snapshot();
        assert_eq!(snap.terminations_delivered, 1);
        assert_eq!(snap.terminations_missed, 2);
    }
}
