//! Relay engine configuration.

use serde::{Deserialize, Serialize};

/// Settings for the connection registry and broadcast relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Outbound queue depth per connection. When a recipient's queue is full
    /// further messages for it are dropped instead of stalling the relay.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer_size: usize,
    /// Largest inbound text message accepted, in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size_bytes: usize,
    /// Reason sent with `exam-terminated` when the admin supplies none.
    #[serde(default = "default_termination_reason")]
    pub default_termination_reason: String,
    /// Stamp `screen-frame` messages lacking a timestamp with receive time.
    /// When disabled such frames are discarded as malformed.
    #[serde(default = "default_true")]
    pub stamp_missing_timestamps: bool,
    /// When set, `register-admin` is only honoured for connections that
    /// presented this key as `?token=` on upgrade.
    #[serde(default)]
    pub admin_key: Option<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            outbound_buffer_size: default_outbound_buffer(),
            max_message_size_bytes: default_max_message_size(),
            default_termination_reason: default_termination_reason(),
            stamp_missing_timestamps: true,
            admin_key: None,
        }
    }
}

fn default_outbound_buffer() -> usize {
    64
}

fn default_max_message_size() -> usize {
    8 * 1024 * 1024
}

fn default_termination_reason() -> String {
    "Exam terminated by proctor".to_string()
}

fn default_true() -> bool {
    true
}
