//! Individual WebSocket connection handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::mpsc;

use proctor_core::types::id::ConnectionId;

use crate::message::serializer;
use crate::message::types::OutboundMessage;

/// Role a connection takes after its first registration message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientRole {
    /// A proctor watching students.
    Admin,
    /// A student taking the exam.
    Student {
        /// Client-asserted identity.
        id: String,
        /// Display name.
        name: String,
    },
}

/// Why an outbound message did not reach a recipient.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// No live registration for the targeted student.
    #[error("recipient is not registered")]
    NotRegistered,
    /// The connection is closing or closed.
    #[error("connection closed")]
    Closed,
    /// The recipient's outbound queue is full; the message was dropped.
    #[error("recipient lagging, message dropped")]
    Lagging,
    /// The message could not be encoded.
    #[error("failed to encode message: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A handle to a single WebSocket connection.
///
/// Holds the sender side of the connection's outbound queue plus the
/// connection's classification. The transport task owns the receiving side
/// and writes queued text to the socket.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Credentials presented on upgrade, handed to the identity verifier
    pub credentials: Option<String>,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    /// Role, set at most once
    role: OnceLock<ClientRole>,
    /// Sender for outbound message text
    sender: mpsc::Sender<String>,
    /// Whether the connection is still open
    alive: AtomicBool,
}

impl ConnectionHandle {
    /// Create a new connection handle around an outbound sender
    pub fn new(sender: mpsc::Sender<String>, credentials: Option<String>) -> Self {
        Self {
            id: ConnectionId::new(),
            credentials,
            connected_at: Utc::now(),
            role: OnceLock::new(),
            sender,
            alive: AtomicBool::new(true),
        }
    }

    /// Create a handle together with its bounded outbound queue.
    pub fn channel(
        buffer: usize,
        credentials: Option<String>,
    ) -> (Arc<Self>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Arc::new(Self::new(tx, credentials)), rx)
    }

    /// Classify the connection. Only the first call has any effect.
    ///
    /// Returns `true` if this call set the role.
    pub fn classify(&self, role: ClientRole) -> bool {
        self.role.set(role).is_ok()
    }

    /// Current role, `None` while unclassified
    pub fn role(&self) -> Option<&ClientRole> {
        self.role.get()
    }

    /// Whether this connection registered as an admin
    pub fn is_admin(&self) -> bool {
        matches!(self.role(), Some(ClientRole::Admin))
    }

    /// Student identity, if this connection registered as a student
    pub fn student_id(&self) -> Option<&str> {
        match self.role() {
            Some(ClientRole::Student { id, .. }) => Some(id),
            _ => None,
        }
    }

    /// Enqueue already-serialized text for this connection.
    ///
    /// Never waits: a full queue drops the message and a closed queue marks
    /// the connection dead.
    pub fn send_text(&self, text: String) -> Result<(), DeliveryError> {
        if !self.is_alive() {
            return Err(DeliveryError::Closed);
        }
        match self.sender.try_send(text) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, "Send buffer full, dropping message");
                Err(DeliveryError::Lagging)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_closed();
                Err(DeliveryError::Closed)
            }
        }
    }

    /// Serialize and enqueue a message for this connection.
    pub fn send(&self, msg: &OutboundMessage) -> Result<(), DeliveryError> {
        let text = serializer::serialize_outbound(msg)?;
        self.send_text(text)
    }

    /// Check if connection is alive
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst) && !self.sender.is_closed()
    }

    /// Mark connection as closed
    pub fn mark_closed(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}
