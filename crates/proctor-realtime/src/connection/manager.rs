//! Connection manager: connection lifecycle and inbound message routing.
//!
//! Each connection moves `Unclassified -> Admin` or `Unclassified -> Student`
//! exactly once. Every other message is handled independently, so a bad
//! message can never corrupt the registry.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use proctor_core::config::RelayConfig;
use proctor_core::error::AppError;
use proctor_core::types::id::ConnectionId;

use crate::message::types::InboundMessage;
use crate::message::{builder, serializer, validator};
use crate::metrics::RelayMetrics;
use crate::registry::Registry;
use crate::session_control::broadcast::Broadcaster;
use crate::session_control::terminator;

use super::authenticator::{IdentityClaim, IdentityVerifier};
use super::handle::{ClientRole, ConnectionHandle};
use super::pool::ConnectionPool;

/// Manages all open WebSocket connections and routes their messages.
#[derive(Debug)]
pub struct ConnectionManager {
    /// Connection pool.
    pool: ConnectionPool,
    /// Student/admin registry.
    registry: Arc<Registry>,
    /// Fan-out.
    broadcaster: Broadcaster,
    /// Identity hook.
    verifier: Arc<dyn IdentityVerifier>,
    /// Metrics.
    metrics: Arc<RelayMetrics>,
    /// Configuration.
    config: RelayConfig,
}

impl ConnectionManager {
    /// Creates a new connection manager.
    pub fn new(
        config: RelayConfig,
        registry: Arc<Registry>,
        verifier: Arc<dyn IdentityVerifier>,
        metrics: Arc<RelayMetrics>,
    ) -> Self {
        Self {
            pool: ConnectionPool::new(),
            broadcaster: Broadcaster::new(registry.clone(), metrics.clone()),
            registry,
            verifier,
            metrics,
            config,
        }
    }

    /// Accepts a new, unclassified connection.
    ///
    /// Returns the connection handle and a receiver for its outbound text.
    pub fn connect(
        &self,
        credentials: Option<String>,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<String>) {
        let (handle, rx) = ConnectionHandle::channel(self.config.outbound_buffer_size, credentials);

        self.pool.add(handle.clone());
        self.metrics.connection_opened();

        info!(
            conn_id = %handle.id,
            total = self.pool.connection_count(),
            "New connection established"
        );

        (handle, rx)
    }

    /// Tears a connection down: marks it closed, drops its registration and,
    /// for a student still owning its id, tells every admin it left.
    pub async fn disconnect(&self, conn_id: &ConnectionId) {
        let Some(handle) = self.pool.remove(conn_id) else {
            return;
        };
        handle.mark_closed();
        self.metrics.connection_closed();

        match handle.role() {
            Some(ClientRole::Admin) => {
                self.registry.remove_admin(handle.id).await;
                let admins = self.registry.admin_count().await;
                info!(
                    conn_id = %conn_id,
                    admins,
                    "Admin disconnected"
                );
            }
            Some(ClientRole::Student { id, name }) => {
                if self.registry.remove_student_if_owner(id, handle.id).await {
                    let remaining = self.registry.student_count().await;
                    info!(
                        conn_id = %conn_id,
                        student_id = %id,
                        student_name = %name,
                        remaining,
                        "Student disconnected"
                    );
                    self.broadcaster
                        .to_all_admins(&builder::build_student_left(id))
                        .await;
                } else {
                    debug!(
                        conn_id = %conn_id,
                        student_id = %id,
                        "Superseded or departed student connection closed"
                    );
                }
            }
            None => debug!(conn_id = %conn_id, "Unclassified connection closed"),
        }
    }

    /// Processes one inbound text message from a client.
    ///
    /// Malformed messages are logged and discarded; the connection stays open.
    pub async fn handle_inbound(&self, conn_id: &ConnectionId, raw_message: &str) {
        let Some(handle) = self.pool.get(conn_id) else {
            warn!(conn_id = %conn_id, "Message from unknown connection");
            return;
        };

        self.metrics.message_received();

        let msg = match self.decode(raw_message) {
            Ok(msg) => msg,
            Err(e) => {
                self.metrics.message_malformed();
                warn!(conn_id = %conn_id, error = %e, "Discarding malformed message");
                return;
            }
        };
        debug!(conn_id = %conn_id, kind = msg.kind(), "Dispatching inbound message");

        match msg {
            InboundMessage::RegisterAdmin => self.register_admin(&handle).await,
            InboundMessage::RegisterStudent {
                student_id,
                student_name,
            } => {
                self.register_student(&handle, student_id, student_name)
                    .await
            }
            InboundMessage::ScreenFrame {
                student_id,
                frame,
                timestamp,
            } => {
                if timestamp.is_none() && !self.config.stamp_missing_timestamps {
                    self.metrics.message_malformed();
                    warn!(conn_id = %conn_id, "Discarding screen frame without timestamp");
                    return;
                }
                let message = builder::build_screen_frame(student_id, frame, timestamp);
                self.broadcaster.to_all_admins(&message).await;
                self.metrics.frame_relayed();
            }
            InboundMessage::StudentLeft { student_id } => {
                let removed = self.registry.remove_student(&student_id).await;
                let remaining = self.registry.student_count().await;
                info!(
                    conn_id = %conn_id,
                    student_id = %student_id,
                    removed,
                    remaining,
                    "Student left"
                );
                self.broadcaster
                    .to_all_admins(&builder::build_student_left(&student_id))
                    .await;
            }
            InboundMessage::TerminateExam { student_id, reason } => {
                if !handle.is_admin() {
                    debug!(conn_id = %conn_id, "Termination requested by non-admin connection");
                }
                terminator::terminate_exam(
                    &self.broadcaster,
                    &self.metrics,
                    &student_id,
                    reason,
                    &self.config.default_termination_reason,
                )
                .await;
            }
            InboundMessage::Unknown => {
                debug!(conn_id = %conn_id, "Ignoring message with unrecognized type");
            }
        }
    }

    fn decode(&self, raw_message: &str) -> Result<InboundMessage, AppError> {
        validator::validate_inbound(raw_message, self.config.max_message_size_bytes)?;
        let msg = serializer::deserialize_inbound(raw_message)?;
        if let InboundMessage::RegisterStudent { student_id, .. } = &msg {
            validator::validate_student_id(student_id)?;
        }
        Ok(msg)
    }

    /// `register-admin`: classify, register, seed with the student list.
    async fn register_admin(&self, handle: &Arc<ConnectionHandle>) {
        if handle.role().is_some() {
            warn!(conn_id = %handle.id, "Ignoring register-admin on classified connection");
            return;
        }
        if let Err(e) = self.verifier.verify(handle, IdentityClaim::Admin).await {
            warn!(conn_id = %handle.id, error = %e, "Admin registration rejected");
            return;
        }
        if !handle.classify(ClientRole::Admin) {
            return;
        }

        self.registry
            .register_admin(handle, |students| {
                let list = builder::build_student_list(students);
                match handle.send(&list) {
                    Ok(()) => self.metrics.message_sent_count(1),
                    Err(e) => warn!(conn_id = %handle.id, error = %e, "Failed to send student list"),
                }
            })
            .await;

        let admins = self.registry.admin_count().await;
        info!(
            conn_id = %handle.id,
            admins,
            "Admin connected"
        );
    }

    /// `register-student`: classify, register (last writer wins), announce.
    async fn register_student(
        &self,
        handle: &Arc<ConnectionHandle>,
        student_id: String,
        student_name: String,
    ) {
        if handle.role().is_some() {
            warn!(conn_id = %handle.id, "Ignoring register-student on classified connection");
            return;
        }
        let claim = IdentityClaim::Student {
            id: &student_id,
            name: &student_name,
        };
        if let Err(e) = self.verifier.verify(handle, claim).await {
            warn!(conn_id = %handle.id, student_id = %student_id, error = %e, "Student registration rejected");
            return;
        }
        if !handle.classify(ClientRole::Student {
            id: student_id.clone(),
            name: student_name.clone(),
        }) {
            return;
        }

        let registration = self
            .registry
            .register_student(&student_id, &student_name, handle)
            .await;

        if let Some(previous) = registration.replaced {
            info!(
                conn_id = %handle.id,
                previous_conn_id = %previous,
                student_id = %student_id,
                "Student re-registered; previous connection orphaned"
            );
        }
        let students = self.registry.student_count().await;
        info!(
            conn_id = %handle.id,
            student_id = %student_id,
            student_name = %student_name,
            students,
            "Student connected"
        );

        self.broadcaster
            .to_admins(
                &registration.admins,
                &builder::build_student_joined(&student_id, &student_name),
            )
            .await;
    }

    /// Marks every connection closed and clears the registry.
    pub async fn close_all(&self) {
        let all = self.pool.all_connections();
        for conn in &all {
            conn.mark_closed();
            self.pool.remove(&conn.id);
        }
        self.registry.clear().await;
        info!(count = all.len(), "All connections closed");
    }

    /// Returns the open connection count.
    pub fn connection_count(&self) -> usize {
        self.pool.connection_count()
    }

    /// Returns the registry.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}
