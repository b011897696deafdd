//! Relay client used by admin and student front ends (and by tests).
//!
//! Speaks the same JSON envelope as the server over a plain WebSocket.

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;

use proctor_core::error::{AppError, ErrorKind};
use proctor_core::result::AppResult;

use crate::message::serializer;
use crate::message::types::{InboundMessage, OutboundMessage};

type Stream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A WebSocket connection to the relay.
pub struct RelayClient {
    stream: Stream,
}

impl std::fmt::Debug for RelayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayClient").finish_non_exhaustive()
    }
}

impl RelayClient {
    /// Opens a connection to `url` (e.g. `ws://127.0.0.1:3001/ws`).
    pub async fn connect(url: &str) -> AppResult<Self> {
        let (stream, _response) = connect_async(url).await.map_err(|e| {
            AppError::with_source(ErrorKind::Transport, format!("Failed to connect to {url}"), e)
        })?;
        debug!(url, "Relay client connected");
        Ok(Self { stream })
    }

    /// Sends `register-admin`.
    pub async fn register_admin(&mut self) -> AppResult<()> {
        self.send(&InboundMessage::RegisterAdmin).await
    }

    /// Sends `register-student`.
    pub async fn register_student(&mut self, student_id: &str, student_name: &str) -> AppResult<()> {
        self.send(&InboundMessage::RegisterStudent {
            student_id: student_id.to_string(),
            student_name: student_name.to_string(),
        })
        .await
    }

    /// Sends a message to the relay.
    pub async fn send(&mut self, msg: &InboundMessage) -> AppResult<()> {
        let text = serializer::serialize_inbound(msg)?;
        self.send_raw(&text).await
    }

    /// Sends arbitrary text, bypassing the envelope.
    pub async fn send_raw(&mut self, text: &str) -> AppResult<()> {
        self.stream
            .send(Message::text(text.to_string()))
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Transport, "Failed to send", e))
    }

    /// Waits for the next relay event. Returns `None` once the connection
    /// is closed.
    pub async fn next_event(&mut self) -> AppResult<Option<OutboundMessage>> {
        while let Some(frame) = self.stream.next().await {
            let frame = frame
                .map_err(|e| AppError::with_source(ErrorKind::Transport, "Failed to receive", e))?;
            match frame {
                Message::Text(text) => return serializer::deserialize_outbound(text.as_str()).map(Some),
                Message::Close(_) => return Ok(None),
                _ => continue,
            }
        }
        Ok(None)
    }

    /// Closes the connection.
    pub async fn close(mut self) -> AppResult<()> {
        self.stream
            .close(None)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Transport, "Failed to close", e))
    }
}
