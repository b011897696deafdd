//! WebSocket upgrade handler.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use proctor_core::error::AppError;

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters accepted on upgrade.
#[derive(Debug, Default, serde::Deserialize)]
pub struct WsQuery {
    /// Optional credentials handed to the identity verifier.
    pub token: Option<String>,
}

/// GET /ws[?token=...]
pub async fn ws_upgrade(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
) -> Result<Response, ApiError> {
    if state.relay.is_shutting_down() {
        return Err(AppError::service_unavailable("Relay is shutting down").into());
    }

    let max_size = state.config.relay.max_message_size_bytes;

    Ok(ws
        .max_message_size(max_size)
        .on_upgrade(move |socket| handle_ws_connection(state, query.token, socket)))
}

/// Drives one established WebSocket connection until it closes.
async fn handle_ws_connection(state: AppState, credentials: Option<String>, socket: WebSocket) {
    // Shutdown may have started after the upgrade was accepted
    let Some(mut shutdown_rx) = state.relay.subscribe_shutdown() else {
        debug!("Dropping upgraded socket during shutdown");
        return;
    };
    let (mut ws_tx, mut ws_rx) = socket.split();
    let connections = state.relay.connections.clone();

    let (handle, mut outbound_rx) = connections.connect(credentials);
    let conn_id = handle.id;

    // Spawn outbound message forwarder
    let outbound_task = tokio::spawn(async move {
        while let Some(text) = outbound_rx.recv().await {
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    // Process inbound messages
    loop {
        tokio::select! {
            frame = ws_rx.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    connections.handle_inbound(&conn_id, text.as_str()).await;
                }
                Some(Ok(Message::Binary(_))) => {
                    state.relay.metrics.message_malformed();
                    warn!(conn_id = %conn_id, "Discarding binary frame");
                }
                Some(Ok(Message::Close(_))) | None => break,
                // Ping/pong is answered by the transport
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                    break;
                }
            },
            _ = shutdown_rx.recv() => {
                debug!(conn_id = %conn_id, "Closing connection for shutdown");
                break;
            }
        }
    }

    // Cleanup
    connections.disconnect(&conn_id).await;
    outbound_task.abort();

    info!(conn_id = %conn_id, "WebSocket connection closed");
}
