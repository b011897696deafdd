//! JSON serialization for WebSocket messages.

use proctor_core::error::AppError;

use super::types::{InboundMessage, OutboundMessage};

/// Serialize an outbound message to its wire text.
pub fn serialize_outbound(msg: &OutboundMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(msg)
}

/// Deserialize an inbound message from wire text.
pub fn deserialize_inbound(text: &str) -> Result<InboundMessage, AppError> {
    Ok(serde_json::from_str(text)?)
}

/// Serialize an inbound message (used by the relay client).
pub fn serialize_inbound(msg: &InboundMessage) -> Result<String, AppError> {
    Ok(serde_json::to_string(msg)?)
}

/// Deserialize an outbound message (used by the relay client).
pub fn deserialize_outbound(text: &str) -> Result<OutboundMessage, AppError> {
    Ok(serde_json::from_str(text)?)
}
