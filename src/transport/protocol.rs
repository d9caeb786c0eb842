//! JSON wire format for lobby connections
//!
//! Every frame is an envelope `{"event": <name>, "data": <payload>}`. The
//! lobby understands `join`, `create` and `disconnect`; every other event
//! name is passed through to the connection's game bindings untouched.

use crate::error::{LobbyError, Result};
use crate::types::{ClientEvent, ServerEvent, CREATE_EVENT, JOIN_EVENT};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event name a client may send to end its session explicitly
pub const DISCONNECT_EVENT: &str = "disconnect";

/// A single framed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

fn invalid(reason: impl Into<String>) -> anyhow::Error {
    LobbyError::InvalidEvent {
        reason: reason.into(),
    }
    .into()
}

/// Parse a text frame into a client event
pub fn decode_client_event(text: &str) -> Result<ClientEvent> {
    let envelope: Envelope = serde_json::from_str(text)
        .map_err(|e| invalid(format!("malformed envelope: {}", e)))?;

    match envelope.event.as_str() {
        JOIN_EVENT => serde_json::from_value(envelope.data)
            .map(ClientEvent::Join)
            .map_err(|e| invalid(format!("bad join payload: {}", e))),
        CREATE_EVENT => serde_json::from_value(envelope.data)
            .map(ClientEvent::Create)
            .map_err(|e| invalid(format!("bad create payload: {}", e))),
        DISCONNECT_EVENT => Ok(ClientEvent::Disconnect),
        "" => Err(invalid("empty event name")),
        _ => Ok(ClientEvent::Gameplay {
            event: envelope.event,
            data: envelope.data,
        }),
    }
}

/// Serialize a server event into a text frame
pub fn encode_server_event(event: &ServerEvent) -> Result<String> {
    let data = match event {
        ServerEvent::GameNotFound(payload) => serde_json::to_value(payload)?,
        ServerEvent::Created(payload) => serde_json::to_value(payload)?,
        ServerEvent::Gameplay { data, .. } => data.clone(),
    };

    let envelope = Envelope {
        event: event.name().to_string(),
        data,
    };
    Ok(serde_json::to_string(&envelope)?)
}
