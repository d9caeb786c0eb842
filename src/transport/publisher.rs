//! Outbound event delivery to a single client connection

use crate::error::{LobbyError, Result};
use crate::types::{ConnectionId, ServerEvent};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::debug;

/// Trait for delivering events to one connected client
pub trait EventSink: Send + Sync {
    /// Queue an event for delivery to the client
    fn send(&self, event: ServerEvent) -> Result<()>;
}

/// Sink backed by the channel drained by the connection's socket writer
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    sender: mpsc::UnboundedSender<ServerEvent>,
}

impl ChannelEventSink {
    /// Create a sink and the receiver the socket writer reads from
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ServerEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelEventSink {
    fn send(&self, event: ServerEvent) -> Result<()> {
        let name = event.name().to_string();
        self.sender.send(event).map_err(|_| {
            LobbyError::EventDeliveryFailed {
                event: name,
                reason: "connection writer has shut down".to_string(),
            }
            .into()
        })
    }
}

/// Handle to a connected client, shared with the lobby and the player adapters
#[derive(Clone)]
pub struct ClientHandle {
    id: ConnectionId,
    sink: Arc<dyn EventSink>,
}

impl ClientHandle {
    pub fn new(id: ConnectionId, sink: Arc<dyn EventSink>) -> Self {
        Self { id, sink }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Send an event to this client
    pub fn emit(&self, event: ServerEvent) -> Result<()> {
        debug!("Emitting '{}' to connection {}", event.name(), self.id);
        self.sink.send(event)
    }
}

impl std::fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientHandle").field("id", &self.id).finish()
    }
}

/// Mock event sink for testing
#[derive(Debug, Default)]
pub struct MockEventSink {
    sent_events: Mutex<Vec<ServerEvent>>,
}

impl MockEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all sent events (for testing)
    pub fn get_sent_events(&self) -> Vec<ServerEvent> {
        self.sent_events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Clear sent events (for testing)
    pub fn clear_events(&self) {
        if let Ok(mut events) = self.sent_events.lock() {
            events.clear();
        }
    }
}

impl EventSink for MockEventSink {
    fn send(&self, event: ServerEvent) -> Result<()> {
        if let Ok(mut events) = self.sent_events.lock() {
            events.push(event);
        }
        Ok(())
    }
}
