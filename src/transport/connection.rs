//! Per-connection event routing
//!
//! A `ConnectionHandler` owns the player bindings created for one client.
//! Lobby events go to the controller, gameplay events go to every binding,
//! and once the connection is closed nothing is routed through it again.

use crate::error::Result;
use crate::game::session::{GameSession, PlayerAdapter};
use crate::lobby::controller::{JoinOutcome, LobbyController};
use crate::transport::protocol::decode_client_event;
use crate::transport::publisher::ClientHandle;
use crate::types::{ClientEvent, ConnectionId};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Routes the events of a single client connection
pub struct ConnectionHandler<S: GameSession + 'static> {
    client: ClientHandle,
    lobby: Arc<LobbyController<S>>,
    adapters: Vec<Box<dyn PlayerAdapter>>,
    opened_at: Instant,
    closed: bool,
}

impl<S: GameSession + 'static> ConnectionHandler<S> {
    /// Register a new connection with the lobby
    pub fn open(lobby: Arc<LobbyController<S>>, client: ClientHandle) -> Result<Self> {
        lobby.connection_opened(client.id())?;

        Ok(Self {
            client,
            lobby,
            adapters: Vec::new(),
            opened_at: Instant::now(),
            closed: false,
        })
    }

    pub fn id(&self) -> ConnectionId {
        self.client.id()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of player bindings held by this connection
    pub fn adapter_count(&self) -> usize {
        self.adapters.len()
    }

    /// Decode and handle one inbound text frame
    ///
    /// Malformed frames are logged and dropped; they never close the
    /// connection.
    pub fn handle_text(&mut self, text: &str) -> Result<()> {
        match decode_client_event(text) {
            Ok(event) => self.handle_event(event),
            Err(e) => {
                warn!("Dropping frame from connection {}: {}", self.id(), e);
                self.lobby.metrics().record_malformed_event();
                Ok(())
            }
        }
    }

    /// Handle one decoded client event
    pub fn handle_event(&mut self, event: ClientEvent) -> Result<()> {
        if self.closed {
            debug!("Ignoring event on closed connection {}", self.id());
            return Ok(());
        }

        match event {
            ClientEvent::Join(request) => {
                self.lobby.metrics().record_event("join");
                if let JoinOutcome::Attached { adapter, .. } =
                    self.lobby.handle_join(&self.client, request)?
                {
                    self.adapters.push(adapter);
                }
            }
            ClientEvent::Create(request) => {
                self.lobby.metrics().record_event("create");
                self.lobby.handle_create(&self.client, request)?;
            }
            ClientEvent::Gameplay { event, data } => {
                self.lobby.metrics().record_event("gameplay");
                if self.adapters.is_empty() {
                    debug!(
                        "Connection {} sent '{}' before joining a game",
                        self.id(),
                        event
                    );
                }
                for adapter in self.adapters.iter_mut() {
                    adapter.handle_event(&event, &data);
                }
            }
            ClientEvent::Disconnect => {
                self.lobby.metrics().record_event("disconnect");
                self.close()?;
            }
        }

        Ok(())
    }

    /// Detach every binding and stop routing events; returns how many were detached
    pub fn close(&mut self) -> Result<usize> {
        if self.closed {
            return Ok(0);
        }
        self.closed = true;

        let detached = self.adapters.len();
        for mut adapter in self.adapters.drain(..) {
            adapter.detach();
        }

        self.lobby
            .connection_closed(self.client.id(), detached, self.opened_at.elapsed())?;
        Ok(detached)
    }
}

impl<S: GameSession + 'static> Drop for ConnectionHandler<S> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close connection {}: {}", self.client.id(), e);
        }
    }
}
