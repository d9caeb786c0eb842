//! Capability contract between the lobby and the game engine
//!
//! The lobby only needs to know whether a session has an open seat and whether
//! it has finished. Everything else about a game lives behind these traits.

use crate::config::GameSettings;
use crate::transport::publisher::ClientHandle;
use crate::types::GameName;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info_span, Span};

/// A running match as seen by the lobby
pub trait GameSession: Send + Sync {
    /// True while the session has an open seat
    fn can_join(&self) -> bool;

    /// True once the session has concluded and can be discarded
    fn game_over(&self) -> bool;
}

/// Configuration handed to the game engine when a session is created
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub debug: bool,
    /// Span the session logs under
    pub logger: Span,
    /// Delay between AI moves
    pub move_delay: Duration,
    /// Set for private games only
    pub game_name: Option<GameName>,
    /// Set for private games only
    pub created: Option<DateTime<Utc>>,
}

impl GameConfig {
    /// Configuration for a publicly matched session
    pub fn public(settings: &GameSettings) -> Self {
        Self {
            debug: settings.debug,
            logger: info_span!("game", kind = "public"),
            move_delay: settings.move_delay(),
            game_name: None,
            created: None,
        }
    }

    /// Configuration for a named private session
    pub fn private(settings: &GameSettings, game_name: &str, created: DateTime<Utc>) -> Self {
        Self {
            debug: settings.debug,
            logger: info_span!("game", kind = "private", name = %game_name),
            move_delay: settings.move_delay(),
            game_name: Some(game_name.to_string()),
            created: Some(created),
        }
    }
}

/// Creates game sessions on demand
pub trait GameFactory: Send + Sync {
    type Session: GameSession + 'static;

    fn create_game(&self, config: GameConfig) -> Arc<Self::Session>;
}

/// A player's binding between one connection and one session
pub trait PlayerAdapter: Send {
    fn player_name(&self) -> &str;

    /// False when the session had no room for the player at attach time
    fn has_seat(&self) -> bool {
        true
    }

    /// Route a gameplay event received on the connection
    fn handle_event(&mut self, event: &str, data: &serde_json::Value);

    /// Tear down the binding; called once when the connection goes away
    fn detach(&mut self);
}

/// Attaches players to sessions; the sole way a client enters gameplay
///
/// The engine decides whether a seat is actually taken. A binding that
/// reports no seat lets the lobby try another public game.
pub trait PlayerAdapterFactory<S: GameSession>: Send + Sync {
    fn attach(
        &self,
        session: Arc<S>,
        client: &ClientHandle,
        player_name: &str,
    ) -> Box<dyn PlayerAdapter>;
}
