//! Common types used throughout the lobby service

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a client connection
pub type ConnectionId = Uuid;

/// Name a private game is registered under
pub type GameName = String;

/// Event names understood by the lobby
pub const JOIN_EVENT: &str = "join";
pub const CREATE_EVENT: &str = "create";
pub const GAME_NOT_FOUND_EVENT: &str = "gamenotfound";
pub const CREATED_EVENT: &str = "created";

/// How a game session was matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameKind {
    Public,
    Private,
}

impl GameKind {
    pub fn as_label(&self) -> &'static str {
        match self {
            GameKind::Public => "public",
            GameKind::Private => "private",
        }
    }
}

impl std::fmt::Display for GameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameKind::Public => write!(f, "Public"),
            GameKind::Private => write!(f, "Private"),
        }
    }
}

/// Request to join a public game, or a private game by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    /// Display name; missing names are rejected by validation
    #[serde(default)]
    pub player_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_game_name: Option<GameName>,
}

impl JoinRequest {
    pub fn public(player_name: impl Into<String>) -> Self {
        Self {
            player_name: Some(player_name.into()),
            private_game_name: None,
        }
    }

    pub fn private(player_name: impl Into<String>, game_name: impl Into<String>) -> Self {
        Self {
            player_name: Some(player_name.into()),
            private_game_name: Some(game_name.into()),
        }
    }

    /// Target private game; an empty name counts as a public join
    pub fn private_target(&self) -> Option<&str> {
        self.private_game_name
            .as_deref()
            .filter(|name| !name.is_empty())
    }
}

/// Request to create a private game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub game_name: GameName,
}

/// Sent when a private join names a game that is not registered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameNotFound {
    pub private_game_name: GameName,
}

/// Sent to the creator of a private game with the name it was registered under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Created {
    pub game_name: GameName,
}

/// Events received from a client connection
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Join(JoinRequest),
    Create(CreateRequest),
    /// Anything else is routed to the connection's game bindings
    Gameplay {
        event: String,
        data: serde_json::Value,
    },
    Disconnect,
}

/// Events sent to a client connection
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    GameNotFound(GameNotFound),
    Created(Created),
    /// Emitted by game engines through the player's connection
    Gameplay {
        event: String,
        data: serde_json::Value,
    },
}

impl ServerEvent {
    pub fn name(&self) -> &str {
        match self {
            ServerEvent::GameNotFound(_) => GAME_NOT_FOUND_EVENT,
            ServerEvent::Created(_) => CREATED_EVENT,
            ServerEvent::Gameplay { event, .. } => event,
        }
    }
}
