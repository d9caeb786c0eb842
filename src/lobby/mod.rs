//! Lobby and matchmaking for the game server
//!
//! This module groups clients into game sessions. Public joins are matched
//! through a LIFO queue of sessions with open seats, private joins go through
//! a registry of named games, and finished private games are reaped.

pub mod controller;
pub mod queue;
pub mod registry;
pub mod validation;

// Re-export commonly used types
pub use controller::{JoinOutcome, LobbyController, LobbyStats};
pub use queue::PublicQueue;
pub use registry::{PrivateRegistry, COLLISION_SUFFIX};
pub use validation::{
    truncate_game_name, validate_player_name, NameRejection, MAX_GAME_NAME_LENGTH,
    MAX_PLAYER_NAME_LENGTH,
};
