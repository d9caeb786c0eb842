//! Treason Lobby - connection and matchmaking layer for session-based games
//!
//! This crate accepts client connections, groups players into game sessions
//! through a public matchmaking queue or named private games, and routes each
//! connection's gameplay events to the session it joined.

pub mod config;
pub mod error;
pub mod game;
pub mod lobby;
pub mod metrics;
pub mod service;
pub mod transport;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{LobbyError, Result};
pub use types::*;

// Re-export key components
pub use game::{GameConfig, GameFactory, GameSession, PlayerAdapter, PlayerAdapterFactory};
pub use lobby::{JoinOutcome, LobbyController, LobbyStats};
pub use transport::{ClientHandle, ConnectionHandler, EventSink};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
