//! Configuration management for the treason-lobby service
//!
//! This module handles configuration loading from defaults, a TOML file and
//! environment variables, plus validation of the result.

pub mod app;
pub mod game;
pub mod lobby;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, ServiceSettings};
pub use game::GameSettings;
pub use lobby::LobbySettings;
