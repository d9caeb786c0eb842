//! Game engine configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings passed to every game session the lobby creates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Run game sessions in debug mode
    pub debug: bool,
    /// Delay between AI moves in milliseconds
    pub move_delay_ms: u64,
    /// Seats per game in the bundled engine
    pub max_players: usize,
    /// Seconds a game nobody has joined stays open in the bundled engine
    pub idle_timeout_seconds: u64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            debug: false,
            move_delay_ms: 1000,
            max_players: 6,
            idle_timeout_seconds: 600,
        }
    }
}

impl GameSettings {
    /// Get the AI move delay as Duration
    pub fn move_delay(&self) -> Duration {
        Duration::from_millis(self.move_delay_ms)
    }

    /// Get the unjoined game timeout as Duration
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_seconds)
    }
}
