//! Lobby configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the lobby's background maintenance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LobbySettings {
    /// Interval of the background private-game reaper; 0 disables it
    pub reap_interval_seconds: u64,
    /// Interval for refreshing lobby gauges
    pub metrics_interval_seconds: u64,
}

impl Default for LobbySettings {
    fn default() -> Self {
        Self {
            reap_interval_seconds: 0,
            metrics_interval_seconds: 30,
        }
    }
}

impl LobbySettings {
    /// Background reap interval, if the reaper is enabled
    pub fn reap_interval(&self) -> Option<Duration> {
        (self.reap_interval_seconds > 0).then(|| Duration::from_secs(self.reap_interval_seconds))
    }

    pub fn metrics_interval(&self) -> Duration {
        Duration::from_secs(self.metrics_interval_seconds)
    }
}
