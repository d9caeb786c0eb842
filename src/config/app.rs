//! Main application configuration
//!
//! This module defines the primary configuration structures for the lobby
//! service, including environment variable and file loading and validation.

use crate::config::game::GameSettings;
use crate::config::lobby::LobbySettings;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub game: GameSettings,
    pub lobby: LobbySettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log file; logs go to stdout when unset
    pub log_file: Option<PathBuf>,
    /// Address to bind the HTTP server to
    pub host: String,
    /// Port serving the lobby socket, health and metrics endpoints
    pub port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "treason-lobby".to_string(),
            log_level: "info".to_string(),
            log_file: None,
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    ///
    /// The result is not validated; callers validate once all overrides
    /// are applied.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    ///
    /// Like `from_env`, this leaves validation to the caller.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(log_file) = env::var("LOG_FILE") {
            self.service.log_file = Some(PathBuf::from(log_file));
        }
        if let Ok(host) = env::var("HOST") {
            self.service.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            self.service.port = port
                .parse()
                .map_err(|_| anyhow!("Invalid PORT value: {}", port))?;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            self.service.shutdown_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SHUTDOWN_TIMEOUT_SECONDS value: {}", timeout))?;
        }

        // Game settings
        if let Ok(debug) = env::var("GAME_DEBUG") {
            self.game.debug = debug
                .parse()
                .map_err(|_| anyhow!("Invalid GAME_DEBUG value: {}", debug))?;
        }
        if let Ok(delay) = env::var("MOVE_DELAY_MS") {
            self.game.move_delay_ms = delay
                .parse()
                .map_err(|_| anyhow!("Invalid MOVE_DELAY_MS value: {}", delay))?;
        }
        if let Ok(players) = env::var("MAX_PLAYERS") {
            self.game.max_players = players
                .parse()
                .map_err(|_| anyhow!("Invalid MAX_PLAYERS value: {}", players))?;
        }

        if let Ok(timeout) = env::var("IDLE_TIMEOUT_SECONDS") {
            self.game.idle_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid IDLE_TIMEOUT_SECONDS value: {}", timeout))?;
        }

        // Lobby settings
        if let Ok(interval) = env::var("REAP_INTERVAL_SECONDS") {
            self.lobby.reap_interval_seconds = interval
                .parse()
                .map_err(|_| anyhow!("Invalid REAP_INTERVAL_SECONDS value: {}", interval))?;
        }
        if let Ok(interval) = env::var("METRICS_INTERVAL_SECONDS") {
            self.lobby.metrics_interval_seconds = interval
                .parse()
                .map_err(|_| anyhow!("Invalid METRICS_INTERVAL_SECONDS value: {}", interval))?;
        }

        Ok(())
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.service.host, self.service.port)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.port == 0 {
        return Err(anyhow!("Port cannot be 0"));
    }
    if config.service.host.is_empty() {
        return Err(anyhow!("Host cannot be empty"));
    }
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    if config.game.move_delay_ms == 0 {
        return Err(anyhow!("Move delay must be greater than 0"));
    }
    if config.game.max_players < 2 {
        return Err(anyhow!("A game needs at least 2 seats"));
    }
    if config.game.idle_timeout_seconds == 0 {
        return Err(anyhow!("Idle timeout must be greater than 0"));
    }

    if config.lobby.metrics_interval_seconds == 0 {
        return Err(anyhow!("Metrics interval must be greater than 0"));
    }

    Ok(())
}
