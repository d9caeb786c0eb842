//! Main application state and service coordination
//!
//! This module contains the AppState that owns the lobby, the metrics
//! collector, the HTTP server task and the background maintenance tasks.

use crate::config::AppConfig;
use crate::game::seats::{SeatAdapterFactory, SeatedGame, SeatedGameFactory};
use crate::lobby::controller::LobbyController;
use crate::metrics::MetricsCollector;
use crate::service::health::{HealthCheck, HealthStatus};
use crate::service::server;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

/// Interval of the service health metrics task
const HEALTH_METRICS_INTERVAL: Duration = Duration::from_secs(60);

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Failed to bind {address}: {message}")]
    Bind { address: String, message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("Background task error: {message}")]
    BackgroundTask { message: String },
}

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// The lobby all connections share
    lobby: Arc<LobbyController<SeatedGame>>,

    /// Metrics collector shared with the lobby
    metrics_collector: Arc<MetricsCollector>,

    /// HTTP server task handle
    server_task: Mutex<Option<JoinHandle<()>>>,

    /// Background task handles
    background_tasks: Mutex<Vec<JoinHandle<()>>>,

    /// Tells the HTTP server to stop accepting connections
    shutdown_tx: broadcast::Sender<()>,

    /// Service status
    is_running: Arc<RwLock<bool>>,

    /// When the state was created
    started_at: Instant,
}

impl AppState {
    /// Initialize the application with all dependencies
    pub async fn new(config: AppConfig) -> Result<Self, ServiceError> {
        info!("Initializing {} lobby service", config.service.name);
        info!(
            "Configuration: bind={}, seats={}, move_delay={}ms, debug={}",
            config.bind_address(),
            config.game.max_players,
            config.game.move_delay_ms,
            config.game.debug
        );

        let metrics_collector =
            Arc::new(
                MetricsCollector::new().map_err(|e| ServiceError::Initialization {
                    message: format!("Failed to create metrics collector: {}", e),
                })?,
            );

        let lobby = Arc::new(LobbyController::with_metrics(
            Arc::new(
                SeatedGameFactory::new(config.game.max_players)
                    .with_idle_timeout(config.game.idle_timeout()),
            ),
            Arc::new(SeatAdapterFactory::new()),
            config.game.clone(),
            metrics_collector.clone(),
        ));

        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Self {
            config,
            lobby,
            metrics_collector,
            server_task: Mutex::new(None),
            background_tasks: Mutex::new(Vec::new()),
            shutdown_tx,
            is_running: Arc::new(RwLock::new(false)),
            started_at: Instant::now(),
        })
    }

    /// Bind the listener, start serving and start background tasks
    pub async fn start(self: &Arc<Self>) -> Result<(), ServiceError> {
        let address = self.config.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| ServiceError::Bind {
                address: address.clone(),
                message: e.to_string(),
            })?;

        self.start_with_listener(listener).await
    }

    /// Start serving on an already bound listener
    pub async fn start_with_listener(
        self: &Arc<Self>,
        listener: TcpListener,
    ) -> Result<(), ServiceError> {
        info!("Starting {} lobby service", self.config.service.name);

        *self.is_running.write().await = true;

        let server_task = {
            let app_state = Arc::clone(self);
            let mut shutdown_rx = self.shutdown_tx.subscribe();

            tokio::spawn(async move {
                let shutdown = async move {
                    let _ = shutdown_rx.recv().await;
                    info!("Lobby server shutdown signal received");
                };
                if let Err(e) = server::serve(listener, app_state, shutdown).await {
                    error!("Lobby server failed: {}", e);
                }
            })
        };
        *self
            .server_task
            .lock()
            .map_err(|_| ServiceError::BackgroundTask {
                message: "Failed to acquire server task lock".to_string(),
            })? = Some(server_task);

        self.start_background_tasks()?;

        info!("Lobby service started successfully");
        Ok(())
    }

    /// Perform graceful shutdown
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        info!("Starting graceful shutdown of the lobby service");

        *self.is_running.write().await = false;

        if self.shutdown_tx.send(()).is_err() {
            debug!("Lobby server was not running");
        }

        self.stop_server().await?;
        self.stop_background_tasks()?;

        let final_stats = self
            .lobby
            .stats()
            .map_err(|e| ServiceError::BackgroundTask {
                message: format!("Failed to get final stats: {}", e),
            })?;

        info!("Final lobby statistics: {:?}", final_stats);
        info!("Lobby service shutdown completed");

        Ok(())
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Get the lobby controller
    pub fn lobby(&self) -> Arc<LobbyController<SeatedGame>> {
        self.lobby.clone()
    }

    /// Get the metrics collector
    pub fn metrics_collector(&self) -> Arc<MetricsCollector> {
        self.metrics_collector.clone()
    }

    /// Time since the state was created
    pub fn uptime(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Export uptime and the current health check through the metrics collector
    pub async fn record_health_metrics(self: &Arc<Self>) {
        let uptime_seconds = self.uptime().as_secs() as i64;
        self.metrics_collector
            .service()
            .uptime_seconds
            .set(uptime_seconds);

        match HealthCheck::check(Arc::clone(self)).await {
            Ok(health) => {
                self.metrics_collector
                    .update_health_status(health.status.as_gauge());
                for check in &health.checks {
                    let healthy = check.status == HealthStatus::Healthy;
                    self.metrics_collector
                        .update_component_health(&check.name, healthy);
                }
                debug!(
                    "Updated service health metrics - status: {}, uptime: {}s",
                    health.status, uptime_seconds
                );
            }
            Err(e) => {
                warn!("Health check for metrics failed: {}", e);
                self.metrics_collector
                    .update_health_status(HealthStatus::Unhealthy.as_gauge());
            }
        }
    }

    fn push_task(&self, task: JoinHandle<()>) -> Result<(), ServiceError> {
        self.background_tasks
            .lock()
            .map_err(|_| ServiceError::BackgroundTask {
                message: "Failed to acquire task list lock".to_string(),
            })?
            .push(task);
        Ok(())
    }

    /// Start background maintenance tasks
    fn start_background_tasks(self: &Arc<Self>) -> Result<(), ServiceError> {
        info!("Starting background maintenance tasks...");

        // Lobby metrics update task
        let metrics_interval = self.config.lobby.metrics_interval();
        info!(
            "Starting lobby metrics update task ({}s interval)...",
            metrics_interval.as_secs()
        );
        let metrics_task = {
            let lobby = self.lobby.clone();
            let metrics_collector = self.metrics_collector.clone();
            let is_running = self.is_running.clone();

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(metrics_interval);
                info!("Metrics update task started");

                while *is_running.read().await {
                    interval.tick().await;

                    match lobby.stats() {
                        Ok(stats) => {
                            debug!(
                                "Updating metrics - connections: {}, queued: {}, private: {}",
                                stats.active_connections,
                                stats.public_queue_depth,
                                stats.private_games
                            );
                            metrics_collector.update_from_lobby_stats(&stats);
                        }
                        Err(e) => {
                            warn!("Failed to get lobby stats for metrics update: {}", e);
                        }
                    }
                }

                info!("Metrics update task stopped");
            })
        };
        self.push_task(metrics_task)?;

        // Private game reaper task (if enabled)
        match self.config.lobby.reap_interval() {
            Some(reap_interval) => {
                info!(
                    "Starting private game reaper task ({}s interval)...",
                    reap_interval.as_secs()
                );
                let lobby = self.lobby.clone();
                let is_running = self.is_running.clone();

                let reaper_task = tokio::spawn(async move {
                    let mut interval = tokio::time::interval(reap_interval);
                    info!("Private game reaper task started");

                    while *is_running.read().await {
                        interval.tick().await;

                        match lobby.reap_finished() {
                            Ok(reaped) if !reaped.is_empty() => {
                                info!("Reaped {} finished private games", reaped.len());
                            }
                            Ok(_) => {
                                debug!("Reap check completed - no finished private games");
                            }
                            Err(e) => {
                                warn!("Private game reap failed: {}", e);
                            }
                        }
                    }

                    info!("Private game reaper task stopped");
                });
                self.push_task(reaper_task)?;
            }
            None => {
                info!("Background reaping disabled - private games are reaped on private joins");
            }
        }

        // Service health metrics task
        info!(
            "Starting health metrics task ({}s interval)...",
            HEALTH_METRICS_INTERVAL.as_secs()
        );
        let health_metrics_task = {
            let app_state = Arc::clone(self);

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(HEALTH_METRICS_INTERVAL);
                info!("Health metrics task started");

                while app_state.is_running().await {
                    interval.tick().await;
                    app_state.record_health_metrics().await;
                }

                info!("Health metrics task stopped");
            })
        };
        self.push_task(health_metrics_task)?;

        Ok(())
    }

    /// Wait for the HTTP server to drain, aborting it after the shutdown timeout
    async fn stop_server(&self) -> Result<(), ServiceError> {
        let task = self
            .server_task
            .lock()
            .map_err(|_| ServiceError::BackgroundTask {
                message: "Failed to acquire server task lock".to_string(),
            })?
            .take();

        let Some(task) = task else {
            return Ok(());
        };

        let timeout = self.config.shutdown_timeout();
        let abort = task.abort_handle();
        if tokio::time::timeout(timeout, task).await.is_err() {
            warn!("Lobby server did not stop within {:?}, aborting", timeout);
            abort.abort();
        }
        Ok(())
    }

    /// Stop all background tasks
    fn stop_background_tasks(&self) -> Result<(), ServiceError> {
        let tasks: Vec<JoinHandle<()>> = self
            .background_tasks
            .lock()
            .map_err(|_| ServiceError::BackgroundTask {
                message: "Failed to acquire task list lock".to_string(),
            })?
            .drain(..)
            .collect();

        let task_count = tasks.len();
        if task_count == 0 {
            info!("No background tasks to stop");
            return Ok(());
        }

        info!("Stopping {} background tasks...", task_count);

        for (i, task) in tasks.into_iter().enumerate() {
            debug!("Aborting background task {}/{}", i + 1, task_count);
            task.abort();
        }

        info!("All {} background tasks stopped", task_count);
        Ok(())
    }
}
