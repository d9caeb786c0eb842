//! Main entry point for the Treason lobby server
//!
//! This is the production entry point that loads configuration, sets up
//! logging, serves the lobby and shuts down gracefully on a signal.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal;
use tokio::time::Duration;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use treason_lobby::config::{validate_config, AppConfig};
use treason_lobby::service::{AppState, HealthCheck};

/// Treason Lobby - connection and matchmaking server for multiplayer games
#[derive(Parser)]
#[command(
    name = "treason-lobby",
    version,
    about = "Connection and matchmaking server for session-based multiplayer games",
    long_about = "Treason Lobby accepts WebSocket clients, matches them into public games \
                 through a LIFO queue of open sessions, lets players create and join named \
                 private games, and routes gameplay events to the session each player joined."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Port override
    #[arg(short, long, value_name = "PORT", help = "Override the listening port")]
    port: Option<u16>,

    /// Log file
    #[arg(long, value_name = "FILE", help = "Write logs to this daily rotated file instead of stdout")]
    log: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable game debug mode and verbose logging")]
    debug: bool,

    /// Background reap interval override
    #[arg(
        long,
        value_name = "SECONDS",
        help = "Reap finished private games every N seconds (0 disables)"
    )]
    reap_interval: Option<u64>,

    /// Dry run mode (validate config and exit)
    #[arg(
        long,
        help = "Validate configuration and exit without starting service"
    )]
    dry_run: bool,
}

/// Rotated log files kept next to the active one
const LOG_FILES_KEPT: usize = 7;

/// Initialize structured logging with the configured level
///
/// With a log file, events go through a non-blocking writer to a daily
/// rotated file; the returned guard flushes it when dropped.
fn init_logging(log_level: &str, log_file: Option<&PathBuf>) -> Result<Option<WorkerGuard>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| log_level.into());

    match log_file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| anyhow::anyhow!("Log file {} has no file name", path.display()))?;

            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(file_name)
                .max_log_files(LOG_FILES_KEPT)
                .build(directory)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);

            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_ansi(false)
                .with_writer(writer)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
            Ok(Some(guard))
        }
        None => {
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_thread_ids(true)
                .with_line_number(true)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
            Ok(None)
        }
    }
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

/// Run periodic health checks
async fn health_check_task(app_state: Arc<AppState>) {
    let mut interval = tokio::time::interval(Duration::from_secs(30));

    while app_state.is_running().await {
        interval.tick().await;

        match HealthCheck::check(app_state.clone()).await {
            Ok(health) => {
                info!(
                    "Health check: {} - {} connections, {} queued public games, {} private games",
                    health.status,
                    health.stats.active_connections,
                    health.stats.public_queue_depth,
                    health.stats.private_games
                );
            }
            Err(e) => {
                warn!("Health check failed: {}", e);
            }
        }
    }
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    info!("Treason Lobby Server v{}", treason_lobby::VERSION);
    info!("   Service: {}", config.service.name);
    info!("   Listening on: {}", config.bind_address());
    info!("   Log level: {}", config.service.log_level);
    if let Some(log_file) = &config.service.log_file {
        info!("   Log file: {} (rotated daily)", log_file.display());
    }
    info!("   Game debug: {}", config.game.debug);
    info!("   Move delay: {}ms", config.game.move_delay_ms);
    info!("   Seats per game: {}", config.game.max_players);
    match config.lobby.reap_interval() {
        Some(interval) => info!("   Background reaping: every {}s", interval.as_secs()),
        None => info!("   Background reaping: disabled"),
    }
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

/// Load and merge configuration from environment, file and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(port) = args.port {
        config.service.port = port;
    }

    if let Some(log_file) = &args.log {
        config.service.log_file = Some(log_file.clone());
    }

    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
        config.game.debug = true;
    }

    if let Some(reap_interval) = args.reap_interval {
        config.lobby.reap_interval_seconds = reap_interval;
    }

    validate_config(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration (CLI args can override environment/config file)
    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    // Initialize logging early; the guard flushes file output on exit
    let _log_guard =
        match init_logging(&config.service.log_level, config.service.log_file.as_ref()) {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("Failed to initialize logging: {}", e);
                std::process::exit(1);
            }
        };

    if args.dry_run {
        info!("Configuration validation successful");
        display_startup_banner(&config);
        info!("Dry run completed - exiting without starting service");
        return Ok(());
    }

    display_startup_banner(&config);

    // Initialize application state
    info!("Initializing service components...");
    let app_state = match AppState::new(config.clone()).await {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    // Start the service
    info!("Starting service...");
    if let Err(e) = app_state.start().await {
        error!("Failed to start service: {}", e);
        std::process::exit(1);
    }

    // Start health check monitoring
    let health_task = {
        let app_state = app_state.clone();
        tokio::spawn(async move {
            health_check_task(app_state).await;
        })
    };

    info!("Treason lobby server is running");
    info!("Press Ctrl+C to shutdown gracefully...");

    wait_for_shutdown_signal().await;

    info!("Shutdown signal received, beginning graceful shutdown...");
    health_task.abort();

    // The server drain inside shutdown is bounded by the same timeout
    let shutdown_timeout = config.shutdown_timeout() + Duration::from_secs(1);
    match tokio::time::timeout(shutdown_timeout, app_state.shutdown()).await {
        Ok(Ok(())) => {
            info!("Graceful shutdown completed successfully");
        }
        Ok(Err(e)) => {
            error!("Error during shutdown: {}", e);
        }
        Err(_) => {
            warn!("Shutdown timeout exceeded, forcing exit");
        }
    }

    info!("Treason lobby server stopped");
    Ok(())
}
