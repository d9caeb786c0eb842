//! HTTP server for lobby sockets, health checks and Prometheus metrics
//!
//! Everything is served from one Axum router: the `/lobby` WebSocket that
//! clients play through, plus the monitoring endpoints.

use crate::service::app::AppState;
use crate::service::health::{HealthCheck, HealthStatus};
use crate::transport::socket::serve_socket;
use anyhow::Result;
use axum::{
    extract::{ws::WebSocketUpgrade, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Path clients open their lobby socket on
pub const LOBBY_PATH: &str = "/lobby";

/// Build the router serving the lobby socket and monitoring endpoints
pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route(LOBBY_PATH, get(lobby_handler))
        .route("/version", get(version_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/alive", get(alive_handler))
        .route("/metrics", get(metrics_handler))
        .route("/stats", get(stats_handler))
        .with_state(app_state)
}

/// Serve the router on an already bound listener until `shutdown` resolves
pub async fn serve(
    listener: TcpListener,
    app_state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr = listener.local_addr()?;
    let app = create_router(app_state);

    info!("Lobby server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Lobby server stopped");
    Ok(())
}

/// Root endpoint handler - shows service information
async fn root_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "service": state.config().service.name,
        "version": crate::VERSION,
        "endpoints": [
            LOBBY_PATH,
            "/version",
            "/health",
            "/ready",
            "/alive",
            "/metrics",
            "/stats"
        ]
    }))
}

/// Upgrade to a lobby WebSocket
async fn lobby_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    let lobby = state.lobby();
    ws.on_upgrade(move |socket| serve_socket(socket, lobby))
}

/// Version endpoint handler
async fn version_handler() -> impl IntoResponse {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": crate::VERSION
    }))
}

/// Lightweight health check endpoint handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    debug!("Health check requested");

    let service = state.config().service.name.clone();
    let (code, status) = match HealthCheck::liveness_check(state).await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, HealthStatus::Healthy),
        Ok(HealthStatus::Degraded) => (StatusCode::OK, HealthStatus::Degraded),
        Ok(HealthStatus::Unhealthy) | Err(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, HealthStatus::Unhealthy)
        }
    };

    (
        code,
        Json(json!({
            "status": status,
            "service": service,
            "version": crate::VERSION
        })),
    )
}

/// Readiness check endpoint handler
async fn ready_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    debug!("Readiness check requested");

    match HealthCheck::readiness_check(state).await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "Ready"),
        Ok(HealthStatus::Degraded) => (StatusCode::OK, "Degraded but ready"),
        Ok(HealthStatus::Unhealthy) => (StatusCode::SERVICE_UNAVAILABLE, "Not ready"),
        Err(e) => {
            error!("Readiness check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "Not ready")
        }
    }
}

/// Liveness check endpoint handler
async fn alive_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    debug!("Liveness check requested");

    match HealthCheck::liveness_check(state).await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "Alive"),
        _ => (StatusCode::SERVICE_UNAVAILABLE, "Not alive"),
    }
}

/// Prometheus metrics endpoint handler
async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    debug!("Metrics endpoint requested");

    let collector = state.metrics_collector();
    if let Ok(stats) = state.lobby().stats() {
        collector.update_from_lobby_stats(&stats);
    }

    let metric_families = collector.registry().gather();
    let encoder = TextEncoder::new();

    match encoder.encode_to_string(&metric_families) {
        Ok(metrics_output) => {
            debug!("Serving {} metric families", metric_families.len());
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, encoder.format_type().to_string())],
                metrics_output,
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics".to_string(),
            )
                .into_response()
        }
    }
}

/// Detailed service statistics endpoint handler
async fn stats_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    debug!("Stats endpoint requested");

    let lobby_stats = match state.lobby().stats() {
        Ok(stats) => stats,
        Err(e) => {
            error!("Failed to get stats: {}", e);
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": "Failed to get lobby stats",
                    "timestamp": chrono::Utc::now()
                })),
            );
        }
    };

    match HealthCheck::check(state.clone()).await {
        Ok(health) => (
            StatusCode::OK,
            Json(json!({
                "service": {
                    "name": health.service,
                    "version": health.version,
                    "status": health.status,
                    "uptime_seconds": health.stats.uptime_seconds
                },
                "lobby": lobby_stats,
                "components": health.checks,
                "timestamp": chrono::Utc::now()
            })),
        ),
        Err(e) => {
            error!("Failed to get stats: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": "Failed to get service stats",
                    "timestamp": chrono::Utc::now()
                })),
            )
        }
    }
}
