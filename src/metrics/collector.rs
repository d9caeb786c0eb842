//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the treason-lobby service
//! using Prometheus metrics.

use crate::lobby::controller::LobbyStats;
use crate::types::GameKind;
use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry,
};
use std::sync::Arc;
use std::time::Duration;

/// Join outcome labels
pub const JOIN_ATTACHED: &str = "attached";
pub const JOIN_REJECTED: &str = "rejected";
pub const JOIN_NOT_FOUND: &str = "not_found";

/// Main metrics collector for the lobby service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Lobby-related metrics
    lobby_metrics: LobbyMetrics,

    /// Connection-related metrics
    connection_metrics: ConnectionMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Component health status
    pub component_health: IntGaugeVec,
}

/// Lobby-related metrics
#[derive(Clone)]
pub struct LobbyMetrics {
    /// Join requests by outcome and game kind
    pub joins_total: IntCounterVec,

    /// Games created by kind
    pub games_created_total: IntCounterVec,

    /// Finished private games removed from the registry
    pub games_reaped_total: IntCounter,

    /// Public games popped from the queue without an open seat
    pub stale_games_discarded_total: IntCounter,

    /// Public games waiting for more players
    pub public_queue_depth: IntGauge,

    /// Registered private games
    pub private_games: IntGauge,

    /// Join processing time
    pub join_duration_seconds: HistogramVec,
}

/// Connection-related metrics
#[derive(Clone)]
pub struct ConnectionMetrics {
    /// Currently open client connections
    pub active_connections: IntGauge,

    /// Total client connections accepted
    pub connections_total: IntCounter,

    /// Inbound events by name
    pub events_total: IntCounterVec,

    /// Frames that could not be parsed
    pub malformed_events_total: IntCounter,

    /// Connection lifetime
    pub connection_duration_seconds: Histogram,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let lobby_metrics = LobbyMetrics::new(&registry)?;
        let connection_metrics = ConnectionMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            lobby_metrics,
            connection_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get service metrics
    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    /// Get lobby metrics
    pub fn lobby(&self) -> &LobbyMetrics {
        &self.lobby_metrics
    }

    /// Get connection metrics
    pub fn connection(&self) -> &ConnectionMetrics {
        &self.connection_metrics
    }

    /// Refresh gauges from a lobby stats snapshot
    pub fn update_from_lobby_stats(&self, stats: &LobbyStats) {
        self.lobby_metrics
            .public_queue_depth
            .set(stats.public_queue_depth as i64);
        self.lobby_metrics
            .private_games
            .set(stats.private_games as i64);
        self.connection_metrics
            .active_connections
            .set(stats.active_connections as i64);
    }

    /// Record a processed join request
    pub fn record_join(&self, outcome: &str, kind: GameKind, duration: Duration) {
        let kind_str = kind.as_label();

        self.lobby_metrics
            .joins_total
            .with_label_values(&[outcome, kind_str])
            .inc();

        self.lobby_metrics
            .join_duration_seconds
            .with_label_values(&[kind_str])
            .observe(duration.as_secs_f64());
    }

    /// Record a game session being created
    pub fn record_game_created(&self, kind: GameKind) {
        self.lobby_metrics
            .games_created_total
            .with_label_values(&[kind.as_label()])
            .inc();
    }

    /// Record private games removed by a reap sweep
    pub fn record_games_reaped(&self, count: usize) {
        self.lobby_metrics.games_reaped_total.inc_by(count as u64);
    }

    /// Record a stale public game discarded during matching
    pub fn record_stale_game_discarded(&self) {
        self.lobby_metrics.stale_games_discarded_total.inc();
    }

    /// Record a new client connection
    pub fn record_connection_opened(&self) {
        self.connection_metrics.connections_total.inc();
        self.connection_metrics.active_connections.inc();
    }

    /// Record a client connection going away
    pub fn record_connection_closed(&self, lifetime: Duration) {
        self.connection_metrics.active_connections.dec();
        self.connection_metrics
            .connection_duration_seconds
            .observe(lifetime.as_secs_f64());
    }

    /// Record an inbound client event
    pub fn record_event(&self, event: &str) {
        self.connection_metrics
            .events_total
            .with_label_values(&[event])
            .inc();
    }

    /// Record a frame that could not be parsed
    pub fn record_malformed_event(&self) {
        self.connection_metrics.malformed_events_total.inc();
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Update component health
    pub fn update_component_health(&self, component: &str, healthy: bool) {
        let status = if healthy { 1 } else { 0 };
        self.service_metrics
            .component_health
            .with_label_values(&[component])
            .set(status);
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds =
            IntGauge::new("treason_lobby_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let health_status = IntGauge::new(
            "treason_lobby_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let component_health = IntGaugeVec::new(
            Opts::new("treason_lobby_component_health", "Component health status"),
            &["component"],
        )?;
        registry.register(Box::new(component_health.clone()))?;

        Ok(Self {
            uptime_seconds,
            health_status,
            component_health,
        })
    }
}

impl LobbyMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let joins_total = IntCounterVec::new(
            Opts::new("treason_lobby_joins_total", "Join requests by outcome"),
            &["outcome", "kind"],
        )?;
        registry.register(Box::new(joins_total.clone()))?;

        let games_created_total = IntCounterVec::new(
            Opts::new("treason_lobby_games_created_total", "Total games created"),
            &["kind"],
        )?;
        registry.register(Box::new(games_created_total.clone()))?;

        let games_reaped_total = IntCounter::new(
            "treason_lobby_games_reaped_total",
            "Finished private games reaped",
        )?;
        registry.register(Box::new(games_reaped_total.clone()))?;

        let stale_games_discarded_total = IntCounter::new(
            "treason_lobby_stale_games_discarded_total",
            "Public games discarded from the queue without an open seat",
        )?;
        registry.register(Box::new(stale_games_discarded_total.clone()))?;

        let public_queue_depth = IntGauge::new(
            "treason_lobby_public_queue_depth",
            "Public games waiting for players",
        )?;
        registry.register(Box::new(public_queue_depth.clone()))?;

        let private_games = IntGauge::new(
            "treason_lobby_private_games",
            "Registered private games",
        )?;
        registry.register(Box::new(private_games.clone()))?;

        let join_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "treason_lobby_join_duration_seconds",
                "Join processing time",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]),
            &["kind"],
        )?;
        registry.register(Box::new(join_duration_seconds.clone()))?;

        Ok(Self {
            joins_total,
            games_created_total,
            games_reaped_total,
            stale_games_discarded_total,
            public_queue_depth,
            private_games,
            join_duration_seconds,
        })
    }
}

impl ConnectionMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let active_connections = IntGauge::new(
            "treason_lobby_active_connections",
            "Currently open client connections",
        )?;
        registry.register(Box::new(active_connections.clone()))?;

        let connections_total = IntCounter::new(
            "treason_lobby_connections_total",
            "Total client connections accepted",
        )?;
        registry.register(Box::new(connections_total.clone()))?;

        let events_total = IntCounterVec::new(
            Opts::new("treason_lobby_events_total", "Inbound client events"),
            &["event"],
        )?;
        registry.register(Box::new(events_total.clone()))?;

        let malformed_events_total = IntCounter::new(
            "treason_lobby_malformed_events_total",
            "Client frames that could not be parsed",
        )?;
        registry.register(Box::new(malformed_events_total.clone()))?;

        let connection_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "treason_lobby_connection_duration_seconds",
                "Client connection lifetime",
            )
            .buckets(vec![1.0, 10.0, 60.0, 300.0, 900.0, 1800.0, 3600.0]),
        )?;
        registry.register(Box::new(connection_duration_seconds.clone()))?;

        Ok(Self {
            active_connections,
            connections_total,
            events_total,
            malformed_events_total,
            connection_duration_seconds,
        })
    }
}
