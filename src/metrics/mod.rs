//! Metrics for the treason-lobby service
//!
//! This module provides Prometheus metrics collection for lobby activity,
//! client connections and service health.

pub mod collector;

pub use collector::{ConnectionMetrics, LobbyMetrics, MetricsCollector, ServiceMetrics};
