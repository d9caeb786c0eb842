//! Service layer for the treason-lobby server
//!
//! This module contains the application state, the HTTP server and the
//! background task management for the production service.

pub mod app;
pub mod health;
pub mod server;

pub use app::{AppState, ServiceError};
pub use health::{HealthCheck, HealthStatus};
pub use server::{create_router, LOBBY_PATH};
