//! Utility functions for the lobby service

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new unique connection ID
pub fn generate_connection_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Milliseconds elapsed since `start`, for log lines
pub fn elapsed_ms(start: std::time::Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
