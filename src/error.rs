//! Error types for the lobby service
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific lobby scenarios
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    #[error("Invalid client event: {reason}")]
    InvalidEvent { reason: String },

    #[error("Failed to deliver '{event}' event: {reason}")]
    EventDeliveryFailed { event: String, reason: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}
