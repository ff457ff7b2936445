//! Error types for fleet client operations

use thiserror::Error;

/// Result type alias for fleet client operations
pub type Result<T> = std::result::Result<T, FleetClientError>;

/// Errors that can occur during fleet client operations
#[derive(Error, Debug)]
pub enum FleetClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Server returned an error response
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Device not found
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Action not found
    #[error("Action not found: {0}")]
    ActionNotFound(String),

    /// Device already registered, or busy with another action
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Request rejected as malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Timeout
    #[error("Request timed out")]
    Timeout,
}

impl FleetClientError {
    /// Create a server error from status code and message
    pub fn server_error(status: u16, message: impl Into<String>) -> Self {
        Self::ServerError {
            status,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            FleetClientError::DeviceNotFound(_) | FleetClientError::ActionNotFound(_)
        )
    }
}
