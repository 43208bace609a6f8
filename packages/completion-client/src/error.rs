//! Error types for the completion client.

use thiserror::Error;

/// Result type for completion client operations.
pub type Result<T> = std::result::Result<T, CompletionError>;

/// Completion client errors.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Configuration error (missing API key, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error (connection failed, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Provider answered with a non-2xx status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl CompletionError {
    /// HTTP status returned by the provider, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            CompletionError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Billing / quota exhaustion (HTTP 402 or 429 with an insufficient_quota body).
    pub fn is_billing(&self) -> bool {
        match self {
            CompletionError::Api { status: 402, .. } => true,
            CompletionError::Api {
                status: 429,
                message,
            } => message.contains("quota"),
            _ => false,
        }
    }
}
