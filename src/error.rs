//! Error types for the TPay client

use thiserror::Error;

/// Result type alias for TPay operations
pub type Result<T> = std::result::Result<T, TpayError>;

/// Main error type for TPay operations
///
/// Remote error responses are not represented here: the API's 4xx/5xx bodies are
/// handed back to the caller as decoded JSON.
#[derive(Error, Debug)]
pub enum TpayError {
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error (connect, DNS, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint URL could not be built
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl TpayError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether the error came from the transport layer
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}
