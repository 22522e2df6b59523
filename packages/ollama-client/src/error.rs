//! Error types for Ollama client.

use thiserror::Error;

/// Result type for Ollama client operations.
pub type Result<T> = std::result::Result<T, OllamaError>;

/// Ollama client errors.
#[derive(Debug, Error)]
pub enum OllamaError {
    /// Configuration error (bad base URL, HTTP client could not be built)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server not reachable (connection refused, DNS failure)
    #[error("Ollama unavailable: {0}")]
    Unavailable(String),

    /// Request exceeded its deadline
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Server answered with a non-2xx status (unknown model, bad request)
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl OllamaError {
    /// Classify a transport-level reqwest error.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Unavailable(err.to_string())
        } else if err.is_builder() {
            Self::Config(err.to_string())
        } else {
            Self::Unavailable(err.to_string())
        }
    }
}
