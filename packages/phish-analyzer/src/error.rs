//! Typed errors for the analysis pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.
//!
//! Two reporting paths exist:
//! - [`RunError`] is returned inline by `AnalysisPipeline::run` when a run
//!   cannot start (busy, bad input). No work is done and no event is sent.
//! - [`FetchError`] and [`ModelError`] happen inside a running analysis and
//!   surface as the terminal `AnalysisOutcome::Failure`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// User-correctable input problems, reported before any work starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ValidationError {
    /// Empty input, or only the `http://` / `https://` placeholder
    #[error("missing URL")]
    MissingUrl,

    /// URL does not start with `http://` or `https://`
    #[error("missing scheme")]
    MissingScheme,

    /// URL shorter than the minimum plausible length
    #[error("too short")]
    TooShort,

    /// No model selected
    #[error("missing model name")]
    MissingModel,
}

impl ValidationError {
    /// Operator-facing explanation, worded like a dialog message.
    pub fn hint(&self) -> &'static str {
        match self {
            Self::MissingUrl => "Please enter a valid URL",
            Self::MissingScheme => "URL must start with http:// or https://",
            Self::TooShort => "URL appears to be too short",
            Self::MissingModel => "Please select an AI model",
        }
    }
}

/// Synchronous rejection of a `run` call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    /// A run is already in flight on this pipeline instance
    #[error("analysis already in progress")]
    Busy,

    /// Request failed validation
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),
}

/// Network failure categories for page retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkErrorKind {
    /// Deadline exceeded while connecting or reading
    Timeout,

    /// DNS failure, refused connection, TLS failure
    ConnectionError,

    /// Server answered with a non-2xx status
    HttpError,

    /// Anything else the transport rejected (unparsable URL, redirect loop,
    /// broken body stream)
    Request,
}

impl NetworkErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::ConnectionError => "connection_error",
            Self::HttpError => "http_error",
            Self::Request => "request_error",
        }
    }
}

impl std::fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Page retrieval failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {detail}")]
pub struct FetchError {
    pub kind: NetworkErrorKind,
    pub detail: String,
    /// HTTP status when `kind` is `HttpError`
    pub status: Option<u16>,
}

impl FetchError {
    pub fn new(kind: NetworkErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            status: None,
        }
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::new(NetworkErrorKind::Timeout, detail)
    }

    pub fn connection(detail: impl Into<String>) -> Self {
        Self::new(NetworkErrorKind::ConnectionError, detail)
    }

    /// Non-2xx response. Detail reads like `HTTP 404 Not Found`.
    pub fn http(status: u16, reason: Option<&str>) -> Self {
        let detail = match reason {
            Some(reason) => format!("HTTP {} {}", status, reason),
            None => format!("HTTP {}", status),
        };
        Self {
            kind: NetworkErrorKind::HttpError,
            detail,
            status: Some(status),
        }
    }

    /// Whether a bounded retry could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            NetworkErrorKind::Timeout | NetworkErrorKind::ConnectionError => true,
            NetworkErrorKind::HttpError => {
                matches!(self.status, Some(s) if s >= 500 || s == 429)
            }
            NetworkErrorKind::Request => false,
        }
    }
}

/// Model invocation failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelErrorKind {
    /// Generation service not reachable
    ModelUnavailable,

    /// Service reachable but returned an error payload (e.g. unknown model)
    ModelError,

    /// Success status but no usable text in the body
    MalformedResponse,

    /// Generation exceeded its deadline
    Timeout,
}

impl ModelErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ModelUnavailable => "model_unavailable",
            Self::ModelError => "model_error",
            Self::MalformedResponse => "malformed_response",
            Self::Timeout => "model_timeout",
        }
    }
}

impl std::fmt::Display for ModelErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model invocation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {detail}")]
pub struct ModelError {
    pub kind: ModelErrorKind,
    pub detail: String,
}

impl ModelError {
    pub fn new(kind: ModelErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self::new(ModelErrorKind::ModelUnavailable, detail)
    }

    pub fn rejected(detail: impl Into<String>) -> Self {
        Self::new(ModelErrorKind::ModelError, detail)
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::new(ModelErrorKind::MalformedResponse, detail)
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::new(ModelErrorKind::Timeout, detail)
    }

    /// Whether a bounded retry could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            ModelErrorKind::ModelUnavailable | ModelErrorKind::Timeout
        )
    }
}

/// Failure category carried by a terminal failure outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", content = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    Validation(ValidationError),
    Network(NetworkErrorKind),
    Model(ModelErrorKind),
    Cancelled,
    /// The worker stopped without an outcome of its own
    Aborted,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(e) => write!(f, "validation error ({})", e),
            Self::Network(kind) => write!(f, "network error ({})", kind),
            Self::Model(kind) => write!(f, "model error ({})", kind),
            Self::Cancelled => f.write_str("cancelled"),
            Self::Aborted => f.write_str("aborted"),
        }
    }
}

impl From<&FetchError> for FailureKind {
    fn from(err: &FetchError) -> Self {
        Self::Network(err.kind)
    }
}

impl From<&ModelError> for FailureKind {
    fn from(err: &ModelError) -> Self {
        Self::Model(err.kind)
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable present but unparsable
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: String, value: String },

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Result type alias for model invocation.
pub type ModelResult<T> = std::result::Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_detail() {
        let err = FetchError::http(503, Some("Service Unavailable"));
        assert_eq!(err.kind, NetworkErrorKind::HttpError);
        assert_eq!(err.detail, "HTTP 503 Service Unavailable");
        assert_eq!(err.to_string(), "http_error: HTTP 503 Service Unavailable");
    }

    #[test]
    fn test_fetch_retry_classification() {
        assert!(FetchError::timeout("slow").is_retryable());
        assert!(FetchError::connection("refused").is_retryable());
        assert!(FetchError::http(502, None).is_retryable());
        assert!(FetchError::http(429, None).is_retryable());
        assert!(!FetchError::http(404, None).is_retryable());
        assert!(!FetchError::new(NetworkErrorKind::Request, "bad url").is_retryable());
    }

    #[test]
    fn test_model_retry_classification() {
        assert!(ModelError::unavailable("down").is_retryable());
        assert!(ModelError::timeout("slow").is_retryable());
        assert!(!ModelError::rejected("unknown model").is_retryable());
        assert!(!ModelError::malformed("no text").is_retryable());
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(ValidationError::MissingUrl.to_string(), "missing URL");
        assert_eq!(ValidationError::MissingScheme.to_string(), "missing scheme");
        assert_eq!(ValidationError::TooShort.to_string(), "too short");
        assert_eq!(
            RunError::from(ValidationError::MissingModel).to_string(),
            "invalid request: missing model name"
        );
    }
}
