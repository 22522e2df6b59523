//! Pure Ollama REST API client
//!
//! A small client for a locally-hosted Ollama server with no domain-specific
//! logic. Covers non-streaming text generation.
//!
//! # Example
//!
//! ```rust,ignore
//! use ollama_client::{GenerateRequest, OllamaClient};
//!
//! let client = OllamaClient::from_env()?;
//!
//! let response = client
//!     .generate(&GenerateRequest::new("llama3", "Hello!"), None)
//!     .await?;
//!
//! println!("{}", response.text().unwrap_or_default());
//! ```

pub mod error;
pub mod types;

pub use error::{OllamaError, Result};
pub use types::*;

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

/// Default address of a local Ollama server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Pure Ollama API client.
#[derive(Clone)]
pub struct OllamaClient {
    http_client: Client,
    base_url: String,
}

impl OllamaClient {
    /// Create a client pointing at the default local server.
    pub fn new() -> Result<Self> {
        let http_client = Client::builder()
            .build()
            .map_err(|e| OllamaError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Create from environment variable `OLLAMA_HOST`, falling back to the
    /// default local address.
    ///
    /// A bare `host:port` value gets an `http://` prefix, as the Ollama CLI
    /// accepts that form.
    pub fn from_env() -> Result<Self> {
        match std::env::var("OLLAMA_HOST") {
            Ok(host) if !host.trim().is_empty() => {
                Ok(Self::new()?.with_base_url(normalize_host(&host)?))
            }
            _ => Self::new(),
        }
    }

    /// Set a custom base URL (remote host, proxy, mock server).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set a custom HTTP client.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = client;
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Text generation.
    ///
    /// Sends a single non-streaming request. `timeout` bounds the whole
    /// exchange, including reading the body; `None` leaves it to the
    /// underlying HTTP client.
    pub async fn generate(
        &self,
        request: &GenerateRequest,
        timeout: Option<Duration>,
    ) -> Result<GenerateResponse> {
        let start = std::time::Instant::now();

        let mut builder = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .header("Content-Type", "application/json")
            .json(request);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, base_url = %self.base_url, "Ollama request failed");
            OllamaError::from_transport(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&error_text)
                .map(|body| body.error)
                .unwrap_or(error_text);
            warn!(status = %status, error = %message, model = %request.model, "Ollama API error");
            return Err(OllamaError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await.map_err(OllamaError::from_transport)?;
        let generate_response: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| OllamaError::Parse(format!("Failed to deserialize response: {}", e)))?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            eval_count = generate_response.eval_count.unwrap_or_default(),
            "Ollama generation"
        );

        Ok(generate_response)
    }
}

/// Turn an `OLLAMA_HOST` value into a base URL.
fn normalize_host(host: &str) -> Result<String> {
    let host = host.trim().trim_end_matches('/');
    if host.contains(char::is_whitespace) {
        return Err(OllamaError::Config(format!("invalid OLLAMA_HOST: {:?}", host)));
    }
    if host.starts_with("http://") || host.starts_with("https://") {
        Ok(host.to_string())
    } else {
        Ok(format!("http://{}", host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_new_builds_default_client() {
        let client = OllamaClient::new().unwrap();

        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_client_builder() {
        let client = OllamaClient::new().unwrap().with_base_url("http://gpu-box:11434/");

        assert_eq!(client.base_url, "http://gpu-box:11434");
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("0.0.0.0:11434").unwrap(), "http://0.0.0.0:11434");
        assert_eq!(
            normalize_host("https://ollama.internal/").unwrap(),
            "https://ollama.internal"
        );
        assert!(normalize_host("bad host").is_err());
    }

    #[tokio::test]
    async fn test_generate_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({
                "model": "phishing-detector",
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "phishing-detector",
                "response": "LOW RISK",
                "done": true,
                "eval_count": 3
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OllamaClient::new().unwrap().with_base_url(server.uri());
        let response = client
            .generate(&GenerateRequest::new("phishing-detector", "prompt"), None)
            .await
            .unwrap();

        assert_eq!(response.text(), Some("LOW RISK"));
        assert_eq!(response.eval_count, Some(3));
    }

    #[tokio::test]
    async fn test_generate_unknown_model_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"error": "model 'nope' not found"})),
            )
            .mount(&server)
            .await;

        let client = OllamaClient::new().unwrap().with_base_url(server.uri());
        let err = client
            .generate(&GenerateRequest::new("nope", "prompt"), None)
            .await
            .unwrap_err();

        match err {
            OllamaError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "model 'nope' not found");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_invalid_json_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = OllamaClient::new().unwrap().with_base_url(server.uri());
        let err = client
            .generate(&GenerateRequest::new("llama3", "prompt"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, OllamaError::Parse(_)));
    }

    #[tokio::test]
    async fn test_generate_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"response": "late"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = OllamaClient::new().unwrap().with_base_url(server.uri());
        let err = client
            .generate(
                &GenerateRequest::new("llama3", "prompt"),
                Some(Duration::from_millis(50)),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, OllamaError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_generate_connection_refused_is_unavailable() {
        // Port 9 (discard) is not expected to have an HTTP listener.
        let client = OllamaClient::new().unwrap().with_base_url("http://127.0.0.1:9");
        let err = client
            .generate(
                &GenerateRequest::new("llama3", "prompt"),
                Some(Duration::from_secs(5)),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, OllamaError::Unavailable(_)));
    }
}
