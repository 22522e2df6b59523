//! Ollama implementation of the `ModelClient` trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use ollama_client::OllamaClient;
//! use phish_analyzer::ModelClient;
//!
//! let client = OllamaClient::from_env()?;
//! let text = client.generate("phishing-detector", &prompt, Duration::from_secs(300)).await?;
//! ```

use std::time::{Duration, Instant};

use async_trait::async_trait;
use ollama_client::{GenerateRequest, OllamaClient, OllamaError};
use tracing::{debug, warn};

use crate::error::{ModelError, ModelResult};
use crate::traits::model::ModelClient;

impl From<OllamaError> for ModelError {
    fn from(err: OllamaError) -> Self {
        match err {
            OllamaError::Unavailable(msg) | OllamaError::Config(msg) => ModelError::unavailable(msg),
            OllamaError::Timeout(msg) => ModelError::timeout(msg),
            OllamaError::Api { status, message } => {
                ModelError::rejected(format!("HTTP {}: {}", status, message))
            }
            OllamaError::Parse(msg) => ModelError::malformed(msg),
        }
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    async fn generate(&self, model: &str, prompt: &str, timeout: Duration) -> ModelResult<String> {
        let start = Instant::now();
        let request = GenerateRequest::new(model, prompt);

        let response = OllamaClient::generate(self, &request, Some(timeout))
            .await
            .map_err(|e| {
                warn!(model = %model, error = %e, "Ollama generation failed");
                ModelError::from(e)
            })?;

        let text = response.text().ok_or_else(|| {
            warn!(model = %model, "Ollama response carried no text field");
            ModelError::malformed("response has neither 'response' nor 'text'")
        })?;

        debug!(
            model = %model,
            chars = text.chars().count(),
            eval_count = ?response.eval_count,
            duration_ms = start.elapsed().as_millis() as u64,
            "Ollama generation completed"
        );

        Ok(text.to_string())
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
