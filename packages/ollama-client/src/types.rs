//! Ollama API request and response types.

use serde::{Deserialize, Serialize};

// =============================================================================
// Generate
// =============================================================================

/// Generate request (`POST /api/generate`).
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    /// Model to use (e.g., "llama3", "phishing-detector")
    pub model: String,

    /// Prompt text
    pub prompt: String,

    /// Optional system prompt overriding the modelfile's
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Model parameters (temperature, num_ctx, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerateOptions>,

    /// Always false: the client reads a single JSON object
    pub stream: bool,
}

impl GenerateRequest {
    /// Create a new non-streaming generate request.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            stream: false,
        }
    }

    /// Set the system prompt.
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set model options.
    pub fn options(mut self, options: GenerateOptions) -> Self {
        self.options = Some(options);
        self
    }
}

/// Subset of Ollama model parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Context window size in tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_ctx: Option<u32>,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i32>,
}

/// Generate response.
///
/// Ollama puts the generated text under `response`; some proxies and older
/// builds use `text`. Both are optional here and [`GenerateResponse::text`]
/// does the lookup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateResponse {
    /// Model that produced the answer
    #[serde(default)]
    pub model: Option<String>,

    /// Generated text (primary field)
    #[serde(default)]
    pub response: Option<String>,

    /// Generated text (fallback field)
    #[serde(default)]
    pub text: Option<String>,

    /// Whether generation finished
    #[serde(default)]
    pub done: bool,

    /// Total wall time in nanoseconds
    #[serde(default)]
    pub total_duration: Option<u64>,

    /// Prompt tokens evaluated
    #[serde(default)]
    pub prompt_eval_count: Option<u32>,

    /// Tokens generated
    #[serde(default)]
    pub eval_count: Option<u32>,
}

impl GenerateResponse {
    /// Generated text: `response` first, then `text`.
    pub fn text(&self) -> Option<&str> {
        self.response.as_deref().or(self.text.as_deref())
    }
}

/// Error payload returned with non-2xx statuses: `{"error": "..."}`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}
