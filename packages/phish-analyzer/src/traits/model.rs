//! Model client trait for text generation.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ModelResult;

/// Abstraction over a text generation endpoint.
///
/// Implementations wrap a specific backend (Ollama, a hosted API, a test
/// double) and map its failures onto [`crate::error::ModelErrorKind`]:
/// - service unreachable → `ModelUnavailable`
/// - error payload from a reachable service → `ModelError`
/// - success status without generated text → `MalformedResponse`
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generate a completion for `prompt` with `model`. Single attempt.
    async fn generate(&self, model: &str, prompt: &str, timeout: Duration) -> ModelResult<String>;

    /// Short name for logs.
    fn name(&self) -> &str;
}
