//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the analysis pipeline
//! without making real network or model calls. Both mocks are cheap to
//! clone and clones share configuration and call history, so a test can
//! keep a clone after moving the mock into a pipeline.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{FetchError, ModelError, ModelResult};
use crate::traits::{fetcher::Fetcher, model::ModelClient};
use crate::types::{FetchResult, FetchedPage};

/// Body served by [`MockFetcher`] for URLs without a configured page.
pub const DEFAULT_MOCK_BODY: &str = "<html><body>Mock page</body></html>";

/// Text returned by [`MockModel`] when no response is configured.
pub const DEFAULT_MOCK_ANALYSIS: &str = "Overall risk assessment: LOW RISK\nRecommendation: SAFE";

/// A mock fetcher for testing.
///
/// Serves predefined bodies or errors per URL, applying the character budget
/// exactly like a real fetcher.
#[derive(Clone, Default)]
pub struct MockFetcher {
    /// Predefined outcomes by URL
    pages: Arc<RwLock<HashMap<String, Result<String, FetchError>>>>,

    /// Errors returned, in order, before any predefined outcome
    queued_errors: Arc<RwLock<VecDeque<FetchError>>>,

    /// Artificial latency per call
    delay: Option<Duration>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockFetchCall>>>,
}

/// Record of a call made to the mock fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockFetchCall {
    pub url: String,
    pub timeout: Duration,
    pub max_chars: usize,
}

impl MockFetcher {
    /// Create a new mock fetcher serving [`DEFAULT_MOCK_BODY`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    pub fn with_page(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages
            .write()
            .unwrap()
            .insert(url.into(), Ok(body.into()));
        self
    }

    /// Fail every fetch of `url` with `error`.
    pub fn with_error(self, url: impl Into<String>, error: FetchError) -> Self {
        self.pages.write().unwrap().insert(url.into(), Err(error));
        self
    }

    /// Fail the next call, whatever its URL. Queued errors are consumed in
    /// order before predefined pages apply.
    pub fn with_queued_error(self, error: FetchError) -> Self {
        self.queued_errors.write().unwrap().push_back(error);
        self
    }

    /// Sleep for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockFetchCall> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// Clear call history.
    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str, timeout: Duration, max_chars: usize) -> FetchResult {
        self.calls.write().unwrap().push(MockFetchCall {
            url: url.to_string(),
            timeout,
            max_chars,
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.queued_errors.write().unwrap().pop_front() {
            return Err(error);
        }

        let outcome = self.pages.read().unwrap().get(url).cloned();
        match outcome {
            Some(Ok(body)) => Ok(FetchedPage::from_body(url, &body, max_chars)),
            Some(Err(error)) => Err(error),
            None => Ok(FetchedPage::from_body(url, DEFAULT_MOCK_BODY, max_chars)),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A mock model client for testing.
///
/// Returns deterministic, configurable text per model name.
#[derive(Clone, Default)]
pub struct MockModel {
    /// Predefined outcomes by model name
    responses: Arc<RwLock<HashMap<String, ModelResult<String>>>>,

    /// Fallback text for unknown model names
    default_response: Option<String>,

    /// Errors returned, in order, before any predefined outcome
    queued_errors: Arc<RwLock<VecDeque<ModelError>>>,

    /// Artificial latency per call
    delay: Option<Duration>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockModelCall>>>,
}

/// Record of a call made to the mock model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockModelCall {
    pub model: String,
    pub prompt: String,
    pub timeout: Duration,
}

impl MockModel {
    /// Create a new mock answering [`DEFAULT_MOCK_ANALYSIS`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `text` for any model without a predefined response.
    pub fn with_default_response(mut self, text: impl Into<String>) -> Self {
        self.default_response = Some(text.into());
        self
    }

    /// Answer `text` for `model`.
    pub fn with_response(self, model: impl Into<String>, text: impl Into<String>) -> Self {
        self.responses
            .write()
            .unwrap()
            .insert(model.into(), Ok(text.into()));
        self
    }

    /// Fail every call for `model` with `error`.
    pub fn with_error(self, model: impl Into<String>, error: ModelError) -> Self {
        self.responses
            .write()
            .unwrap()
            .insert(model.into(), Err(error));
        self
    }

    /// Fail the next call, whatever its model.
    pub fn with_queued_error(self, error: ModelError) -> Self {
        self.queued_errors.write().unwrap().push_back(error);
        self
    }

    /// Sleep for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockModelCall> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// Clear call history.
    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }
}

#[async_trait]
impl ModelClient for MockModel {
    async fn generate(&self, model: &str, prompt: &str, timeout: Duration) -> ModelResult<String> {
        self.calls.write().unwrap().push(MockModelCall {
            model: model.to_string(),
            prompt: prompt.to_string(),
            timeout,
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.queued_errors.write().unwrap().pop_front() {
            return Err(error);
        }

        let outcome = self.responses.read().unwrap().get(model).cloned();
        match outcome {
            Some(result) => result,
            None => Ok(self
                .default_response
                .clone()
                .unwrap_or_else(|| DEFAULT_MOCK_ANALYSIS.to_string())),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
