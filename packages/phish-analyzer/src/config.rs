//! Configuration for the analysis pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Desktop Chrome user agent. Some phishing kits serve a blank page to
/// obvious bots, so the fetcher identifies as a browser.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Configuration for one pipeline instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Deadline for the page fetch, in seconds.
    ///
    /// Default: 15.
    pub fetch_timeout_secs: u64,

    /// Deadline for model generation, in seconds.
    ///
    /// Local models on CPU can take minutes for a 3000-char prompt.
    /// Default: 300.
    pub model_timeout_secs: u64,

    /// Characters of page content kept for the prompt.
    ///
    /// Default: 3000.
    pub max_chars: usize,

    /// User-Agent header sent with the page fetch.
    pub user_agent: String,

    /// Retry behaviour for fetch and model calls.
    ///
    /// Default: a single attempt.
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 15,
            model_timeout_secs: 300,
            max_chars: 3000,
            user_agent: BROWSER_USER_AGENT.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with `PHISH_*` environment variables.
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `PHISH_FETCH_TIMEOUT_SECS` | `fetch_timeout_secs` |
    /// | `PHISH_MODEL_TIMEOUT_SECS` | `model_timeout_secs` |
    /// | `PHISH_MAX_CHARS` | `max_chars` |
    /// | `PHISH_USER_AGENT` | `user_agent` |
    /// | `PHISH_RETRY_ATTEMPTS` | `retry.max_attempts` |
    /// | `PHISH_RETRY_BASE_DELAY_MS` | `retry.base_delay_ms` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse_var(&lookup, "PHISH_FETCH_TIMEOUT_SECS")? {
            config.fetch_timeout_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "PHISH_MODEL_TIMEOUT_SECS")? {
            config.model_timeout_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "PHISH_MAX_CHARS")? {
            config.max_chars = v;
        }
        if let Some(ua) = lookup("PHISH_USER_AGENT").filter(|v| !v.trim().is_empty()) {
            config.user_agent = ua;
        }
        if let Some(v) = parse_var(&lookup, "PHISH_RETRY_ATTEMPTS")? {
            config.retry.max_attempts = v;
        }
        if let Some(v) = parse_var(&lookup, "PHISH_RETRY_BASE_DELAY_MS")? {
            config.retry.base_delay_ms = v;
        }

        Ok(config)
    }

    /// Set the fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Set the model timeout.
    pub fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Set the content budget.
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Set the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                name: name.to_string(),
                value,
            }),
    }
}

/// Bounded retry with exponential backoff.
///
/// The default is a single attempt, i.e. no retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first. 0 is treated as 1.
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds. Doubles per retry.
    pub base_delay_ms: u64,

    /// Upper bound for a single delay, in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    /// Single attempt.
    pub fn none() -> Self {
        Self::default()
    }

    /// Up to `max_attempts` attempts with the default backoff.
    pub fn attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Set the base delay.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u64.saturating_pow(retry.saturating_sub(1));
        let ms = self
            .base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);
        Duration::from_millis(ms)
    }
}
