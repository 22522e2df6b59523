//! HTTP-based fetcher implementation.
//!
//! One GET per call, browser user agent, bounded in time and size.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::{PipelineConfig, BROWSER_USER_AGENT};
use crate::error::{ConfigError, FetchError, NetworkErrorKind};
use crate::traits::fetcher::Fetcher;
use crate::types::{truncate_chars, FetchResult, FetchedPage};

/// Worst-case UTF-8 width; reading `4 * max_chars` bytes always yields at
/// least `max_chars` characters.
const MAX_UTF8_WIDTH: usize = 4;

/// HTTP fetcher backed by a shared `reqwest::Client`.
///
/// # Example
///
/// ```rust,ignore
/// use phish_analyzer::fetchers::HttpFetcher;
///
/// let fetcher = HttpFetcher::new()?;
/// let page = fetcher.fetch("https://example.com", Duration::from_secs(15), 3000).await?;
/// ```
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl HttpFetcher {
    /// Create a new HTTP fetcher with default settings.
    pub fn new() -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            client,
            user_agent: BROWSER_USER_AGENT.to_string(),
        })
    }

    /// Create a fetcher using the user agent from `config`.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        Ok(Self::new()?.with_user_agent(config.user_agent.clone()))
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

/// Map a transport error onto a fetch failure kind.
fn classify(url: &str, err: reqwest::Error) -> FetchError {
    let kind = if err.is_timeout() {
        NetworkErrorKind::Timeout
    } else if err.is_connect() {
        NetworkErrorKind::ConnectionError
    } else {
        NetworkErrorKind::Request
    };
    warn!(url = %url, kind = %kind, error = %err, "HTTP fetch failed");
    FetchError::new(kind, err.to_string())
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration, max_chars: usize) -> FetchResult {
        let start = Instant::now();
        debug!(url = %url, timeout_ms = timeout.as_millis(), max_chars, "HTTP fetch starting");

        let mut response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = %status, "HTTP fetch returned error status");
            return Err(FetchError::http(status.as_u16(), status.canonical_reason()));
        }

        // Capture final URL after redirects
        let final_url = response.url().to_string();

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        // Stop reading once the budget is covered; the rest of the body is
        // never downloaded.
        let byte_budget = max_chars.saturating_mul(MAX_UTF8_WIDTH);
        let mut buf: Vec<u8> = Vec::with_capacity(byte_budget.min(64 * 1024));
        let mut exhausted = false;
        while buf.len() < byte_budget {
            match response.chunk().await.map_err(|e| classify(url, e))? {
                Some(chunk) => buf.extend_from_slice(&chunk),
                None => {
                    exhausted = true;
                    break;
                }
            }
        }
        // A body ending exactly at the budget has nothing left to drop
        if !exhausted && buf.len() == byte_budget {
            match response.chunk().await.map_err(|e| classify(url, e))? {
                Some(chunk) => buf.extend_from_slice(&chunk),
                None => exhausted = true,
            }
        }

        let text = String::from_utf8_lossy(&buf);
        let (body, cut) = truncate_chars(&text, max_chars);
        let truncated_at = if exhausted { cut } else { Some(max_chars) };

        info!(
            url = %url,
            status = status.as_u16(),
            bytes_read = buf.len(),
            chars_kept = body.chars().count(),
            truncated = truncated_at.is_some(),
            duration_ms = start.elapsed().as_millis(),
            "HTTP fetch completed"
        );

        Ok(FetchedPage {
            body: body.to_string(),
            truncated_at,
            status: status.as_u16(),
            final_url,
            content_type,
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_fetch_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/login"))
            .and(header("User-Agent", "PhishAnalyzerTest/1.0"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("<html>Login now</html>", "text/html"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new()
            .unwrap()
            .with_user_agent("PhishAnalyzerTest/1.0");
        let page = fetcher
            .fetch(&format!("{}/login", server.uri()), TIMEOUT, 3000)
            .await
            .unwrap();

        assert_eq!(page.body, "<html>Login now</html>");
        assert_eq!(page.status, 200);
        assert_eq!(page.truncated_at, None);
        assert_eq!(page.content_type.as_deref(), Some("text/html"));
    }

    #[test]
    fn test_default_user_agent_is_browser() {
        let fetcher = HttpFetcher::new().unwrap();
        assert_eq!(fetcher.user_agent(), BROWSER_USER_AGENT);
    }

    #[tokio::test]
    async fn test_fetch_truncates_to_max_chars() {
        let server = MockServer::start().await;
        let body = "ä".repeat(10_000);
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let page = fetcher.fetch(&server.uri(), TIMEOUT, 1000).await.unwrap();

        assert_eq!(page.body.chars().count(), 1000);
        assert!(page.body.chars().all(|c| c == 'ä'));
        assert_eq!(page.truncated_at, Some(1000));
    }

    #[tokio::test]
    async fn test_fetch_body_exactly_at_byte_budget_is_not_truncated() {
        let server = MockServer::start().await;
        // 1000 four-byte characters fill the byte budget with nothing left over
        let body = "😀".repeat(1000);
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body.clone()))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let page = fetcher.fetch(&server.uri(), TIMEOUT, 1000).await.unwrap();

        assert_eq!(page.body, body);
        assert_eq!(page.truncated_at, None);
    }

    #[tokio::test]
    async fn test_fetch_one_char_past_byte_budget_is_truncated() {
        let server = MockServer::start().await;
        let body = format!("{}x", "😀".repeat(1000));
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let page = fetcher.fetch(&server.uri(), TIMEOUT, 1000).await.unwrap();

        assert_eq!(page.body.chars().count(), 1000);
        assert_eq!(page.truncated_at, Some(1000));
    }

    #[tokio::test]
    async fn test_fetch_non_2xx_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher.fetch(&server.uri(), TIMEOUT, 3000).await.unwrap_err();

        assert_eq!(err.kind, NetworkErrorKind::HttpError);
        assert_eq!(err.status, Some(404));
        assert_eq!(err.detail, "HTTP 404 Not Found");
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("slow")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher
            .fetch(&server.uri(), Duration::from_millis(50), 3000)
            .await
            .unwrap_err();

        assert_eq!(err.kind, NetworkErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher
            .fetch("http://127.0.0.1:9/", TIMEOUT, 3000)
            .await
            .unwrap_err();

        assert_eq!(err.kind, NetworkErrorKind::ConnectionError);
    }

    #[tokio::test]
    async fn test_fetch_unparsable_url_is_request_error() {
        // Passes validation but is not a URL
        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher
            .fetch("http://exa mple.com", TIMEOUT, 3000)
            .await
            .unwrap_err();

        assert_eq!(err.kind, NetworkErrorKind::Request);
    }
}
