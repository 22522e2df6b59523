//! Fetcher trait for bounded page retrieval.

use std::time::Duration;

use async_trait::async_trait;

use crate::types::FetchResult;

/// Retrieves the content of a single page.
///
/// Implementations make exactly one attempt and must honour both bounds:
/// - `timeout` covers connecting, the response head and the body
/// - the returned body holds at most `max_chars` characters
///
/// Failures are normalized into [`crate::error::FetchError`] kinds;
/// truncation is not a failure.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` with a GET request.
    async fn fetch(&self, url: &str, timeout: Duration, max_chars: usize) -> FetchResult;

    /// Short name for logs.
    fn name(&self) -> &str;
}
