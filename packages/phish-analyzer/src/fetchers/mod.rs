//! Fetcher implementations.
//!
//! - `HttpFetcher` - single GET over reqwest
//! - `MockFetcher` (in [`crate::testing`]) - for tests

mod http;

pub use http::HttpFetcher;

// Re-export from traits for convenience
pub use crate::traits::fetcher::Fetcher;
