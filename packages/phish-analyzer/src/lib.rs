//! Phishing URL Analysis Library
//!
//! Fetches a suspect web page, asks a locally hosted language model for a
//! phishing assessment, and tags the verdict keywords in the answer.
//!
//! # Design Philosophy
//!
//! - One run at a time per pipeline, never blocking the caller
//! - Progress and outcome delivered as messages, not callbacks
//! - Page content is untrusted data, fenced off inside the prompt
//! - Single-shot by default; retry and cancellation are opt-in
//!
//! # Usage
//!
//! ```rust,ignore
//! use phish_analyzer::testing::{MockFetcher, MockModel};
//! use phish_analyzer::{event_channel, AnalysisPipeline, PipelineConfig, PipelineEvent};
//!
//! let (tx, mut rx) = event_channel();
//! let pipeline = AnalysisPipeline::new(MockFetcher::new(), MockModel::new(), PipelineConfig::default(), tx);
//!
//! let handle = pipeline.run("https://example.com", "phishing-detector")?;
//! while let Some(event) = rx.recv().await {
//!     match event {
//!         PipelineEvent::Status { message, .. } => println!("{}", message),
//!         PipelineEvent::Complete { outcome, .. } => {
//!             println!("{:?}", outcome);
//!             break;
//!         }
//!     }
//! }
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Seams for the network and the model (Fetcher, ModelClient)
//! - [`fetchers`] - HTTP page fetcher
//! - [`pipeline`] - State machine, prompt builder, result formatter
//! - [`validate`] - Input checks applied before any work starts
//! - [`testing`] - Mock implementations for testing

pub mod config;
pub mod error;
pub mod fetchers;
pub mod pipeline;
pub mod testing;
pub mod traits;
pub mod types;
pub mod validate;

#[cfg(feature = "ollama")]
mod ai;

// Re-export core types at crate root
pub use config::{PipelineConfig, RetryPolicy, BROWSER_USER_AGENT};
pub use error::{
    ConfigError, FailureKind, FetchError, ModelError, ModelErrorKind, NetworkErrorKind, RunError,
    ValidationError,
};
pub use fetchers::HttpFetcher;
pub use pipeline::{
    build_prompt, event_channel, format_result, AnalysisPipeline, EventReceiver, EventSender,
    FormattedResult, RiskLevel, RiskMatch, RunHandle,
};
pub use traits::{fetcher::Fetcher, model::ModelClient};
pub use types::{
    AnalysisOutcome, AnalysisRequest, FetchResult, FetchedPage, PipelineEvent, PipelineState,
    RunId,
};
pub use validate::{validate_model_name, validate_url};

#[cfg(feature = "ollama")]
pub use ollama_client::OllamaClient;
