//! Analysis pipeline - the core of the library.
//!
//! The pipeline runs each request through:
//! - Validation (inline, before the worker starts)
//! - Page fetch with a bounded body
//! - Prompt construction around the untrusted excerpt
//! - Model invocation
//! - Risk keyword tagging of the model output

pub mod analysis;
pub mod format;
pub mod prompts;

pub use analysis::{event_channel, AnalysisPipeline, EventReceiver, EventSender, RunHandle};
pub use format::{escape_markup, format_result, FormattedResult, RiskLevel, RiskMatch};
pub use prompts::{build_prompt, defuse_markers, ANALYZE_PROMPT, CONTENT_END, CONTENT_START};
