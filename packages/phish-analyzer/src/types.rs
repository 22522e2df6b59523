//! Data model shared by the pipeline stages and its collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FailureKind, FetchError, ValidationError};
use crate::pipeline::format::FormattedResult;
use crate::validate::{validate_model_name, validate_url};

/// Identifier of one pipeline run.
pub type RunId = Uuid;

/// A validated (url, model) pair.
///
/// [`AnalysisRequest::new`] is the only constructor, so a request that
/// reaches a worker has already passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRequest {
    url: String,
    model: String,
}

impl AnalysisRequest {
    /// Validate and build a request.
    ///
    /// The URL is trimmed first. The model name is checked before the URL.
    pub fn new(url: impl AsRef<str>, model: impl AsRef<str>) -> Result<Self, ValidationError> {
        let url = url.as_ref().trim();
        let model = model.as_ref().trim();

        validate_model_name(model)?;
        validate_url(url)?;

        Ok(Self {
            url: url.to_string(),
            model: model.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Page content as handed to the prompt stage.
///
/// `body` never exceeds the configured character budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchedPage {
    /// First `max_chars` characters of the body
    pub body: String,

    /// `Some(max_chars)` when the body was cut, `None` when it fit
    pub truncated_at: Option<usize>,

    /// HTTP status of the final response
    pub status: u16,

    /// URL after redirects
    pub final_url: String,

    /// `Content-Type` header, if any
    pub content_type: Option<String>,
}

impl FetchedPage {
    /// Build a page from a full body, applying the character budget.
    pub fn from_body(url: impl Into<String>, body: &str, max_chars: usize) -> Self {
        let (body, truncated_at) = truncate_chars(body, max_chars);
        Self {
            body: body.to_string(),
            truncated_at,
            status: 200,
            final_url: url.into(),
            content_type: None,
        }
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated_at.is_some()
    }
}

/// Keep the first `max_chars` characters of `text`.
///
/// Returns the kept slice and `Some(max_chars)` if anything was dropped.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, Option<usize>) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&text[..byte_idx], Some(max_chars)),
        None => (text, None),
    }
}

/// Outcome of the fetch stage.
pub type FetchResult = Result<FetchedPage, FetchError>;

/// Stages of one run.
///
/// A run moves strictly forward through
/// `Validating → Fetching → Prompting → Invoking → Formatting → Done`,
/// or jumps to `Failed` from `Validating`, `Fetching` or `Invoking`
/// (or from any stage when cancelled).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PipelineState {
    Idle = 0,
    Validating = 1,
    Fetching = 2,
    Prompting = 3,
    Invoking = 4,
    Formatting = 5,
    Done = 6,
    Failed = 7,
}

impl PipelineState {
    /// Whether a new run may start from this state.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Idle | Self::Done | Self::Failed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Operator-facing status line.
    pub fn status_text(&self) -> &'static str {
        match self {
            Self::Idle => "READY",
            Self::Validating => "VALIDATING URL...",
            Self::Fetching => "FETCHING WEBSITE CONTENT...",
            Self::Prompting => "PREPARING ANALYSIS PROMPT...",
            Self::Invoking => "ANALYZING WITH AI MODEL...",
            Self::Formatting => "FORMATTING RESULTS...",
            Self::Done => "ANALYSIS COMPLETE",
            Self::Failed => "ANALYSIS FAILED",
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Validating,
            2 => Self::Fetching,
            3 => Self::Prompting,
            4 => Self::Invoking,
            5 => Self::Formatting,
            6 => Self::Done,
            7 => Self::Failed,
            _ => Self::Idle,
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// Terminal result of a run. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Success {
        /// Model output exactly as received
        raw_text: String,
        formatted: FormattedResult,
    },
    Failure {
        kind: FailureKind,
        detail: String,
        /// Stage the run was in when it stopped
        failed_at: PipelineState,
    },
}

impl AnalysisOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn raw_text(&self) -> Option<&str> {
        match self {
            Self::Success { raw_text, .. } => Some(raw_text),
            Self::Failure { .. } => None,
        }
    }

    pub fn formatted(&self) -> Option<&FormattedResult> {
        match self {
            Self::Success { formatted, .. } => Some(formatted),
            Self::Failure { .. } => None,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }

    /// Final state matching this outcome.
    pub fn state(&self) -> PipelineState {
        if self.is_success() {
            PipelineState::Done
        } else {
            PipelineState::Failed
        }
    }
}

/// Message from a run's worker to the foreground.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// Sent on entering each non-terminal stage, before the stage runs.
    Status {
        run_id: RunId,
        state: PipelineState,
        message: String,
    },

    /// Sent exactly once per run, after the terminal state is stored.
    Complete {
        run_id: RunId,
        request: AnalysisRequest,
        outcome: AnalysisOutcome,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    },
}

impl PipelineEvent {
    pub fn run_id(&self) -> RunId {
        match self {
            Self::Status { run_id, .. } | Self::Complete { run_id, .. } => *run_id,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }
}
