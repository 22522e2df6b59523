//! The analysis state machine.
//!
//! One [`AnalysisPipeline`] runs at most one analysis at a time. `run`
//! claims the pipeline, spawns a worker task and returns immediately; the
//! worker reports progress and the terminal outcome over an event channel
//! that the foreground drains on its own task.

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::error::{FailureKind, FetchError, ModelError, RunError};
use crate::pipeline::format::format_result;
use crate::pipeline::prompts::build_prompt;
use crate::traits::{fetcher::Fetcher, model::ModelClient};
use crate::types::{AnalysisOutcome, AnalysisRequest, FetchedPage, PipelineEvent, PipelineState, RunId};

/// Sending half of the event channel.
pub type EventSender = mpsc::UnboundedSender<PipelineEvent>;

/// Receiving half of the event channel.
pub type EventReceiver = mpsc::UnboundedReceiver<PipelineEvent>;

/// Create the channel a pipeline reports on.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Phishing analysis pipeline.
///
/// # Example
///
/// ```rust,ignore
/// use phish_analyzer::{event_channel, AnalysisPipeline, HttpFetcher, PipelineConfig, PipelineEvent};
/// use ollama_client::OllamaClient;
///
/// let (tx, mut rx) = event_channel();
/// let pipeline = AnalysisPipeline::new(HttpFetcher::new()?, OllamaClient::from_env()?, PipelineConfig::default(), tx);
///
/// pipeline.run("https://example.com", "phishing-detector")?;
/// while let Some(event) = rx.recv().await {
///     if let PipelineEvent::Complete { outcome, .. } = event {
///         println!("{:?}", outcome);
///         break;
///     }
/// }
/// ```
pub struct AnalysisPipeline<F, M> {
    fetcher: Arc<F>,
    model: Arc<M>,
    config: PipelineConfig,
    /// Written only by the running worker, except for the claim in `run`
    state: Arc<AtomicU8>,
    events: EventSender,
}

impl<F, M> AnalysisPipeline<F, M>
where
    F: Fetcher + 'static,
    M: ModelClient + 'static,
{
    /// Create a new pipeline reporting on `events`.
    pub fn new(fetcher: F, model: M, config: PipelineConfig, events: EventSender) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            model: Arc::new(model),
            config,
            state: Arc::new(AtomicU8::new(PipelineState::Idle as u8)),
            events,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Current stage of the latest run.
    pub fn state(&self) -> PipelineState {
        PipelineState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Whether a run is in flight.
    ///
    /// The terminal state is stored just before the run's `Complete` event
    /// is sent, so a run started as soon as this turns false may share the
    /// channel with the tail of the previous one. Match events by `run_id`.
    pub fn is_busy(&self) -> bool {
        !self.state().is_settled()
    }

    /// Start an analysis of `url` with `model`.
    ///
    /// Returns immediately. Only a busy pipeline or invalid input is
    /// reported here, before any event is sent; everything else arrives as
    /// the run's `Complete` event. Must be called from within a Tokio
    /// runtime.
    ///
    /// Every event carries the returned handle's `run_id`. Consumers that
    /// start runs back to back should match on it rather than on arrival
    /// order.
    pub fn run(&self, url: &str, model: &str) -> Result<RunHandle, RunError> {
        let current = self.state();
        if !current.is_settled() {
            debug!(state = %current, "Rejecting run, analysis in progress");
            return Err(RunError::Busy);
        }

        let request = AnalysisRequest::new(url, model)?;

        // Another caller may have claimed the pipeline since the check above
        self.state
            .compare_exchange(
                current as u8,
                PipelineState::Validating as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| RunError::Busy)?;

        let run_id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let span = info_span!(
            "analysis",
            run_id = %run_id,
            url = %request.url(),
            model = %request.model()
        );

        let worker = Worker {
            run_id,
            request,
            started_at: Utc::now(),
            fetcher: Arc::clone(&self.fetcher),
            model: Arc::clone(&self.model),
            config: self.config.clone(),
            state: StageCell::new(Arc::clone(&self.state)),
            events: self.events.clone(),
            cancel: cancel.clone(),
        };
        let join = tokio::spawn(worker.run().instrument(span));

        Ok(RunHandle {
            run_id,
            cancel,
            join,
        })
    }
}

/// Handle to a started run.
///
/// Dropping the handle does not cancel the run.
#[derive(Debug)]
pub struct RunHandle {
    run_id: RunId,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl RunHandle {
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Ask the worker to stop. The run still ends with a `Complete` event.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this run, for wiring into signal handlers.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait until the worker has sent its `Complete` event and exited.
    pub async fn wait(self) {
        if let Err(e) = self.join.await {
            warn!(run_id = %self.run_id, error = %e, "Analysis worker did not finish cleanly");
        }
    }
}

/// Shared stage cell plus whether the worker has stored a terminal state.
struct StageCell {
    state: Arc<AtomicU8>,
    settled: bool,
}

impl StageCell {
    fn new(state: Arc<AtomicU8>) -> Self {
        Self {
            state,
            settled: false,
        }
    }

    fn enter(&self, state: PipelineState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn settle(&mut self, state: PipelineState) {
        self.enter(state);
        self.settled = true;
    }

    fn current(&self) -> PipelineState {
        PipelineState::from_u8(self.state.load(Ordering::Acquire))
    }
}

/// Why a stage stopped the run.
struct Halt {
    kind: FailureKind,
    detail: String,
    at: PipelineState,
}

impl Halt {
    fn cancelled(at: PipelineState) -> Self {
        Self {
            kind: FailureKind::Cancelled,
            detail: "analysis cancelled".to_string(),
            at,
        }
    }

    fn into_outcome(self) -> AnalysisOutcome {
        AnalysisOutcome::Failure {
            kind: self.kind,
            detail: self.detail,
            failed_at: self.at,
        }
    }
}

/// Result of a retried suspension point.
enum Attempted<T, E> {
    Done(T),
    Failed(E),
    Cancelled,
}

struct Worker<F, M> {
    run_id: RunId,
    request: AnalysisRequest,
    started_at: DateTime<Utc>,
    fetcher: Arc<F>,
    model: Arc<M>,
    config: PipelineConfig,
    state: StageCell,
    events: EventSender,
    cancel: CancellationToken,
}

impl<F, M> Worker<F, M>
where
    F: Fetcher + 'static,
    M: ModelClient + 'static,
{
    async fn run(mut self) {
        let start = Instant::now();
        info!(
            fetcher = self.fetcher.name(),
            model_client = self.model.name(),
            "Analysis started"
        );

        let outcome = match self.execute().await {
            Ok(outcome) => outcome,
            Err(halt) => halt.into_outcome(),
        };

        match &outcome {
            AnalysisOutcome::Success { formatted, .. } => info!(
                risk_level = %formatted.risk_level(),
                keyword_matches = formatted.matches.len(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Analysis completed"
            ),
            AnalysisOutcome::Failure {
                kind,
                detail,
                failed_at,
            } => warn!(
                kind = %kind,
                detail = %detail,
                failed_at = %failed_at,
                duration_ms = start.elapsed().as_millis() as u64,
                "Analysis failed"
            ),
        }

        // Settle first so the collaborator may start a new run on Complete
        self.state.settle(outcome.state());
        let event = PipelineEvent::Complete {
            run_id: self.run_id,
            request: self.request.clone(),
            outcome,
            started_at: self.started_at,
            finished_at: Utc::now(),
        };
        self.send(event);
    }

    async fn execute(&self) -> Result<AnalysisOutcome, Halt> {
        // The request was validated before the worker existed
        self.enter(PipelineState::Validating);
        if self.cancel.is_cancelled() {
            return Err(Halt::cancelled(PipelineState::Validating));
        }

        self.enter(PipelineState::Fetching);
        let page = self.fetch().await?;

        self.enter(PipelineState::Prompting);
        let prompt = build_prompt(self.request.url(), &page.body);
        debug!(prompt_chars = prompt.chars().count(), "Prompt built");

        self.enter(PipelineState::Invoking);
        let raw_text = self.invoke(&prompt).await?;

        self.enter(PipelineState::Formatting);
        let formatted = format_result(&raw_text);

        Ok(AnalysisOutcome::Success {
            raw_text,
            formatted,
        })
    }

    async fn fetch(&self) -> Result<FetchedPage, Halt> {
        let url = self.request.url();
        let timeout = self.config.fetch_timeout();
        let max_chars = self.config.max_chars;

        let attempted = self
            .with_retry(
                "fetch",
                || self.fetcher.fetch(url, timeout, max_chars),
                FetchError::is_retryable,
            )
            .await;

        match attempted {
            Attempted::Done(page) => {
                debug!(
                    chars = page.body.chars().count(),
                    truncated = page.is_truncated(),
                    "Page content captured"
                );
                Ok(page)
            }
            Attempted::Failed(e) => Err(Halt {
                kind: FailureKind::from(&e),
                detail: e.detail,
                at: PipelineState::Fetching,
            }),
            Attempted::Cancelled => Err(Halt::cancelled(PipelineState::Fetching)),
        }
    }

    async fn invoke(&self, prompt: &str) -> Result<String, Halt> {
        let model = self.request.model();
        let timeout = self.config.model_timeout();

        let attempted = self
            .with_retry(
                "generate",
                || self.model.generate(model, prompt, timeout),
                ModelError::is_retryable,
            )
            .await;

        match attempted {
            Attempted::Done(text) => Ok(text),
            Attempted::Failed(e) => Err(Halt {
                kind: FailureKind::from(&e),
                detail: e.detail,
                at: PipelineState::Invoking,
            }),
            Attempted::Cancelled => Err(Halt::cancelled(PipelineState::Invoking)),
        }
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, runs
    /// out of attempts, or the run is cancelled.
    async fn with_retry<T, E, Op, Fut>(
        &self,
        operation: &'static str,
        mut op: Op,
        retryable: fn(&E) -> bool,
    ) -> Attempted<T, E>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let policy = &self.config.retry;
        let max_attempts = policy.max_attempts();
        let mut attempt = 1;

        loop {
            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Attempted::Cancelled,
                result = op() => result,
            };

            match result {
                Ok(value) => return Attempted::Done(value),
                Err(e) if attempt < max_attempts && retryable(&e) => {
                    let delay = policy.delay_for(attempt);
                    warn!(
                        operation,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying after failure"
                    );
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return Attempted::Cancelled,
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
                Err(e) => return Attempted::Failed(e),
            }
        }
    }

    /// Record `state` and announce it.
    fn enter(&self, state: PipelineState) {
        self.state.enter(state);
        debug!(state = %state, "Entering stage");
        self.send(PipelineEvent::Status {
            run_id: self.run_id,
            state,
            message: state.status_text().to_string(),
        });
    }

    fn send(&self, event: PipelineEvent) {
        if self.events.send(event).is_err() {
            debug!("Event receiver dropped, continuing without notifications");
        }
    }
}

/// A worker dropped before settling has panicked or been aborted. Store
/// `Failed` and still send the run's single `Complete` so the pipeline is
/// reusable and the foreground stops waiting.
impl<F, M> Drop for Worker<F, M> {
    fn drop(&mut self) {
        if self.state.settled {
            return;
        }

        let failed_at = self.state.current();
        self.state.settle(PipelineState::Failed);
        error!(
            run_id = %self.run_id,
            failed_at = %failed_at,
            "Analysis worker stopped before completing"
        );

        let event = PipelineEvent::Complete {
            run_id: self.run_id,
            request: self.request.clone(),
            outcome: AnalysisOutcome::Failure {
                kind: FailureKind::Aborted,
                detail: "analysis stopped unexpectedly".to_string(),
                failed_at,
            },
            started_at: self.started_at,
            finished_at: Utc::now(),
        };
        let _ = self.events.send(event);
    }
}
