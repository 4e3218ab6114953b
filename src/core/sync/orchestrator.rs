//! Sync orchestrator - decision logic for one background wake
//!
//! A run reads the persisted state, plans the window, pulls day aggregates from
//! the health data provider, pushes them to the gateway in bounded chunks and
//! writes the outcome back. It behaves the same whichever trigger invoked it.
//!
//! Invariants kept by every run:
//! - the sync point only moves forward, and only over a contiguous prefix of
//!   confirmed chunks
//! - a day that was sent but not confirmed ends up in `pending_days`
//! - the in-progress marker is cleared on every exit path that reaches the
//!   store, including cancellation and deadline expiry

use super::summary::{SyncOutcome, SyncSummary};
use super::trigger::SyncTrigger;
use super::window::{chunk_entries, prepare_entries, SyncWindow};
use crate::adapters::gateway::{create_gateway, SyncGateway};
use crate::adapters::health::{create_health_provider, HealthDataProvider};
use crate::adapters::state::create_state_storage;
use crate::config::StepSyncConfig;
use crate::core::clock::{Clock, SystemClock};
use crate::core::retry::RetryPolicy;
use crate::core::state::{Acquire, StateManager, SyncState};
use crate::domain::ids::SourceId;
use crate::domain::{FailureKind, Result, StepDayEntry, SyncError, MAX_BATCH_ENTRIES};
use crate::{log_chunk_result, log_retry_decision, log_sync_start};
use chrono::NaiveDate;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Execution limits and windowing for a run
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSettings {
    /// Health backend to read
    pub source: SourceId,

    /// Days requested on a cold start
    pub backfill_days: u32,

    /// Entries per gateway call
    pub max_batch_entries: usize,

    /// Outer deadline for a whole run
    pub run_deadline: Duration,

    /// Bound on each provider or gateway call
    pub request_timeout: Duration,

    /// Age after which an in-progress marker is abandoned
    pub in_progress_timeout: chrono::Duration,
}

impl SyncSettings {
    /// Default limits for `source`
    pub fn new(source: SourceId) -> Self {
        Self {
            source,
            backfill_days: 30,
            max_batch_entries: MAX_BATCH_ENTRIES,
            run_deadline: Duration::from_secs(25),
            request_timeout: Duration::from_secs(15),
            in_progress_timeout: chrono::Duration::minutes(2),
        }
    }

    /// Limits from configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the tracking source is invalid.
    ///
    /// The run deadline is capped below the in-progress timeout.
    pub fn from_config(config: &StepSyncConfig) -> Result<Self> {
        let source = config
            .tracking
            .source_id()
            .map_err(|e| SyncError::Configuration(format!("tracking.source: {e}")))?;

        let in_progress_timeout = i64::try_from(config.sync.in_progress_timeout_seconds)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or_else(|| chrono::Duration::minutes(2));

        // A live run must finish before its marker can be taken over.
        let marker_secs = u64::try_from(in_progress_timeout.num_seconds()).unwrap_or(1);
        let deadline_secs = config
            .sync
            .run_deadline_seconds
            .min(marker_secs.saturating_sub(1))
            .max(1);

        Ok(Self {
            source,
            backfill_days: config.sync.backfill_days,
            max_batch_entries: config.sync.max_batch_entries.clamp(1, MAX_BATCH_ENTRIES),
            run_deadline: Duration::from_secs(deadline_secs),
            request_timeout: Duration::from_secs(config.gateway.timeout_seconds),
            in_progress_timeout,
        })
    }
}

/// Per-run bookkeeping for bounded calls
struct RunContext {
    run_id: Uuid,
    deadline: Instant,
    cancel: watch::Receiver<bool>,
}

/// Sync orchestrator
pub struct SyncOrchestrator {
    settings: SyncSettings,
    provider: Arc<dyn HealthDataProvider>,
    gateway: Arc<dyn SyncGateway>,
    state: Arc<StateManager>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
    enabled: watch::Receiver<bool>,
    pub(crate) cancel: watch::Receiver<bool>,
}

impl SyncOrchestrator {
    /// Create an orchestrator
    ///
    /// Tracking starts enabled and no cancellation signal is attached; see
    /// [`with_enablement`](Self::with_enablement) and
    /// [`with_cancellation`](Self::with_cancellation).
    pub fn new(
        settings: SyncSettings,
        provider: Arc<dyn HealthDataProvider>,
        gateway: Arc<dyn SyncGateway>,
        state: Arc<StateManager>,
    ) -> Self {
        let (_enabled_tx, enabled) = watch::channel(true);
        let (_cancel_tx, cancel) = watch::channel(false);

        Self {
            settings,
            provider,
            gateway,
            state,
            clock: Arc::new(SystemClock),
            retry: RetryPolicy::default(),
            enabled,
            cancel,
        }
    }

    /// Wire an orchestrator from configuration
    ///
    /// The state store, health provider and gateway are selected by `config`;
    /// a dry run keeps state in memory and talks to an in-memory gateway.
    /// `shutdown_signal` cancels in-flight work when it flips to `true`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be turned into adapters.
    pub async fn from_config(
        config: &StepSyncConfig,
        shutdown_signal: watch::Receiver<bool>,
    ) -> Result<Self> {
        let settings = SyncSettings::from_config(config)?;
        let storage = create_state_storage(config).await?;
        let state = Arc::new(StateManager::new_with_storage(storage));
        let provider = create_health_provider(&config.health);
        let gateway = create_gateway(config)?;

        tracing::debug!(
            provider = provider.name(),
            gateway = gateway.name(),
            state = %state.location(),
            "Sync orchestrator wired"
        );

        let (_tracking_tx, tracking) = watch::channel(config.tracking.enabled);

        Ok(Self::new(settings, provider, gateway, state)
            .with_retry_policy(RetryPolicy::from_config(&config.retry))
            .with_enablement(tracking)
            .with_cancellation(shutdown_signal))
    }

    /// Use `clock` instead of the wall clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use `retry` instead of the default fast-retry table
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Follow the tracking toggle owned by another component
    pub fn with_enablement(mut self, enabled: watch::Receiver<bool>) -> Self {
        self.enabled = enabled;
        self
    }

    /// Abort in-flight work when `cancel` flips to `true`
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// State manager shared with the staleness signal
    pub fn state_manager(&self) -> &Arc<StateManager> {
        &self.state
    }

    /// Active limits
    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Active retry policy
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Run one sync
    ///
    /// Returns [`SyncOutcome::Disabled`] without touching state when tracking is
    /// off, and [`SyncOutcome::Skipped`] when another run holds a fresh
    /// in-progress marker. Failures of the provider or gateway are recorded in
    /// the state and the summary, never returned as errors.
    ///
    /// # Errors
    ///
    /// Returns an error only when the state store itself cannot be read or
    /// written.
    pub async fn run_sync(&self, trigger: SyncTrigger) -> Result<SyncSummary> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("sync_run", run_id = %run_id, trigger = %trigger);
        self.run_once(run_id, trigger).instrument(span).await
    }

    async fn run_once(&self, run_id: Uuid, trigger: SyncTrigger) -> Result<SyncSummary> {
        let started = Instant::now();

        if !*self.enabled.borrow() {
            tracing::info!(run_id = %run_id, trigger = %trigger, "Tracking disabled, sync is a no-op");
            return Ok(SyncSummary::not_run(run_id, trigger, SyncOutcome::Disabled));
        }

        let now = self.clock.now();
        let mut state = match self
            .state
            .try_acquire(now, self.settings.in_progress_timeout)
            .await?
        {
            Acquire::Busy { since } => {
                tracing::info!(
                    run_id = %run_id,
                    trigger = %trigger,
                    in_progress_since = %since,
                    "Another sync is in flight, skipping"
                );
                let mut summary = SyncSummary::not_run(run_id, trigger, SyncOutcome::Skipped);
                summary.duration = started.elapsed();
                return Ok(summary);
            }
            Acquire::Acquired { state, .. } => state,
        };

        let mut summary = SyncSummary::new(run_id, trigger);
        let mut run = RunContext {
            run_id,
            deadline: started + self.settings.run_deadline,
            cancel: self.cancel.clone(),
        };

        let result = self.execute(&mut state, &mut summary, &mut run).await;
        self.finish(&mut state, &mut summary, result);

        let released = self.state.release(&mut state).await;

        summary.last_sync_timestamp = state.last_sync_timestamp;
        summary.pending_days = state.pending_days.len();
        summary.duration = started.elapsed();
        summary.log_summary();

        if let Err(e) = released {
            tracing::error!(run_id = %run_id, error = %e, "Failed to persist final sync state");
            return Err(e);
        }

        Ok(summary)
    }

    async fn execute(
        &self,
        state: &mut SyncState,
        summary: &mut SyncSummary,
        run: &mut RunContext,
    ) -> Result<()> {
        let today = self.clock.today();
        let window = SyncWindow::plan(state, today, self.settings.backfill_days);
        log_sync_start!(run.run_id, summary.trigger, window.day_count());

        let mut fetched = Vec::new();
        for (start, end) in window.fetch_ranges() {
            let source = &self.settings.source;
            let entries = self
                .bounded(run, "health provider", self.provider.get_step_data(start, end, source))
                .await?;
            tracing::debug!(run_id = %run.run_id, %start, %end, entries = entries.len(), "Fetched step data");
            fetched.extend(entries);
        }

        let prepared = prepare_entries(fetched, today);
        summary.dropped_invalid = prepared.dropped_invalid;
        summary.errors.extend(prepared.drop_reasons);

        // Every queued day up to today was just requested again. Days that come
        // back in a failed chunk are re-queued below.
        let requested: Vec<NaiveDate> = state
            .pending_days
            .iter()
            .copied()
            .filter(|d| *d <= today)
            .collect();
        state.clear_pending(&requested);

        if !window.future_pending.is_empty() {
            tracing::warn!(
                run_id = %run.run_id,
                days = window.future_pending.len(),
                %today,
                "Dropping queued days later than today"
            );
            state.clear_pending(&window.future_pending);
        }

        if prepared.entries.is_empty() {
            tracing::info!(run_id = %run.run_id, "No new step data, nothing to send");
            state.advance_to(self.clock.now());
            return Ok(());
        }

        let chunks = chunk_entries(prepared.entries, self.settings.max_batch_entries);
        let total = chunks.len();
        let mut contiguous = true;

        for (index, chunk) in chunks.iter().enumerate() {
            let days: Vec<NaiveDate> = chunk.iter().map(|e| e.date).collect();
            summary.chunks_attempted += 1;
            summary.days_attempted += chunk.len();

            match self
                .bounded(run, "sync gateway", self.gateway.sync_batch(chunk))
                .await
            {
                Ok(result) if result.is_clean_for(chunk.len()) => {
                    summary.chunks_succeeded += 1;
                    summary.days_succeeded += chunk.len();
                    summary.created += result.created;
                    summary.updated += result.updated;
                    state.clear_pending(&days);
                    if contiguous {
                        if let Some(latest) = days.iter().max() {
                            state.advance_to_day(*latest, self.clock.now());
                        }
                    }
                    log_chunk_result!(run.run_id, index + 1, total, chunk.len(), true);
                }
                Ok(result) => {
                    contiguous = false;
                    state.add_pending(days);
                    summary.record_failure(
                        FailureKind::PartialBatch,
                        format!(
                            "chunk {}/{}: gateway confirmed {} of {} entries with {} errors",
                            index + 1,
                            total,
                            result.applied(),
                            chunk.len(),
                            result.errors.len()
                        ),
                    );
                    log_chunk_result!(run.run_id, index + 1, total, chunk.len(), false);
                }
                Err(e) if e.is_interruption() => {
                    requeue(state, &chunks[index..]);
                    tracing::warn!(
                        run_id = %run.run_id,
                        chunk = index + 1,
                        chunks = total,
                        error = %e,
                        "Sync interrupted, remaining days queued"
                    );
                    return Err(e);
                }
                Err(e) => {
                    contiguous = false;
                    state.add_pending(days);
                    summary.record_failure(e.kind(), format!("chunk {}/{}: {e}", index + 1, total));
                    log_chunk_result!(run.run_id, index + 1, total, chunk.len(), false);
                }
            }

            if let Err(e) = self.state.checkpoint(state).await {
                requeue(state, &chunks[index + 1..]);
                return Err(e);
            }
        }

        Ok(())
    }

    fn finish(&self, state: &mut SyncState, summary: &mut SyncSummary, result: Result<()>) {
        match result {
            Ok(()) if summary.failure_kind.is_none() => {
                state.mark_succeeded();
                summary.outcome = SyncOutcome::Success;
            }
            Ok(()) => {
                let kind = summary.failure_kind.unwrap_or(FailureKind::Transient);
                let message = summary
                    .errors
                    .last()
                    .cloned()
                    .unwrap_or_else(|| "sync failed".to_string());
                state.mark_failed(kind, message);
                summary.outcome = SyncOutcome::Failed;
            }
            Err(e) => {
                let kind = e.kind();
                if kind == FailureKind::Permission {
                    tracing::warn!(
                        run_id = %summary.run_id,
                        error = %e,
                        "Health data access revoked, deferring until access is granted again"
                    );
                }
                summary.interrupted = e.is_interruption();
                summary.failure_kind = Some(kind);
                summary.errors.push(e.to_string());
                state.mark_failed(kind, e.to_string());
                summary.outcome = SyncOutcome::Failed;
            }
        }

        if summary.outcome == SyncOutcome::Failed {
            let decision = self.retry.decide(state.failed_attempts, state.last_failure_kind);
            log_retry_decision!(state.failed_attempts, decision);
            summary.retry = Some(decision);
        }
    }

    /// Await `call`, bounded by the request timeout, the run deadline and the
    /// cancellation signal
    async fn bounded<T, F>(&self, run: &mut RunContext, what: &str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if *run.cancel.borrow() {
            return Err(SyncError::Cancelled(format!("stop requested before {what} call")));
        }

        let deadline_secs = self.settings.run_deadline.as_secs();
        let remaining = run.deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(SyncError::DeadlineExceeded(deadline_secs));
        }

        let limit = remaining.min(self.settings.request_timeout);
        let deadline_bound = remaining <= self.settings.request_timeout;

        tokio::select! {
            outcome = tokio::time::timeout(limit, call) => match outcome {
                Ok(inner) => inner,
                Err(_) if deadline_bound => Err(SyncError::DeadlineExceeded(deadline_secs)),
                Err(_) => Err(SyncError::Timeout(format!(
                    "{what} did not answer within {}s",
                    limit.as_secs()
                ))),
            },
            () = wait_for_cancel(&mut run.cancel) => {
                Err(SyncError::Cancelled(format!("stop requested during {what} call")))
            }
        }
    }
}

/// Queue every day of `chunks` for retry
fn requeue(state: &mut SyncState, chunks: &[Vec<StepDayEntry>]) {
    for chunk in chunks {
        state.add_pending(chunk.iter().map(|e| e.date));
    }
}

/// Resolve once the cancellation flag is set; never resolve if the sender is gone
pub(crate) async fn wait_for_cancel(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
