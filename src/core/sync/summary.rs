//! Sync run summary and reporting

use super::trigger::SyncTrigger;
use crate::core::retry::RetryDecision;
use crate::domain::FailureKind;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Every chunk was confirmed, or there was nothing to send
    Success,
    /// At least one chunk failed, or the run aborted
    Failed,
    /// Another run holds a fresh in-progress marker
    Skipped,
    /// Tracking is switched off
    Disabled,
}

impl std::fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SyncOutcome::Success => "success",
            SyncOutcome::Failed => "failed",
            SyncOutcome::Skipped => "skipped",
            SyncOutcome::Disabled => "disabled",
        };
        f.write_str(s)
    }
}

/// Summary of one `run_sync` call
#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    /// Correlates log lines of this run
    pub run_id: Uuid,

    /// What invoked the run
    pub trigger: SyncTrigger,

    /// Final outcome
    pub outcome: SyncOutcome,

    /// Valid day entries submitted to the gateway
    pub days_attempted: usize,

    /// Day entries confirmed by the gateway
    pub days_succeeded: usize,

    /// Gateway calls made
    pub chunks_attempted: usize,

    /// Gateway calls that came back clean
    pub chunks_succeeded: usize,

    /// Records the gateway created
    pub created: usize,

    /// Records the gateway overwrote
    pub updated: usize,

    /// Entries dropped by validation
    pub dropped_invalid: usize,

    /// Kind of the failure that decided the outcome
    pub failure_kind: Option<FailureKind>,

    /// Error messages collected during the run
    pub errors: Vec<String>,

    /// What the retry policy advises, for failed runs
    pub retry: Option<RetryDecision>,

    /// Whether cancellation or the deadline cut the run short
    pub interrupted: bool,

    /// Sync point after the run
    pub last_sync_timestamp: Option<DateTime<Utc>>,

    /// Days queued for retry after the run
    pub pending_days: usize,

    /// Wall time of the run
    #[serde(serialize_with = "serialize_millis")]
    pub duration: Duration,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

impl SyncSummary {
    /// Create an empty summary for a run that is about to start
    pub fn new(run_id: Uuid, trigger: SyncTrigger) -> Self {
        Self {
            run_id,
            trigger,
            outcome: SyncOutcome::Success,
            days_attempted: 0,
            days_succeeded: 0,
            chunks_attempted: 0,
            chunks_succeeded: 0,
            created: 0,
            updated: 0,
            dropped_invalid: 0,
            failure_kind: None,
            errors: Vec::new(),
            retry: None,
            interrupted: false,
            last_sync_timestamp: None,
            pending_days: 0,
            duration: Duration::ZERO,
        }
    }

    /// Summary for a run that never started
    pub fn not_run(run_id: Uuid, trigger: SyncTrigger, outcome: SyncOutcome) -> Self {
        Self {
            outcome,
            ..Self::new(run_id, trigger)
        }
    }

    /// Remember the first failure kind; later ones do not override it
    pub fn record_failure(&mut self, kind: FailureKind, message: impl Into<String>) {
        if self.failure_kind.is_none() {
            self.failure_kind = Some(kind);
        }
        self.errors.push(message.into());
    }

    /// Whether the run counts as successful
    pub fn is_successful(&self) -> bool {
        self.outcome == SyncOutcome::Success
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            run_id = %self.run_id,
            trigger = %self.trigger,
            outcome = %self.outcome,
            days_attempted = self.days_attempted,
            days_succeeded = self.days_succeeded,
            chunks_attempted = self.chunks_attempted,
            chunks_succeeded = self.chunks_succeeded,
            created = self.created,
            updated = self.updated,
            dropped_invalid = self.dropped_invalid,
            pending_days = self.pending_days,
            duration_ms = self.duration.as_millis(),
            "Sync run finished"
        );

        if let Some(kind) = self.failure_kind {
            tracing::warn!(
                run_id = %self.run_id,
                failure_kind = %kind,
                interrupted = self.interrupted,
                error_count = self.errors.len(),
                "Sync run had failures"
            );
            for error in self.errors.iter().take(10) {
                tracing::warn!(run_id = %self.run_id, error = %error, "Sync error");
            }
        }
    }
}
