//! In-process fast retry
//!
//! A failed run may be retried a few times within the same process, with the
//! delays the retry policy hands out. Once the budget is spent, or the failure
//! cannot be helped by retrying, the work waits for the next scheduled wake.

use super::orchestrator::{wait_for_cancel, SyncOrchestrator};
use super::summary::{SyncOutcome, SyncSummary};
use super::trigger::SyncTrigger;
use crate::core::retry::RetryDecision;
use crate::domain::Result;

/// Every run made by [`SyncOrchestrator::run_with_retry`]
#[derive(Debug, Clone, Default)]
pub struct RetryReport {
    /// Run summaries in the order they happened
    pub runs: Vec<SyncSummary>,

    /// Whether a stop request cut a retry delay short
    pub cancelled: bool,
}

impl RetryReport {
    /// The run that decided the final state
    pub fn last(&self) -> Option<&SyncSummary> {
        self.runs.last()
    }

    /// Whether the last run succeeded
    pub fn is_successful(&self) -> bool {
        self.last().is_some_and(SyncSummary::is_successful)
    }

    /// Runs after the first
    pub fn retries(&self) -> usize {
        self.runs.len().saturating_sub(1)
    }
}

impl SyncOrchestrator {
    /// Run a sync and keep fast-retrying while the policy allows it
    ///
    /// Never makes more than `1 + budget` runs. A stop request during a delay
    /// ends the loop without another attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if the state store fails.
    pub async fn run_with_retry(&self, trigger: SyncTrigger) -> Result<RetryReport> {
        let mut report = RetryReport::default();
        let mut cancel = self.cancel.clone();
        let max_runs = self.retry_policy().budget() as usize + 1;

        loop {
            let summary = self.run_sync(trigger).await?;
            let decision = match (summary.outcome, summary.retry) {
                (SyncOutcome::Failed, Some(decision)) => decision,
                _ => RetryDecision::Defer,
            };
            report.runs.push(summary);

            let RetryDecision::FastRetry(delay) = decision else {
                break;
            };
            if report.runs.len() >= max_runs {
                break;
            }

            tracing::info!(
                attempt = report.runs.len(),
                delay_seconds = delay.as_secs(),
                "Scheduling fast retry"
            );

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = wait_for_cancel(&mut cancel) => {
                    tracing::info!("Stop requested, abandoning fast retry");
                    report.cancelled = true;
                    break;
                }
            }
        }

        Ok(report)
    }
}
