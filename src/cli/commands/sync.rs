//! Sync command implementation
//!
//! This module implements the `sync` command, which runs the orchestrator once
//! (or with in-process fast retries) the way a platform wake would.

use super::load_or_report;
use crate::core::sync::{RetryReport, SyncOrchestrator, SyncOutcome, SyncSummary, SyncTrigger};
use clap::Args;
use tokio::sync::watch;

/// Arguments for the sync command
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// What invoked the run (scheduled, manual, foreground)
    #[arg(long, default_value = "manual")]
    pub trigger: SyncTrigger,

    /// Fast-retry a failed run in-process
    #[arg(long)]
    pub retry: bool,

    /// Dry run mode - send batches to an in-memory gateway, keep state in memory
    #[arg(long)]
    pub dry_run: bool,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    /// Execute the sync command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(trigger = %self.trigger, "Starting sync command");

        let mut config = match load_or_report(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }

        if config.application.dry_run && !self.json {
            println!("🔍 DRY RUN MODE - nothing will be sent or persisted");
            println!();
        }

        let orchestrator = match SyncOrchestrator::from_config(&config, shutdown_signal).await {
            Ok(o) => o,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create sync orchestrator");
                eprintln!("Failed to initialize sync: {e}");
                return Ok(2);
            }
        };

        if self.trigger == SyncTrigger::ForegroundStale {
            let threshold = chrono::Duration::hours(
                i64::try_from(config.sync.stale_after_hours).unwrap_or(i64::MAX / 3600),
            );
            let report = orchestrator
                .state_manager()
                .staleness(chrono::Utc::now(), threshold)
                .await?;
            if !report.should_sync_on_foreground() {
                tracing::info!(age = %report.describe_age(), "Last sync is fresh, nothing to do");
                if !self.json {
                    println!("✅ Last sync {}, not stale", report.describe_age());
                }
                return Ok(0);
            }
        }

        let report = if self.retry {
            orchestrator.run_with_retry(self.trigger).await
        } else {
            orchestrator
                .run_sync(self.trigger)
                .await
                .map(|summary| RetryReport {
                    runs: vec![summary],
                    cancelled: false,
                })
        };

        let report = match report {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, "Sync failed");
                eprintln!("Sync failed: {e}");
                return Ok(5);
            }
        };

        let Some(last) = report.last() else {
            return Ok(5);
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report.runs)?);
        } else {
            for (attempt, summary) in report.runs.iter().enumerate() {
                print_summary(attempt, summary);
            }
        }

        Ok(exit_code(last, report.cancelled))
    }
}

/// Exit code for the run that decided the final state
pub fn exit_code(summary: &SyncSummary, cancelled: bool) -> i32 {
    match summary.outcome {
        SyncOutcome::Success | SyncOutcome::Skipped | SyncOutcome::Disabled => 0,
        SyncOutcome::Failed if summary.interrupted || cancelled => 130,
        SyncOutcome::Failed => 1,
    }
}

fn print_summary(attempt: usize, summary: &SyncSummary) {
    if attempt > 0 {
        println!("↻ Fast retry {attempt}");
    }

    match summary.outcome {
        SyncOutcome::Disabled => {
            println!("⏸️  Tracking is disabled, nothing to do");
            return;
        }
        SyncOutcome::Skipped => {
            println!("⏭️  Another sync is in progress, skipped");
            return;
        }
        _ => {}
    }

    println!("📊 Sync Summary ({}):", summary.trigger);
    println!("  Days: {}/{} synced", summary.days_succeeded, summary.days_attempted);
    println!(
        "  Chunks: {}/{} confirmed",
        summary.chunks_succeeded, summary.chunks_attempted
    );
    println!("  Created: {}, Updated: {}", summary.created, summary.updated);
    if summary.dropped_invalid > 0 {
        println!("  Dropped invalid entries: {}", summary.dropped_invalid);
    }
    println!("  Pending days: {}", summary.pending_days);
    match summary.last_sync_timestamp {
        Some(ts) => println!("  Synced up to: {}", ts.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("  Synced up to: never"),
    }
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());

    if !summary.errors.is_empty() {
        println!("⚠️  Errors encountered:");
        for error in summary.errors.iter().take(10) {
            println!("  - {error}");
        }
        if summary.errors.len() > 10 {
            println!("  ... and {} more", summary.errors.len() - 10);
        }
    }

    match (summary.outcome, &summary.retry) {
        (SyncOutcome::Success, _) => println!("✅ Sync completed successfully!"),
        (_, Some(decision)) if summary.interrupted => {
            println!("⚠️  Sync interrupted. Progress saved, {decision}.")
        }
        (_, Some(decision)) => println!("❌ Sync failed, {decision}"),
        (_, None) => println!("❌ Sync failed"),
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FailureKind;
    use uuid::Uuid;

    fn summary(outcome: SyncOutcome) -> SyncSummary {
        SyncSummary::not_run(Uuid::new_v4(), SyncTrigger::Manual, outcome)
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&summary(SyncOutcome::Success), false), 0);
        assert_eq!(exit_code(&summary(SyncOutcome::Skipped), false), 0);
        assert_eq!(exit_code(&summary(SyncOutcome::Disabled), false), 0);
        assert_eq!(exit_code(&summary(SyncOutcome::Failed), false), 1);
        assert_eq!(exit_code(&summary(SyncOutcome::Failed), true), 130);

        let mut interrupted = summary(SyncOutcome::Failed);
        interrupted.interrupted = true;
        interrupted.failure_kind = Some(FailureKind::Interrupted);
        assert_eq!(exit_code(&interrupted, false), 130);
    }

    #[tokio::test]
    async fn test_missing_config_is_configuration_error() {
        let args = SyncArgs {
            trigger: SyncTrigger::Manual,
            retry: false,
            dry_run: true,
            json: true,
        };
        let (_tx, rx) = watch::channel(false);
        let code = args.execute("/nonexistent/stepsync.toml", rx).await.unwrap();
        assert_eq!(code, 2);
    }
}
