//! End-to-end sync scenarios against in-memory adapters
//!
//! These tests verify that:
//! - Chunks never exceed 31 days and go out newest first
//! - The sync point only moves over a confirmed prefix and never backwards
//! - Unconfirmed days are queued and picked up by the next run
//! - Only one run holds the in-progress marker at a time
//! - Resending the same days is an idempotent upsert

mod common;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use common::{now, recent_days, source, today, Fixture};
use std::io::Write;
use std::sync::{Arc, Mutex};
use stepsync::adapters::gateway::{InjectedFailure, MemoryGateway, SyncGateway};
use stepsync::adapters::health::FileHealthProvider;
use stepsync::core::retry::RetryDecision;
use stepsync::core::state::{StateManager, SyncState, SyncStatus};
use stepsync::core::sync::{SyncOrchestrator, SyncOutcome, SyncTrigger};
use stepsync::domain::{FailureKind, StepDayEntry, SyncBatchResult};
use tempfile::NamedTempFile;
use tokio::sync::watch;

#[tokio::test]
async fn test_cold_start_with_failing_second_chunk() {
    let fixture = Fixture::new(recent_days(45));
    fixture.gateway.fail_call(1, InjectedFailure::ServerError);

    let summary = fixture
        .orchestrator()
        .run_sync(SyncTrigger::Scheduled)
        .await
        .unwrap();

    assert_eq!(fixture.gateway.batch_sizes(), vec![31, 14]);
    assert_eq!(summary.outcome, SyncOutcome::Failed);
    assert_eq!(summary.chunks_succeeded, 1);
    assert_eq!(summary.days_succeeded, 31);
    assert_eq!(summary.failure_kind, Some(FailureKind::Transient));

    let state = fixture.state().await;
    // the newest chunk covers today, so the sync point is "now"
    assert_eq!(state.last_sync_timestamp, Some(now()));
    assert_eq!(state.last_sync_status, SyncStatus::Failed);
    assert_eq!(state.failed_attempts, 1);
    assert!(!state.is_in_progress());

    let expected: Vec<NaiveDate> = (31..45).map(|i| today() - Duration::days(i)).collect();
    assert_eq!(state.pending_days.iter().copied().rev().collect::<Vec<_>>(), expected);

    // the next wake picks the queued days back up
    let summary = fixture
        .orchestrator()
        .run_sync(SyncTrigger::Scheduled)
        .await
        .unwrap();
    assert_eq!(summary.outcome, SyncOutcome::Success);

    let state = fixture.state().await;
    assert!(state.pending_days.is_empty());
    assert_eq!(state.failed_attempts, 0);
    assert_eq!(state.last_sync_status, SyncStatus::Success);
    assert_eq!(fixture.gateway.record_count(), 45);
}

#[tokio::test]
async fn test_failed_first_chunk_holds_sync_point() {
    let fixture = Fixture::new(recent_days(45));
    fixture.gateway.fail_call(0, InjectedFailure::ServerError);

    let summary = fixture
        .orchestrator()
        .run_sync(SyncTrigger::Scheduled)
        .await
        .unwrap();

    // later chunks are still attempted
    assert_eq!(summary.chunks_attempted, 2);
    assert_eq!(summary.chunks_succeeded, 1);

    let state = fixture.state().await;
    assert!(state.last_sync_timestamp.is_none());
    assert_eq!(state.pending_days.len(), 31);
    assert!(state.pending_days.contains(&today()));
    assert!(!state.pending_days.contains(&(today() - Duration::days(40))));
    assert!(fixture
        .gateway
        .record(today() - Duration::days(40), &source())
        .is_some());
}

#[tokio::test]
async fn test_partial_batch_requeues_whole_chunk() {
    let fixture = Fixture::new(recent_days(10));
    fixture.gateway.fail_call(0, InjectedFailure::Partial);

    let summary = fixture
        .orchestrator()
        .run_sync(SyncTrigger::Manual)
        .await
        .unwrap();

    assert_eq!(summary.outcome, SyncOutcome::Failed);
    assert_eq!(summary.failure_kind, Some(FailureKind::PartialBatch));
    assert_eq!(
        summary.retry,
        Some(RetryDecision::FastRetry(std::time::Duration::from_secs(300)))
    );

    let state = fixture.state().await;
    assert_eq!(state.pending_days.len(), 10);
    assert!(state.last_sync_timestamp.is_none());
}

#[tokio::test]
async fn test_fresh_marker_skips_run() {
    let mut state = SyncState::default();
    state.in_progress_since = Some(now() - Duration::seconds(30));
    let fixture = Fixture::with_state(recent_days(3), state.clone());

    let summary = fixture
        .orchestrator()
        .run_sync(SyncTrigger::Scheduled)
        .await
        .unwrap();

    assert_eq!(summary.outcome, SyncOutcome::Skipped);
    assert_eq!(fixture.provider.call_count(), 0);
    assert_eq!(fixture.gateway.call_count(), 0);
    assert_eq!(fixture.state().await, state);
}

#[tokio::test]
async fn test_stale_marker_is_taken_over() {
    let mut state = SyncState::default();
    state.in_progress_since = Some(now() - Duration::minutes(10));
    let fixture = Fixture::with_state(recent_days(3), state);

    let summary = fixture
        .orchestrator()
        .run_sync(SyncTrigger::Scheduled)
        .await
        .unwrap();

    assert_eq!(summary.outcome, SyncOutcome::Success);
    let state = fixture.state().await;
    assert!(!state.is_in_progress());
    assert_eq!(state.last_attempt_at, Some(now()));
}

#[tokio::test]
async fn test_concurrent_runs_one_wins() {
    let fixture = Fixture::new(recent_days(3));
    fixture
        .provider
        .set_delay(Some(std::time::Duration::from_millis(50)));

    let first = fixture.orchestrator();
    let second = fixture.orchestrator();
    let (a, b) = tokio::join!(
        first.run_sync(SyncTrigger::Scheduled),
        second.run_sync(SyncTrigger::ForegroundStale)
    );

    let mut outcomes = vec![a.unwrap().outcome, b.unwrap().outcome];
    outcomes.sort_by_key(|o| o.to_string());
    assert_eq!(outcomes, vec![SyncOutcome::Skipped, SyncOutcome::Success]);
    assert_eq!(fixture.gateway.call_count(), 1);
}

#[tokio::test]
async fn test_no_data_is_a_successful_noop() {
    let mut state = SyncState::default();
    state.failed_attempts = 2;
    state.last_sync_status = SyncStatus::Failed;
    let fixture = Fixture::with_state(Vec::new(), state);

    let summary = fixture
        .orchestrator()
        .run_sync(SyncTrigger::Scheduled)
        .await
        .unwrap();

    assert_eq!(summary.outcome, SyncOutcome::Success);
    assert_eq!(summary.chunks_attempted, 0);
    assert_eq!(fixture.gateway.call_count(), 0);

    let state = fixture.state().await;
    assert_eq!(state.last_sync_timestamp, Some(now()));
    assert_eq!(state.failed_attempts, 0);
}

#[tokio::test]
async fn test_permission_revoked_defers_without_counting() {
    let mut state = SyncState::default();
    state.add_pending([today() - Duration::days(3)]);
    state.failed_attempts = 1;
    let fixture = Fixture::with_state(recent_days(5), state);
    fixture.provider.set_revoked(true);

    let summary = fixture
        .orchestrator()
        .run_sync(SyncTrigger::Scheduled)
        .await
        .unwrap();

    assert_eq!(summary.outcome, SyncOutcome::Failed);
    assert_eq!(summary.failure_kind, Some(FailureKind::Permission));
    assert_eq!(summary.retry, Some(RetryDecision::Defer));
    assert_eq!(fixture.gateway.call_count(), 0);

    let state = fixture.state().await;
    assert_eq!(state.failed_attempts, 1);
    assert_eq!(state.last_failure_kind, Some(FailureKind::Permission));
    assert_eq!(state.pending_days.len(), 1);
    assert!(state.last_sync_timestamp.is_none());
    assert!(!state.is_in_progress());
}

#[tokio::test]
async fn test_provider_outage_is_transient() {
    let fixture = Fixture::new(recent_days(5));
    fixture.provider.set_failing(true);

    let summary = fixture
        .orchestrator()
        .run_sync(SyncTrigger::Scheduled)
        .await
        .unwrap();

    assert_eq!(summary.failure_kind, Some(FailureKind::Transient));
    assert_eq!(fixture.state().await.failed_attempts, 1);
    assert_eq!(fixture.gateway.call_count(), 0);
}

#[tokio::test]
async fn test_rejected_batch_defers_and_queues_days() {
    let fixture = Fixture::new(recent_days(5));
    fixture.gateway.fail_call(0, InjectedFailure::Rejected(422));

    let summary = fixture
        .orchestrator()
        .run_sync(SyncTrigger::Scheduled)
        .await
        .unwrap();

    assert_eq!(summary.outcome, SyncOutcome::Failed);
    assert_eq!(summary.failure_kind, Some(FailureKind::Rejected));
    assert_eq!(summary.retry, Some(RetryDecision::Defer));

    let state = fixture.state().await;
    assert_eq!(state.failed_attempts, 1);
    assert_eq!(state.last_failure_kind, Some(FailureKind::Rejected));
    assert_eq!(state.pending_days.len(), 5);
    assert!(state.last_sync_timestamp.is_none());
}

#[tokio::test]
async fn test_queued_days_after_today_are_dropped() {
    let mut state = SyncState::default();
    state.last_sync_timestamp = Some(now() - Duration::days(2));
    state.add_pending([today() - Duration::days(10), today() + Duration::days(2)]);
    let fixture = Fixture::with_state(recent_days(12), state);

    let summary = fixture
        .orchestrator()
        .run_sync(SyncTrigger::Scheduled)
        .await
        .unwrap();

    assert_eq!(summary.outcome, SyncOutcome::Success);
    assert!(fixture.state().await.pending_days.is_empty());
    assert!(fixture.gateway.record(today() - Duration::days(10), &source()).is_some());
}

#[tokio::test]
async fn test_retry_schedule_across_runs() {
    let fixture = Fixture::new(recent_days(2));
    fixture.provider.set_failing(true);
    let orchestrator = fixture.orchestrator();

    let mut decisions = Vec::new();
    for _ in 0..5 {
        let summary = orchestrator.run_sync(SyncTrigger::Scheduled).await.unwrap();
        decisions.push(summary.retry.unwrap());
    }

    let minutes = |m: u64| RetryDecision::FastRetry(std::time::Duration::from_secs(m * 60));
    assert_eq!(
        decisions,
        vec![
            minutes(5),
            minutes(10),
            minutes(15),
            RetryDecision::Defer,
            RetryDecision::Defer
        ]
    );
    assert_eq!(fixture.state().await.failed_attempts, 5);
}

#[tokio::test]
async fn test_resend_is_idempotent() {
    let fixture = Fixture::new(recent_days(31));
    let orchestrator = fixture.orchestrator();

    let first = orchestrator.run_sync(SyncTrigger::Manual).await.unwrap();
    let second = orchestrator.run_sync(SyncTrigger::Manual).await.unwrap();

    assert_eq!(first.created, 31);
    assert_eq!(second.created, 0);
    assert_eq!(second.updated, 31);
    assert_eq!(fixture.gateway.record_count(), 31);
}

#[tokio::test]
async fn test_updated_count_overwrites_remote() {
    let fixture = Fixture::new(recent_days(1));
    fixture.orchestrator().run_sync(SyncTrigger::Manual).await.unwrap();

    fixture
        .provider
        .set_entries(vec![StepDayEntry::new(today(), 12_345, source())]);
    fixture.orchestrator().run_sync(SyncTrigger::Manual).await.unwrap();

    let record = fixture.gateway.record(today(), &source()).unwrap();
    assert_eq!(record.step_count, 12_345);
}

#[tokio::test]
async fn test_sync_point_never_moves_back() {
    let ahead = now() + Duration::days(2);
    let mut state = SyncState::default();
    state.last_sync_timestamp = Some(ahead);
    let fixture = Fixture::with_state(recent_days(3), state);

    let summary = fixture
        .orchestrator()
        .run_sync(SyncTrigger::Scheduled)
        .await
        .unwrap();

    assert_eq!(summary.outcome, SyncOutcome::Success);
    assert_eq!(fixture.state().await.last_sync_timestamp, Some(ahead));
}

#[tokio::test]
async fn test_disabled_tracking_touches_nothing() {
    let mut state = SyncState::default();
    state.add_pending([today() - Duration::days(1)]);
    let fixture = Fixture::with_state(recent_days(3), state.clone());

    let (toggle, enabled) = watch::channel(false);
    let orchestrator = fixture.orchestrator().with_enablement(enabled);

    let summary = orchestrator.run_sync(SyncTrigger::Manual).await.unwrap();
    assert_eq!(summary.outcome, SyncOutcome::Disabled);
    assert_eq!(fixture.provider.call_count(), 0);
    assert_eq!(fixture.state().await, state);

    toggle.send(true).unwrap();
    let summary = orchestrator.run_sync(SyncTrigger::Manual).await.unwrap();
    assert_eq!(summary.outcome, SyncOutcome::Success);
}

#[tokio::test]
async fn test_invalid_entries_never_count_as_synced() {
    let mut entries = recent_days(3);
    entries.push(StepDayEntry::new(today() + Duration::days(1), 100, source()));
    entries.push(StepDayEntry::new(today() - Duration::days(5), -1, source()));
    let fixture = Fixture::new(entries);

    let summary = fixture
        .orchestrator()
        .run_sync(SyncTrigger::Scheduled)
        .await
        .unwrap();

    assert_eq!(summary.outcome, SyncOutcome::Success);
    assert_eq!(summary.dropped_invalid, 2);
    assert_eq!(summary.days_attempted, 3);
    assert_eq!(fixture.gateway.record_count(), 3);
    assert!(fixture.state().await.pending_days.is_empty());
}

#[tokio::test]
async fn test_incremental_run_fetches_pending_gaps() {
    let mut samples = NamedTempFile::new().unwrap();
    let old_gap = today() - Duration::days(20);
    write!(
        samples,
        r#"[
  {{ "date": "{}", "step_count": 7000 }},
  {{ "date": "{}", "step_count": 3000 }},
  {{ "date": "{}", "step_count": 1200 }},
  {{ "date": "{}", "step_count": 999 }}
]"#,
        old_gap,
        today() - Duration::days(1),
        today(),
        today() - Duration::days(10),
    )
    .unwrap();

    let mut state = SyncState::default();
    state.last_sync_timestamp = Some(now() - Duration::days(1));
    state.add_pending([old_gap]);
    let fixture = Fixture::with_state(Vec::new(), state);

    let provider = Arc::new(FileHealthProvider::new(samples.path()));
    let summary = fixture
        .orchestrator_with(provider)
        .run_sync(SyncTrigger::Scheduled)
        .await
        .unwrap();

    assert_eq!(summary.outcome, SyncOutcome::Success);
    // yesterday, today and the queued gap; the unrequested day is left alone
    assert_eq!(summary.days_succeeded, 3);
    assert!(fixture.gateway.record(old_gap, &source()).is_some());
    assert!(fixture
        .gateway
        .record(today() - Duration::days(10), &source())
        .is_none());

    let state = fixture.state().await;
    assert!(state.pending_days.is_empty());
    assert_eq!(state.last_sync_timestamp, Some(now()));
}

/// Gateway that records the persisted state each time a chunk arrives
struct CheckpointObserver {
    inner: Arc<MemoryGateway>,
    state: Arc<StateManager>,
    seen: Mutex<Vec<SyncState>>,
}

#[async_trait]
impl SyncGateway for CheckpointObserver {
    async fn sync_batch(
        &self,
        entries: &[StepDayEntry],
    ) -> stepsync::domain::Result<SyncBatchResult> {
        let persisted = self.state.read().await?;
        self.seen.lock().unwrap().push(persisted);
        self.inner.sync_batch(entries).await
    }

    fn name(&self) -> &str {
        "checkpoint-observer"
    }
}

#[tokio::test]
async fn test_chunks_checkpoint_state() {
    let fixture = Fixture::new(recent_days(70));
    fixture.gateway.fail_call(1, InjectedFailure::ServerError);
    let observer = Arc::new(CheckpointObserver {
        inner: fixture.gateway.clone(),
        state: fixture.state.clone(),
        seen: Mutex::new(Vec::new()),
    });

    let summary = SyncOrchestrator::new(
        fixture.settings.clone(),
        fixture.provider.clone(),
        observer.clone(),
        fixture.state.clone(),
    )
    .with_clock(fixture.clock.clone())
    .run_sync(SyncTrigger::Scheduled)
    .await
    .unwrap();

    assert_eq!(fixture.gateway.batch_sizes(), vec![31, 31, 8]);
    assert_eq!(summary.chunks_succeeded, 2);

    let seen = observer.seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 3);
    assert!(seen.iter().all(|s| s.is_in_progress()));

    // nothing persisted before the first chunk
    assert!(seen[0].last_sync_timestamp.is_none());
    assert!(seen[0].pending_days.is_empty());

    // the newest chunk was checkpointed before the second call
    assert_eq!(seen[1].last_sync_timestamp, Some(now()));
    assert!(seen[1].pending_days.is_empty());

    // the failed middle chunk was queued before the third call
    assert_eq!(seen[2].last_sync_timestamp, Some(now()));
    assert_eq!(seen[2].pending_days.len(), 31);

    let state = fixture.state().await;
    assert!(!state.is_in_progress());
    assert_eq!(state.pending_days.len(), 31);
}
