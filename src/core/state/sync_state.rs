//! Persisted sync state
//!
//! One [`SyncState`] record exists per installation. It is mutated only by the
//! orchestrator at the start and end of every run, and cleared back to defaults
//! by the collaborator that owns the tracking toggle.

use crate::domain::FailureKind;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Status of the last sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Every chunk of the last run was confirmed by the gateway
    Success,
    /// The last run failed or was interrupted
    Failed,
    /// A run is in flight, or no run has ever completed
    #[default]
    Pending,
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SyncStatus::Success => "success",
            SyncStatus::Failed => "failed",
            SyncStatus::Pending => "pending",
        };
        f.write_str(s)
    }
}

/// Sync state record
///
/// Missing fields deserialize to their defaults, so a record written by an
/// older build still loads.
///
/// # Examples
///
/// ```
/// use stepsync::core::state::{SyncState, SyncStatus};
/// use stepsync::domain::FailureKind;
/// use chrono::Utc;
///
/// let mut state = SyncState::default();
/// assert!(state.last_sync_timestamp.is_none());
///
/// state.mark_started(Utc::now());
/// state.mark_failed(FailureKind::Transient, "gateway unreachable");
/// assert_eq!(state.failed_attempts, 1);
///
/// state.mark_succeeded();
/// assert_eq!(state.failed_attempts, 0);
/// assert_eq!(state.last_sync_status, SyncStatus::Success);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncState {
    /// When the last successful sync point was reached
    pub last_sync_timestamp: Option<DateTime<Utc>>,

    /// Outcome of the last run
    pub last_sync_status: SyncStatus,

    /// Consecutive failed runs since the last success
    pub failed_attempts: u32,

    /// Days that failed to sync and must be retried opportunistically
    pub pending_days: BTreeSet<NaiveDate>,

    /// In-progress marker; set while a run holds the sync lock
    pub in_progress_since: Option<DateTime<Utc>>,

    /// When the last run started
    pub last_attempt_at: Option<DateTime<Utc>>,

    /// Kind of the last failure, cleared on success
    pub last_failure_kind: Option<FailureKind>,

    /// Message of the last failure, cleared on success
    pub last_error: Option<String>,
}

impl SyncState {
    /// Whether the in-progress marker is set
    pub fn is_in_progress(&self) -> bool {
        self.in_progress_since.is_some()
    }

    /// Whether the in-progress marker is set and younger than `stale_after`
    ///
    /// A marker older than `stale_after` belongs to an abandoned run. A marker
    /// further in the future than `stale_after` (the wall clock moved back) is
    /// treated the same way so it can never block syncing forever.
    pub fn marker_is_fresh(&self, now: DateTime<Utc>, stale_after: Duration) -> bool {
        match self.in_progress_since {
            Some(since) => {
                let age = now - since;
                age < stale_after && age > -stale_after
            }
            None => false,
        }
    }

    /// Set the in-progress marker and flag the run as pending
    pub fn mark_started(&mut self, now: DateTime<Utc>) {
        self.in_progress_since = Some(now);
        self.last_attempt_at = Some(now);
        self.last_sync_status = SyncStatus::Pending;
    }

    /// Clear the in-progress marker
    pub fn release_marker(&mut self) {
        self.in_progress_since = None;
    }

    /// Record a fully successful run
    pub fn mark_succeeded(&mut self) {
        self.last_sync_status = SyncStatus::Success;
        self.failed_attempts = 0;
        self.last_failure_kind = None;
        self.last_error = None;
    }

    /// Record a failed run
    ///
    /// Permission failures are not counted against the fast-retry budget:
    /// retrying cannot help until the user grants access again.
    pub fn mark_failed(&mut self, kind: FailureKind, message: impl Into<String>) {
        self.last_sync_status = SyncStatus::Failed;
        if kind != FailureKind::Permission {
            self.failed_attempts = self.failed_attempts.saturating_add(1);
        }
        self.last_failure_kind = Some(kind);
        self.last_error = Some(message.into());
    }

    /// Advance the sync point to cover `day`, never moving it backwards
    ///
    /// The stored timestamp is the end of `day`, capped at `now` so a sync of
    /// today's partial data reads as "synced just now".
    pub fn advance_to_day(&mut self, day: NaiveDate, now: DateTime<Utc>) {
        let end_of_day = day
            .and_hms_opt(23, 59, 59)
            .map(|dt| dt.and_utc())
            .unwrap_or(now);
        self.advance_to(end_of_day.min(now));
    }

    /// Advance the sync point to `timestamp`, never moving it backwards
    pub fn advance_to(&mut self, timestamp: DateTime<Utc>) {
        self.last_sync_timestamp = Some(match self.last_sync_timestamp {
            Some(existing) if existing > timestamp => existing,
            _ => timestamp,
        });
    }

    /// Calendar day of the last sync point
    pub fn last_synced_day(&self) -> Option<NaiveDate> {
        self.last_sync_timestamp.map(|ts| ts.date_naive())
    }

    /// Queue days for an opportunistic retry
    pub fn add_pending<I: IntoIterator<Item = NaiveDate>>(&mut self, days: I) {
        self.pending_days.extend(days);
    }

    /// Drop days from the retry queue once they are confirmed
    pub fn clear_pending<'a, I: IntoIterator<Item = &'a NaiveDate>>(&mut self, days: I) {
        for day in days {
            self.pending_days.remove(day);
        }
    }

    /// Build the read-only staleness signal for display
    pub fn staleness(&self, now: DateTime<Utc>, threshold: Duration) -> StalenessReport {
        let age = self.last_sync_timestamp.map(|ts| now - ts);
        let is_stale = match age {
            Some(age) => age > threshold,
            None => true,
        };

        StalenessReport {
            last_sync_timestamp: self.last_sync_timestamp,
            last_sync_status: self.last_sync_status,
            last_failure_kind: self.last_failure_kind,
            pending_days: self.pending_days.len(),
            age,
            is_stale,
        }
    }
}

/// Read-only view of sync freshness for the UI
#[derive(Debug, Clone, PartialEq)]
pub struct StalenessReport {
    /// When the last successful sync point was reached
    pub last_sync_timestamp: Option<DateTime<Utc>>,

    /// Outcome of the last run
    pub last_sync_status: SyncStatus,

    /// Kind of the last failure, if any
    pub last_failure_kind: Option<FailureKind>,

    /// Number of days waiting for a retry
    pub pending_days: usize,

    /// Time since the last sync point
    pub age: Option<Duration>,

    /// Whether the age exceeds the staleness threshold (always true if never synced)
    pub is_stale: bool,
}

impl StalenessReport {
    /// Whether an app-foreground check should trigger a sync
    pub fn should_sync_on_foreground(&self) -> bool {
        self.is_stale
    }

    /// Human-readable age, e.g. "2 hours ago"
    pub fn describe_age(&self) -> String {
        let Some(age) = self.age else {
            return "never".to_string();
        };

        let minutes = age.num_minutes();
        if minutes < 1 {
            "just now".to_string()
        } else if minutes < 60 {
            plural(minutes, "minute")
        } else if minutes < 60 * 24 {
            plural(age.num_hours(), "hour")
        } else {
            plural(age.num_days(), "day")
        }
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, h, m, 0).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_default_state() {
        let state = SyncState::default();
        assert!(state.last_sync_timestamp.is_none());
        assert_eq!(state.last_sync_status, SyncStatus::Pending);
        assert_eq!(state.failed_attempts, 0);
        assert!(state.pending_days.is_empty());
        assert!(!state.is_in_progress());
    }

    #[test]
    fn test_marker_freshness() {
        let mut state = SyncState::default();
        state.mark_started(at(10, 0));

        let stale_after = Duration::minutes(2);
        assert!(state.marker_is_fresh(at(10, 1), stale_after));
        assert!(!state.marker_is_fresh(at(10, 3), stale_after));

        state.release_marker();
        assert!(!state.marker_is_fresh(at(10, 1), stale_after));
    }

    #[test]
    fn test_marker_far_in_future_is_abandoned() {
        let mut state = SyncState::default();
        state.mark_started(at(12, 0));
        assert!(!state.marker_is_fresh(at(10, 0), Duration::minutes(2)));
    }

    #[test]
    fn test_mark_failed_counts_attempts() {
        let mut state = SyncState::default();
        state.mark_failed(FailureKind::Transient, "boom");
        state.mark_failed(FailureKind::PartialBatch, "ambiguous");
        assert_eq!(state.failed_attempts, 2);
        assert_eq!(state.last_sync_status, SyncStatus::Failed);
        assert_eq!(state.last_failure_kind, Some(FailureKind::PartialBatch));
    }

    #[test]
    fn test_permission_failure_does_not_count() {
        let mut state = SyncState::default();
        state.failed_attempts = 1;
        state.mark_failed(FailureKind::Permission, "revoked");
        assert_eq!(state.failed_attempts, 1);
        assert_eq!(state.last_failure_kind, Some(FailureKind::Permission));
    }

    #[test]
    fn test_mark_succeeded_resets() {
        let mut state = SyncState::default();
        state.mark_failed(FailureKind::Transient, "boom");
        state.mark_succeeded();
        assert_eq!(state.failed_attempts, 0);
        assert!(state.last_error.is_none());
        assert!(state.last_failure_kind.is_none());
    }

    #[test]
    fn test_advance_to_day_caps_at_now() {
        let mut state = SyncState::default();
        state.advance_to_day(day(10), at(9, 30));
        assert_eq!(state.last_sync_timestamp, Some(at(9, 30)));
        assert_eq!(state.last_synced_day(), Some(day(10)));
    }

    #[test]
    fn test_advance_to_day_past_day_uses_end_of_day() {
        let mut state = SyncState::default();
        state.advance_to_day(day(8), at(9, 30));
        let ts = state.last_sync_timestamp.unwrap();
        assert_eq!(ts.date_naive(), day(8));
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 3, 8, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_advance_never_moves_backwards() {
        let mut state = SyncState::default();
        state.advance_to_day(day(9), at(9, 30));
        state.advance_to_day(day(3), at(9, 30));
        assert_eq!(state.last_synced_day(), Some(day(9)));
    }

    #[test]
    fn test_pending_days() {
        let mut state = SyncState::default();
        state.add_pending([day(1), day(2), day(2), day(3)]);
        assert_eq!(state.pending_days.len(), 3);

        state.clear_pending(&[day(2), day(9)]);
        assert_eq!(
            state.pending_days.iter().copied().collect::<Vec<_>>(),
            vec![day(1), day(3)]
        );
    }

    #[test]
    fn test_staleness_report() {
        let mut state = SyncState::default();
        let report = state.staleness(at(12, 0), Duration::hours(24));
        assert!(report.is_stale);
        assert_eq!(report.describe_age(), "never");

        state.advance_to(at(10, 0));
        let report = state.staleness(at(12, 0), Duration::hours(24));
        assert!(!report.is_stale);
        assert!(!report.should_sync_on_foreground());
        assert_eq!(report.describe_age(), "2 hours ago");
    }

    #[test]
    fn test_describe_age_units() {
        let mut state = SyncState::default();
        state.advance_to(at(10, 0));

        let threshold = Duration::hours(24);
        assert_eq!(state.staleness(at(10, 0), threshold).describe_age(), "just now");
        assert_eq!(state.staleness(at(10, 1), threshold).describe_age(), "1 minute ago");
        assert_eq!(state.staleness(at(11, 0), threshold).describe_age(), "1 hour ago");

        let two_days = at(10, 0) + Duration::days(2);
        let report = state.staleness(two_days, threshold);
        assert_eq!(report.describe_age(), "2 days ago");
        assert!(report.is_stale);
    }

    #[test]
    fn test_state_serialization_roundtrip_with_missing_fields() {
        let json = r#"{"failed_attempts": 2, "pending_days": ["2024-03-01"]}"#;
        let state: SyncState = serde_json::from_str(json).unwrap();
        assert_eq!(state.failed_attempts, 2);
        assert!(state.pending_days.contains(&day(1)));
        assert_eq!(state.last_sync_status, SyncStatus::Pending);
        assert!(state.in_progress_since.is_none());
    }
}
