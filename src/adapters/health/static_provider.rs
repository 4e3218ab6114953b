//! In-memory health data provider
//!
//! Holds a fixed set of entries and returns all of them for the requested
//! source, like a platform cache that hands back everything it has. Permission
//! revocation and failures can be switched on to drive failure scenarios.

use super::traits::HealthDataProvider;
use crate::domain::ids::SourceId;
use crate::domain::{Result, StepDayEntry, SyncError};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Provider backed by a fixed list of entries
#[derive(Default)]
pub struct StaticHealthProvider {
    entries: Mutex<Vec<StepDayEntry>>,
    revoked: AtomicBool,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl StaticHealthProvider {
    /// Create a provider returning `entries`
    pub fn new(entries: Vec<StepDayEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
            ..Self::default()
        }
    }

    /// Replace the stored entries
    pub fn set_entries(&self, entries: Vec<StepDayEntry>) {
        if let Ok(mut guard) = self.entries.lock() {
            *guard = entries;
        }
    }

    /// Simulate the user revoking or re-granting health data access
    pub fn set_revoked(&self, revoked: bool) {
        self.revoked.store(revoked, Ordering::SeqCst);
    }

    /// Make every call fail with a provider error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Delay every call, to exercise timeouts and cancellation
    pub fn set_delay(&self, delay: Option<Duration>) {
        if let Ok(mut guard) = self.delay.lock() {
            *guard = delay;
        }
    }

    /// Number of `get_step_data` calls so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthDataProvider for StaticHealthProvider {
    async fn get_step_data(
        &self,
        _start: NaiveDate,
        _end: NaiveDate,
        source: &SourceId,
    ) -> Result<Vec<StepDayEntry>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.delay.lock().ok().and_then(|d| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.revoked.load(Ordering::SeqCst) {
            return Err(SyncError::PermissionDenied(
                "step data access revoked".to_string(),
            ));
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(SyncError::Provider("health store unavailable".to_string()));
        }

        let entries = self
            .entries
            .lock()
            .map_err(|_| SyncError::Provider("entry store poisoned".to_string()))?;

        Ok(entries
            .iter()
            .filter(|e| &e.source == source)
            .cloned()
            .collect())
    }

    fn name(&self) -> &str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[tokio::test]
    async fn test_returns_entries_for_source() {
        let kit = SourceId::new("healthkit").unwrap();
        let fit = SourceId::new("fitbit").unwrap();
        let provider = StaticHealthProvider::new(vec![
            StepDayEntry::new(day(1), 10, kit.clone()),
            StepDayEntry::new(day(2), 20, fit),
        ]);

        let entries = provider.get_step_data(day(1), day(2), &kit).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_revoked() {
        let provider = StaticHealthProvider::new(Vec::new());
        provider.set_revoked(true);

        let err = provider
            .get_step_data(day(1), day(2), &SourceId::new("healthkit").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::PermissionDenied(_)));
    }
}
