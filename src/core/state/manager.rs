//! State manager for sync state persistence
//!
//! The manager is the only path through which the orchestrator reads and writes
//! [`SyncState`]. It serializes access within the process so the in-progress
//! marker check-and-set cannot interleave with another run.

use crate::adapters::state::StateStorage;
use crate::core::state::sync_state::{StalenessReport, SyncState};
use crate::domain::Result;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Outcome of trying to take the sync lock
#[derive(Debug, Clone, PartialEq)]
pub enum Acquire {
    /// The marker was written; the caller owns the run
    Acquired {
        /// State as persisted with the fresh marker
        state: SyncState,
        /// Start time of an abandoned run whose marker was overwritten
        replaced_stale: Option<DateTime<Utc>>,
    },
    /// Another run holds a fresh marker
    Busy {
        /// When the other run started
        since: DateTime<Utc>,
    },
}

/// State manager for sync state persistence
pub struct StateManager {
    /// State storage backend
    storage: Arc<dyn StateStorage>,
    /// Serializes read-modify-write sequences in this process
    lock: Mutex<()>,
}

impl StateManager {
    /// Create a new StateManager with a state storage backend
    pub fn new_with_storage(storage: Arc<dyn StateStorage>) -> Self {
        Self {
            storage,
            lock: Mutex::new(()),
        }
    }

    /// Read the current sync state
    ///
    /// Absence of a record is a valid initial state and yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error only if an existing record cannot be read.
    pub async fn read(&self) -> Result<SyncState> {
        let _guard = self.lock.lock().await;
        self.load_or_default().await
    }

    /// Replace the persisted sync state
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write(&self, state: &SyncState) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.storage.save(state).await
    }

    /// Checkpoint progress after a chunk
    ///
    /// Same as [`write`](Self::write), logged as a checkpoint.
    pub async fn checkpoint(&self, state: &SyncState) -> Result<()> {
        tracing::debug!(
            last_sync = ?state.last_sync_timestamp,
            pending_days = state.pending_days.len(),
            "Checkpointing sync state"
        );
        self.write(state).await
    }

    /// Take the sync lock by writing the in-progress marker
    ///
    /// A marker younger than `stale_after` means another run is in flight and
    /// yields [`Acquire::Busy`]. An older marker is considered abandoned and is
    /// overwritten.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be read or the marker written.
    pub async fn try_acquire(&self, now: DateTime<Utc>, stale_after: Duration) -> Result<Acquire> {
        let _guard = self.lock.lock().await;
        let mut state = self.load_or_default().await?;

        if state.marker_is_fresh(now, stale_after) {
            if let Some(since) = state.in_progress_since {
                return Ok(Acquire::Busy { since });
            }
        }

        let replaced_stale = state.in_progress_since;
        if let Some(since) = replaced_stale {
            tracing::warn!(
                marker_since = %since,
                "Overwriting stale in-progress marker from an abandoned sync"
            );
        }

        state.mark_started(now);
        self.storage.save(&state).await?;

        Ok(Acquire::Acquired {
            state,
            replaced_stale,
        })
    }

    /// Clear the in-progress marker and persist the final state
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn release(&self, state: &mut SyncState) -> Result<()> {
        state.release_marker();
        self.write(state).await
    }

    /// Clear the state back to defaults
    ///
    /// Called when the user disables tracking.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be removed.
    pub async fn reset(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        tracing::info!(location = %self.storage.location(), "Resetting sync state");
        self.storage.clear().await
    }

    /// Read-only staleness signal for display
    ///
    /// # Errors
    ///
    /// Returns an error only if an existing record cannot be read.
    pub async fn staleness(
        &self,
        now: DateTime<Utc>,
        threshold: Duration,
    ) -> Result<StalenessReport> {
        Ok(self.read().await?.staleness(now, threshold))
    }

    /// Where the state lives
    pub fn location(&self) -> String {
        self.storage.location()
    }

    async fn load_or_default(&self) -> Result<SyncState> {
        Ok(self.storage.load().await?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::state::MemoryStateStorage;
    use crate::core::state::SyncStatus;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, h, m, 0).unwrap()
    }

    fn manager() -> StateManager {
        StateManager::new_with_storage(Arc::new(MemoryStateStorage::new()))
    }

    #[tokio::test]
    async fn test_read_defaults_when_absent() {
        let state = manager().read().await.unwrap();
        assert_eq!(state, SyncState::default());
    }

    #[tokio::test]
    async fn test_acquire_then_busy() {
        let manager = manager();
        let stale_after = Duration::minutes(2);

        let first = manager.try_acquire(at(10, 0), stale_after).await.unwrap();
        assert!(matches!(
            first,
            Acquire::Acquired {
                replaced_stale: None,
                ..
            }
        ));

        let second = manager.try_acquire(at(10, 1), stale_after).await.unwrap();
        assert_eq!(second, Acquire::Busy { since: at(10, 0) });
    }

    #[tokio::test]
    async fn test_acquire_overwrites_stale_marker() {
        let manager = manager();
        let stale_after = Duration::minutes(2);

        manager.try_acquire(at(10, 0), stale_after).await.unwrap();
        let again = manager.try_acquire(at(10, 5), stale_after).await.unwrap();

        match again {
            Acquire::Acquired {
                state,
                replaced_stale,
            } => {
                assert_eq!(replaced_stale, Some(at(10, 0)));
                assert_eq!(state.in_progress_since, Some(at(10, 5)));
                assert_eq!(state.last_sync_status, SyncStatus::Pending);
            }
            other => panic!("expected Acquired, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_release_clears_marker() {
        let manager = manager();
        let Acquire::Acquired { mut state, .. } = manager
            .try_acquire(at(10, 0), Duration::minutes(2))
            .await
            .unwrap()
        else {
            panic!("expected Acquired");
        };

        manager.release(&mut state).await.unwrap();
        let persisted = manager.read().await.unwrap();
        assert!(!persisted.is_in_progress());

        let next = manager
            .try_acquire(at(10, 1), Duration::minutes(2))
            .await
            .unwrap();
        assert!(matches!(next, Acquire::Acquired { .. }));
    }

    #[tokio::test]
    async fn test_reset() {
        let manager = manager();
        let mut state = SyncState::default();
        state.failed_attempts = 3;
        manager.write(&state).await.unwrap();

        manager.reset().await.unwrap();
        assert_eq!(manager.read().await.unwrap(), SyncState::default());
    }

    #[tokio::test]
    async fn test_concurrent_acquire_only_one_wins() {
        let manager = Arc::new(manager());
        let stale_after = Duration::minutes(2);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move { manager.try_acquire(at(10, 0), stale_after).await })
            })
            .collect();

        let mut acquired = 0;
        for handle in handles {
            if matches!(handle.await.unwrap().unwrap(), Acquire::Acquired { .. }) {
                acquired += 1;
            }
        }
        assert_eq!(acquired, 1);
    }
}
