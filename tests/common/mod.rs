//! Shared fixtures for the sync scenario tests

#![allow(dead_code)]

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use std::sync::Arc;
use stepsync::adapters::gateway::MemoryGateway;
use stepsync::adapters::health::{HealthDataProvider, StaticHealthProvider};
use stepsync::adapters::state::MemoryStateStorage;
use stepsync::core::clock::FixedClock;
use stepsync::core::state::{StateManager, SyncState};
use stepsync::core::sync::{SyncOrchestrator, SyncSettings};
use stepsync::domain::{SourceId, StepDayEntry, UserId};

/// Fixed wall clock for every scenario: 2024-03-30 09:00 UTC
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 30, 9, 0, 0).unwrap()
}

pub fn today() -> NaiveDate {
    now().date_naive()
}

pub fn source() -> SourceId {
    SourceId::new("healthkit").unwrap()
}

/// `n` valid entries ending today, newest first
pub fn recent_days(n: i64) -> Vec<StepDayEntry> {
    (0..n)
        .map(|i| StepDayEntry::new(today() - Duration::days(i), 5_000 + i, source()))
        .collect()
}

pub struct Fixture {
    pub provider: Arc<StaticHealthProvider>,
    pub gateway: Arc<MemoryGateway>,
    pub state: Arc<StateManager>,
    pub clock: Arc<FixedClock>,
    pub settings: SyncSettings,
}

impl Fixture {
    pub fn new(entries: Vec<StepDayEntry>) -> Self {
        Self::with_state(entries, SyncState::default())
    }

    pub fn with_state(entries: Vec<StepDayEntry>, state: SyncState) -> Self {
        Self {
            provider: Arc::new(StaticHealthProvider::new(entries)),
            gateway: Arc::new(MemoryGateway::new(UserId::new("user-42").unwrap())),
            state: Arc::new(StateManager::new_with_storage(Arc::new(
                MemoryStateStorage::with_state(state),
            ))),
            clock: Arc::new(FixedClock::new(now())),
            settings: SyncSettings::new(source()),
        }
    }

    pub fn orchestrator(&self) -> SyncOrchestrator {
        self.orchestrator_with(self.provider.clone())
    }

    pub fn orchestrator_with(&self, provider: Arc<dyn HealthDataProvider>) -> SyncOrchestrator {
        SyncOrchestrator::new(
            self.settings.clone(),
            provider,
            self.gateway.clone(),
            self.state.clone(),
        )
        .with_clock(self.clock.clone())
    }

    pub async fn state(&self) -> SyncState {
        self.state.read().await.unwrap()
    }
}
