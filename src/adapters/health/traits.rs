//! Health data provider trait definition
//!
//! The provider wraps the platform health store (HealthKit, Health Connect, or
//! a file export when run from the CLI). It is a black box to the sync core:
//! results are assumed to be the provider's best available data at call time.

use crate::domain::ids::SourceId;
use crate::domain::{Result, StepDayEntry};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Source of daily step aggregates
#[async_trait]
pub trait HealthDataProvider: Send + Sync {
    /// Fetch day-level step aggregates for `start..=end` from `source`
    ///
    /// Days the provider knows nothing about are simply absent from the result;
    /// a zero entry means the provider explicitly reported zero steps.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::PermissionDenied`](crate::domain::SyncError::PermissionDenied)
    /// when access to health data has been revoked, and
    /// [`SyncError::Provider`](crate::domain::SyncError::Provider) for any other
    /// failure.
    async fn get_step_data(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        source: &SourceId,
    ) -> Result<Vec<StepDayEntry>>;

    /// Short provider name for logs
    fn name(&self) -> &str;
}
