//! Step day entries and batch results
//!
//! A [`StepDayEntry`] is one day's aggregate for one data source. The remote
//! store keeps at most one entry per `(user, date, source)` and reconciles
//! submissions with an upsert on that key.

use super::errors::SyncError;
use super::ids::SourceId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Hard platform ceiling for a single day's step count
pub const MAX_DAILY_STEPS: i64 = 200_000;

/// Maximum number of day entries the remote gateway accepts per call
pub const MAX_BATCH_ENTRIES: usize = 31;

/// One day's step aggregate for one data source
///
/// # Examples
///
/// ```
/// use stepsync::domain::entry::StepDayEntry;
/// use stepsync::domain::ids::SourceId;
/// use chrono::NaiveDate;
///
/// let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// let entry = StepDayEntry::new(day, 8_500, SourceId::new("healthkit").unwrap())
///     .with_distance(6_120.5);
///
/// assert!(entry.validate(day).is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDayEntry {
    /// Calendar day, no time component
    pub date: NaiveDate,

    /// Total steps for the day
    pub step_count: i64,

    /// Distance walked in meters, if the source reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<f64>,

    /// Which health backend produced the data
    pub source: SourceId,
}

impl StepDayEntry {
    /// Create a new entry without distance
    pub fn new(date: NaiveDate, step_count: i64, source: SourceId) -> Self {
        Self {
            date,
            step_count,
            distance_meters: None,
            source,
        }
    }

    /// Set the distance in meters
    pub fn with_distance(mut self, distance_meters: f64) -> Self {
        self.distance_meters = Some(distance_meters);
        self
    }

    /// Validate the entry against the platform limits
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Validation`] if the step count is outside
    /// `0..=200000`, the distance is negative or not finite, or the date lies
    /// after `today`.
    pub fn validate(&self, today: NaiveDate) -> Result<(), SyncError> {
        if !(0..=MAX_DAILY_STEPS).contains(&self.step_count) {
            return Err(SyncError::Validation(format!(
                "step_count {} for {} is outside 0..={}",
                self.step_count, self.date, MAX_DAILY_STEPS
            )));
        }

        if let Some(distance) = self.distance_meters {
            if !distance.is_finite() || distance < 0.0 {
                return Err(SyncError::Validation(format!(
                    "distance_meters {} for {} must be a non-negative number",
                    distance, self.date
                )));
            }
        }

        if self.date > today {
            return Err(SyncError::Validation(format!(
                "date {} is in the future (today is {})",
                self.date, today
            )));
        }

        Ok(())
    }
}

/// Per-entry error reported by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryError {
    /// Day the error refers to, when the gateway says
    #[serde(default)]
    pub date: Option<NaiveDate>,

    /// Error message
    pub message: String,
}

/// Outcome of one gateway call
///
/// Transient; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncBatchResult {
    /// Entries inserted as new records
    pub created: usize,

    /// Entries that overwrote an existing record
    pub updated: usize,

    /// Entries the gateway accounted for
    pub total: usize,

    /// Per-entry errors on partial failure
    #[serde(default)]
    pub errors: Vec<EntryError>,
}

impl SyncBatchResult {
    /// Whether the result unambiguously confirms every one of `submitted` entries
    ///
    /// Anything short of that is treated as a partial failure and the whole
    /// chunk is re-queued.
    pub fn is_clean_for(&self, submitted: usize) -> bool {
        self.errors.is_empty()
            && self.total == submitted
            && self.created + self.updated == submitted
    }

    /// Number of entries the gateway claims to have applied
    pub fn applied(&self) -> usize {
        self.created + self.updated
    }
}
