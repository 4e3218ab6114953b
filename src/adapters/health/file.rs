//! File-backed health data provider
//!
//! Reads a JSON export of daily step samples. Stands in for the platform
//! health store when the core runs from the command line.
//!
//! ```json
//! [
//!   { "date": "2024-03-01", "step_count": 8500, "distance_meters": 6120.5, "source": "healthkit" },
//!   { "date": "2024-03-02", "step_count": 0 }
//! ]
//! ```
//!
//! A sample without `source` belongs to whichever source is requested.

use super::traits::HealthDataProvider;
use crate::domain::ids::SourceId;
use crate::domain::{Result, StepDayEntry, SyncError};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct HealthSample {
    date: NaiveDate,
    step_count: i64,
    #[serde(default)]
    distance_meters: Option<f64>,
    #[serde(default)]
    source: Option<String>,
}

/// Health data provider reading a JSON sample export
pub struct FileHealthProvider {
    path: PathBuf,
}

impl FileHealthProvider {
    /// Create a provider reading `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_samples(&self) -> Result<Vec<HealthSample>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No health sample file, nothing to sync");
                return Ok(Vec::new());
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                return Err(SyncError::PermissionDenied(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )))
            }
            Err(e) => {
                return Err(SyncError::Provider(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            SyncError::Provider(format!(
                "invalid health sample file {}: {e}",
                self.path.display()
            ))
        })
    }
}

#[async_trait]
impl HealthDataProvider for FileHealthProvider {
    async fn get_step_data(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        source: &SourceId,
    ) -> Result<Vec<StepDayEntry>> {
        let samples = self.read_samples().await?;
        let total = samples.len();

        let entries: Vec<StepDayEntry> = samples
            .into_iter()
            .filter(|s| s.date >= start && s.date <= end)
            .filter(|s| s.source.as_deref().map_or(true, |src| src == source.as_str()))
            .map(|s| StepDayEntry {
                date: s.date,
                step_count: s.step_count,
                distance_meters: s.distance_meters,
                source: source.clone(),
            })
            .collect();

        tracing::debug!(
            path = %self.path.display(),
            %start,
            %end,
            total,
            matched = entries.len(),
            "Read health samples"
        );

        Ok(entries)
    }

    fn name(&self) -> &str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn source() -> SourceId {
        SourceId::new("healthkit").unwrap()
    }

    #[tokio::test]
    async fn test_reads_and_filters() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"date": "2024-03-01", "step_count": 100}},
                {{"date": "2024-03-02", "step_count": 200, "distance_meters": 150.0, "source": "healthkit"}},
                {{"date": "2024-03-03", "step_count": 300, "source": "fitbit"}},
                {{"date": "2024-03-09", "step_count": 900}}
            ]"#
        )
        .unwrap();

        let provider = FileHealthProvider::new(file.path());
        let entries = provider
            .get_step_data(day(1), day(5), &source())
            .await
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].date, day(1));
        assert_eq!(entries[1].distance_meters, Some(150.0));
        assert!(entries.iter().all(|e| e.source == source()));
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let provider = FileHealthProvider::new(dir.path().join("absent.json"));
        let entries = provider
            .get_step_data(day(1), day(5), &source())
            .await
            .unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_json_is_provider_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let provider = FileHealthProvider::new(file.path());
        let err = provider
            .get_step_data(day(1), day(5), &source())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Provider(_)));
    }
}
