//! File-backed sync state storage
//!
//! The record is a single JSON document. Writes go to a sibling temporary file
//! that is then renamed over the target, so a reader sees either the old record
//! or the new one and never a torn write.

use super::traits::StateStorage;
use crate::core::state::SyncState;
use crate::domain::{Result, SyncError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// JSON file state storage
pub struct FileStateStorage {
    path: PathBuf,
    io_lock: Mutex<()>,
}

impl FileStateStorage {
    /// Create a new file storage for `path`
    ///
    /// The file does not need to exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            io_lock: Mutex::new(()),
        }
    }

    /// Path of the state file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "sync_state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl StateStorage for FileStateStorage {
    async fn load(&self) -> Result<Option<SyncState>> {
        let _guard = self.io_lock.lock().await;

        let contents = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No sync state file yet");
                return Ok(None);
            }
            Err(e) => {
                return Err(SyncError::State(format!(
                    "Failed to read sync state {}: {e}",
                    self.path.display()
                )))
            }
        };

        let state = serde_json::from_slice(&contents).map_err(|e| {
            SyncError::State(format!(
                "Corrupt sync state {}: {e}",
                self.path.display()
            ))
        })?;

        Ok(Some(state))
    }

    async fn save(&self, state: &SyncState) -> Result<()> {
        let _guard = self.io_lock.lock().await;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_vec_pretty(state)?;
        let temp = self.temp_path();

        tokio::fs::write(&temp, &json).await.map_err(|e| {
            SyncError::State(format!("Failed to write {}: {e}", temp.display()))
        })?;
        tokio::fs::rename(&temp, &self.path).await.map_err(|e| {
            SyncError::State(format!(
                "Failed to replace sync state {}: {e}",
                self.path.display()
            ))
        })?;

        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let _guard = self.io_lock.lock().await;

        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SyncError::State(format!(
                "Failed to remove sync state {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_loads_none() {
        let dir = TempDir::new().unwrap();
        let storage = FileStateStorage::new(dir.path().join("state.json"));
        assert!(storage.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let storage = FileStateStorage::new(dir.path().join("nested").join("state.json"));

        let mut state = SyncState::default();
        state.failed_attempts = 2;
        state
            .pending_days
            .insert(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        storage.save(&state).await.unwrap();
        let loaded = storage.load().await.unwrap().unwrap();
        assert_eq!(loaded, state);

        // Temp file must not linger after the rename
        assert!(!storage.temp_path().exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"{not json").unwrap();

        let storage = FileStateStorage::new(&path);
        let err = storage.load().await.unwrap_err();
        assert!(matches!(err, SyncError::State(_)));
    }

    #[tokio::test]
    async fn test_clear() {
        let dir = TempDir::new().unwrap();
        let storage = FileStateStorage::new(dir.path().join("state.json"));

        storage.save(&SyncState::default()).await.unwrap();
        storage.clear().await.unwrap();
        assert!(storage.load().await.unwrap().is_none());

        // Clearing twice is fine
        storage.clear().await.unwrap();
    }
}
