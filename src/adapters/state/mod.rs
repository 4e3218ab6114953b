//! Local persistence for sync state
//!
//! - [`FileStateStorage`] - JSON file with atomic replace
//! - [`MemoryStateStorage`] - volatile, for tests and dry runs

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileStateStorage;
pub use memory::MemoryStateStorage;
pub use traits::StateStorage;

use crate::config::StepSyncConfig;
use crate::domain::Result;
use std::sync::Arc;

/// Create the state storage selected by configuration
///
/// A dry run starts from a copy of the persisted record and keeps every change
/// in memory, so the state file is never written.
///
/// # Errors
///
/// Returns an error if a dry run cannot read the existing state file.
pub async fn create_state_storage(config: &StepSyncConfig) -> Result<Arc<dyn StateStorage>> {
    let file = FileStateStorage::new(&config.state.path);

    if config.application.dry_run {
        let snapshot = file.load().await?;
        tracing::info!(
            path = %config.state.path,
            has_state = snapshot.is_some(),
            "Dry run: sync state changes stay in memory"
        );
        return Ok(Arc::new(match snapshot {
            Some(state) => MemoryStateStorage::with_state(state),
            None => MemoryStateStorage::new(),
        }));
    }

    tracing::debug!(path = %config.state.path, "Using file sync state");
    Ok(Arc::new(file))
}
