//! Remote sync gateway trait definition

use crate::domain::{Result, StepDayEntry, SyncBatchResult, SyncError, MAX_BATCH_ENTRIES};
use async_trait::async_trait;

/// Client for the remote step store's batch upsert endpoint
///
/// The remote store keys entries by `(user, date, source)`. Submitting an entry
/// for an existing key overwrites it in place, so resubmitting a batch is safe.
#[async_trait]
pub trait SyncGateway: Send + Sync {
    /// Upsert up to [`MAX_BATCH_ENTRIES`] day entries
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Validation`] for an oversized batch and
    /// [`SyncError::Gateway`] for transport or server failures.
    async fn sync_batch(&self, entries: &[StepDayEntry]) -> Result<SyncBatchResult>;

    /// Short gateway name for logs
    fn name(&self) -> &str;
}

/// Reject batches the remote endpoint would refuse
pub(crate) fn check_batch_size(entries: &[StepDayEntry]) -> Result<()> {
    if entries.len() > MAX_BATCH_ENTRIES {
        return Err(SyncError::Validation(format!(
            "batch of {} entries exceeds the limit of {}",
            entries.len(),
            MAX_BATCH_ENTRIES
        )));
    }
    Ok(())
}
