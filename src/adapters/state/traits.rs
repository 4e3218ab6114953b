//! State storage abstraction
//!
//! This module defines the trait that sync state backends must implement.

use crate::core::state::SyncState;
use crate::domain::Result;
use async_trait::async_trait;

/// State storage trait for sync state persistence
///
/// Purely local persistence: implementations must not touch the network.
/// `load` and `save` must never expose a partially written record to a
/// concurrent reader in the same process.
#[async_trait]
pub trait StateStorage: Send + Sync {
    /// Load the sync state
    ///
    /// # Returns
    ///
    /// Returns `Ok(Some(SyncState))` if a record exists, `Ok(None)` if nothing
    /// has been persisted yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the record exists but cannot be read or decoded.
    async fn load(&self) -> Result<Option<SyncState>>;

    /// Replace the persisted sync state
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    async fn save(&self, state: &SyncState) -> Result<()>;

    /// Remove the persisted record, so the next load returns `None`
    ///
    /// # Errors
    ///
    /// Returns an error if the record exists but cannot be removed.
    async fn clear(&self) -> Result<()>;

    /// Human-readable location of the record, for logs and status output
    fn location(&self) -> String;
}
