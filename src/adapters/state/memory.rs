//! In-memory sync state storage, used by tests and dry runs

use super::traits::StateStorage;
use crate::core::state::SyncState;
use crate::domain::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Volatile state storage
#[derive(Default)]
pub struct MemoryStateStorage {
    state: RwLock<Option<SyncState>>,
}

impl MemoryStateStorage {
    /// Create an empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage that already holds `state`
    pub fn with_state(state: SyncState) -> Self {
        Self {
            state: RwLock::new(Some(state)),
        }
    }
}

#[async_trait]
impl StateStorage for MemoryStateStorage {
    async fn load(&self) -> Result<Option<SyncState>> {
        Ok(self.state.read().await.clone())
    }

    async fn save(&self, state: &SyncState) -> Result<()> {
        *self.state.write().await = Some(state.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.state.write().await = None;
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
