// Sync state model and manager

pub mod manager;
pub mod sync_state;

pub use manager::{Acquire, StateManager};
pub use sync_state::{StalenessReport, SyncState, SyncStatus};
