//! Core sync logic for stepsync.
//!
//! # Modules
//!
//! - [`clock`] - wall clock abstraction
//! - [`retry`] - fast-retry policy
//! - [`state`] - persisted sync state and the in-progress marker
//! - [`sync`] - the sync orchestrator and retry loop
//!
//! # Sync Workflow
//!
//! 1. **Acquire**: Skip if another run holds a fresh in-progress marker
//! 2. **Plan**: Days since the last sync point, plus queued retry days
//! 3. **Fetch**: Daily aggregates from the health data provider
//! 4. **Chunk**: At most 31 days per gateway call, newest first
//! 5. **Send**: Upsert each chunk; checkpoint state after every chunk
//! 6. **Record**: Outcome, retry decision, release the marker

pub mod clock;
pub mod retry;
pub mod state;
pub mod sync;
