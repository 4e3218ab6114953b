//! Background step sync
//!
//! - [`SyncOrchestrator`] - one run: plan, fetch, chunk, send, record
//! - [`RetryReport`] - runs made by the in-process fast-retry loop
//! - [`SyncWindow`] - which days a run covers
//! - [`SyncSummary`] - what a run did
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stepsync::adapters::gateway::MemoryGateway;
//! use stepsync::adapters::health::FileHealthProvider;
//! use stepsync::adapters::state::MemoryStateStorage;
//! use stepsync::core::state::StateManager;
//! use stepsync::core::sync::{SyncOrchestrator, SyncSettings, SyncTrigger};
//! use stepsync::domain::{SourceId, UserId};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = SourceId::new("healthkit")?;
//! let orchestrator = SyncOrchestrator::new(
//!     SyncSettings::new(source),
//!     Arc::new(FileHealthProvider::new("step_samples.json")),
//!     Arc::new(MemoryGateway::new(UserId::new("user-42")?)),
//!     Arc::new(StateManager::new_with_storage(Arc::new(MemoryStateStorage::new()))),
//! );
//!
//! let summary = orchestrator.run_sync(SyncTrigger::Manual).await?;
//! println!("{} of {} days synced", summary.days_succeeded, summary.days_attempted);
//! # Ok(())
//! # }
//! ```

pub mod orchestrator;
pub mod runner;
pub mod summary;
pub mod trigger;
pub mod window;

pub use orchestrator::{SyncOrchestrator, SyncSettings};
pub use runner::RetryReport;
pub use summary::{SyncOutcome, SyncSummary};
pub use trigger::SyncTrigger;
pub use window::{chunk_entries, prepare_entries, PreparedEntries, SyncWindow};
