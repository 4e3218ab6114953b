//! External system integrations for stepsync.
//!
//! - [`health`] - health data providers (platform store stand-ins)
//! - [`gateway`] - remote sync gateway (HTTP and in-memory)
//! - [`state`] - local persistence for sync state
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies and
//! enable testing with in-memory implementations. The orchestrator only sees
//! the [`HealthDataProvider`](health::HealthDataProvider),
//! [`SyncGateway`](gateway::SyncGateway) and
//! [`StateStorage`](state::StateStorage) traits.
//!
//! ```rust,no_run
//! use stepsync::adapters::gateway::{MemoryGateway, SyncGateway};
//! use stepsync::domain::ids::{SourceId, UserId};
//! use stepsync::domain::StepDayEntry;
//! use chrono::NaiveDate;
//!
//! # async fn example() -> stepsync::domain::Result<()> {
//! let gateway = MemoryGateway::new(UserId::new("user-1").unwrap());
//! let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! let entry = StepDayEntry::new(day, 8_000, SourceId::new("healthkit").unwrap());
//!
//! let result = gateway.sync_batch(&[entry]).await?;
//! assert_eq!(result.created, 1);
//! # Ok(())
//! # }
//! ```

pub mod gateway;
pub mod health;
pub mod state;
