//! Domain models and types for stepsync.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`SourceId`], [`UserId`])
//! - **Day-level step data** ([`StepDayEntry`], [`SyncBatchResult`])
//! - **Error types** ([`SyncError`], [`GatewayError`], [`FailureKind`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, SyncError>`]. Each error maps onto
//! a [`FailureKind`], which is what gets persisted and what the retry policy
//! looks at:
//!
//! ```rust
//! use stepsync::domain::{FailureKind, SyncError};
//!
//! let err = SyncError::PermissionDenied("health access revoked".to_string());
//! assert_eq!(err.kind(), FailureKind::Permission);
//! assert!(!err.kind().is_fast_retryable());
//! ```

pub mod entry;
pub mod errors;
pub mod ids;
pub mod result;

// Re-export commonly used types for convenience
pub use entry::{EntryError, StepDayEntry, SyncBatchResult, MAX_BATCH_ENTRIES, MAX_DAILY_STEPS};
pub use errors::{FailureKind, GatewayError, SyncError};
pub use ids::{SourceId, UserId};
pub use result::Result;
