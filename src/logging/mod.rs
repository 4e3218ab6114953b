//! Logging and observability
//!
//! Console logs on stderr, an optional rotating JSON file log, and the
//! `log_*!` macros the orchestrator uses for its lifecycle events.
//!
//! # Example
//!
//! ```no_run
//! use stepsync::logging::init_logging;
//! use stepsync::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_console_logging, init_logging, LoggingGuard, LOG_FILE_NAME};

/// Log the start of a sync run
///
/// # Example
///
/// ```no_run
/// use stepsync::log_sync_start;
/// use stepsync::core::sync::SyncTrigger;
///
/// let run_id = uuid::Uuid::new_v4();
/// log_sync_start!(run_id, SyncTrigger::Manual, 31usize);
/// ```
#[macro_export]
macro_rules! log_sync_start {
    ($run_id:expr, $trigger:expr, $days:expr) => {
        tracing::info!(
            run_id = %$run_id,
            trigger = %$trigger,
            window_days = $days,
            "Starting sync"
        );
    };
}

/// Log the result of one gateway chunk
///
/// # Example
///
/// ```no_run
/// use stepsync::log_chunk_result;
///
/// let run_id = uuid::Uuid::new_v4();
/// log_chunk_result!(run_id, 1usize, 2usize, 31usize, true);
/// ```
#[macro_export]
macro_rules! log_chunk_result {
    ($run_id:expr, $chunk:expr, $chunks:expr, $days:expr, $ok:expr) => {
        if $ok {
            tracing::info!(
                run_id = %$run_id,
                chunk = $chunk,
                chunks = $chunks,
                days = $days,
                "Chunk synced"
            );
        } else {
            tracing::warn!(
                run_id = %$run_id,
                chunk = $chunk,
                chunks = $chunks,
                days = $days,
                "Chunk failed, days queued for retry"
            );
        }
    };
}

/// Log what the retry policy decided
///
/// # Example
///
/// ```no_run
/// use stepsync::log_retry_decision;
/// use stepsync::core::retry::RetryDecision;
///
/// log_retry_decision!(2u32, RetryDecision::Defer);
/// ```
#[macro_export]
macro_rules! log_retry_decision {
    ($failed_attempts:expr, $decision:expr) => {
        tracing::info!(
            failed_attempts = $failed_attempts,
            decision = %$decision,
            "Retry policy decision"
        );
    };
}
