//! CLI command implementations
//!
//! Every command returns the process exit code:
//! 0 success, 1 sync failed, 2 configuration error, 5 fatal error,
//! 130 interrupted by a signal.

pub mod init;
pub mod reset;
pub mod status;
pub mod sync;
pub mod validate;

use crate::config::{load_config, StepSyncConfig};

/// Load configuration, printing the failure the way every command does
pub(crate) fn load_or_report(config_path: &str) -> Result<StepSyncConfig, i32> {
    load_config(config_path).map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        println!("❌ Failed to load configuration file");
        println!("   Error: {e}");
        2
    })
}
