//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the stepsync configuration file.

use super::load_or_report;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates every section
        let config = match load_or_report(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Environment: {:?}", config.environment);
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dry Run: {}", config.application.dry_run);
        println!("  Tracking: {}", if config.tracking.enabled { "enabled" } else { "disabled" });
        println!("  User: {}", config.tracking.user_id);
        println!("  Source: {}", config.tracking.source);
        println!("  Samples: {}", config.health.samples_path);
        println!("  Gateway: {}", config.gateway.base_url);
        println!(
            "  API Key: {}",
            if config.gateway.api_key.is_some() { "set" } else { "not set" }
        );
        println!("  Backfill Days: {}", config.sync.backfill_days);
        println!("  Batch Size: {}", config.sync.max_batch_entries);
        println!("  Run Deadline: {}s", config.sync.run_deadline_seconds);
        println!("  Fast Retries (min): {:?}", config.retry.fast_retry_delays_minutes);
        println!("  State File: {}", config.state.path);
        println!();
        Ok(0)
    }
}
