//! Status command implementation
//!
//! This module implements the `status` command for displaying the persisted
//! sync state and the staleness signal.

use super::load_or_report;
use crate::adapters::state::create_state_storage;
use crate::core::state::StateManager;
use clap::Args;
use serde_json::json;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print the state as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking sync status");

        let config = match load_or_report(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        let state_storage = match create_state_storage(&config).await {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Failed to open sync state");
                println!("   Error: {e}");
                return Ok(5);
            }
        };

        let state_manager = StateManager::new_with_storage(state_storage);

        let state = match state_manager.read().await {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Failed to load sync state");
                println!("   Error: {e}");
                return Ok(5);
            }
        };

        let threshold = chrono::Duration::hours(
            i64::try_from(config.sync.stale_after_hours).unwrap_or(i64::MAX / 3600),
        );
        let report = state.staleness(chrono::Utc::now(), threshold);

        if self.json {
            let value = json!({
                "location": state_manager.location(),
                "tracking_enabled": config.tracking.enabled,
                "state": state,
                "is_stale": report.is_stale,
                "age_seconds": report.age.map(|a| a.num_seconds()),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
            return Ok(0);
        }

        println!("📊 Sync Status");
        println!();
        println!("  State: {}", state_manager.location());
        println!(
            "  Tracking: {}",
            if config.tracking.enabled { "enabled" } else { "disabled" }
        );
        println!("  Last status: {}", report.last_sync_status);
        match report.last_sync_timestamp {
            Some(ts) => println!(
                "  Last sync: {} ({})",
                ts.format("%Y-%m-%d %H:%M:%S UTC"),
                report.describe_age()
            ),
            None => println!("  Last sync: never"),
        }
        println!("  Failed attempts: {}", state.failed_attempts);
        if let Some(kind) = report.last_failure_kind {
            println!(
                "  Last failure: {kind} ({})",
                state.last_error.as_deref().unwrap_or("no message")
            );
        }
        println!("  Pending days: {}", report.pending_days);
        if !state.pending_days.is_empty() {
            let days: Vec<String> = state
                .pending_days
                .iter()
                .take(10)
                .map(|d| d.to_string())
                .collect();
            println!("    {}", days.join(", "));
        }
        if let Some(since) = state.in_progress_since {
            println!("  🔄 In progress since {}", since.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        println!();

        if report.is_stale {
            println!("⚠️  Sync data is stale");
        } else {
            println!("✅ Sync data is fresh");
        }
        println!();

        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_status_without_state_file() {
        let dir = tempfile::tempdir().unwrap();
        let state_path = dir.path().join("state.json");

        let mut config = NamedTempFile::new().unwrap();
        write!(
            config,
            r#"
[tracking]
user_id = "user-1"

[gateway]
base_url = "https://steps.example.com"

[state]
path = "{}"
"#,
            state_path.display()
        )
        .unwrap();

        let args = StatusArgs { json: true };
        let code = args.execute(config.path().to_str().unwrap()).await.unwrap();
        assert_eq!(code, 0);
        assert!(!state_path.exists());
    }
}
