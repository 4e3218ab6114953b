//! Reset command implementation
//!
//! Clears the persisted sync state back to defaults. This is what the owner of
//! the tracking toggle does when the user switches tracking off.

use super::load_or_report;
use crate::adapters::state::create_state_storage;
use crate::core::state::StateManager;
use clap::Args;

/// Arguments for the reset command
#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl ResetArgs {
    /// Execute the reset command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Resetting sync state");

        let config = match load_or_report(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        let state_manager = match create_state_storage(&config).await {
            Ok(s) => StateManager::new_with_storage(s),
            Err(e) => {
                println!("❌ Failed to open sync state");
                println!("   Error: {e}");
                return Ok(5);
            }
        };

        if !self.yes {
            print!(
                "Clear sync state at {}? The next sync starts from scratch. [y/N]: ",
                state_manager.location()
            );
            use std::io::{self, Write};
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Reset cancelled.");
                return Ok(0);
            }
        }

        match state_manager.reset().await {
            Ok(()) => {
                println!("✅ Sync state cleared");
                Ok(0)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to reset sync state");
                println!("❌ Failed to reset sync state");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }
}
