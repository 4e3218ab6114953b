//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "stepsync.toml")]
    pub output: String,

    /// Include every option with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing stepsync configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your user id and gateway URL", self.output);
                println!("  2. Put STEPSYNC_API_KEY in a .env file or the environment");
                println!("  3. Validate configuration: stepsync validate-config");
                println!("  4. Try a dry run: stepsync sync --dry-run");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# stepsync configuration

environment = "development"

[tracking]
enabled = true
user_id = "user-42"
source = "healthkit"

[gateway]
base_url = "https://steps.example.com"
api_key = "${STEPSYNC_API_KEY}"

[state]
path = "stepsync_state.json"

[logging]
local_enabled = true
local_path = "logs"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# stepsync configuration
#
# Every option with its default. Values of the form ${VAR} are read from the
# environment; STEPSYNC_<SECTION>_<KEY> variables override file values.

# development | staging | production (production requires an https gateway)
environment = "development"

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# Dry run mode (in-memory gateway, state is read but never written)
dry_run = false

# ============================================================================
# Tracking
# ============================================================================
[tracking]
# Switching tracking off turns every sync into a no-op
enabled = true

# Account the steps belong to
user_id = "user-42"

# Health backend the daily counts come from
source = "healthkit"

# ============================================================================
# Health Data Provider
# ============================================================================
[health]
# JSON array of {"date", "step_count", "distance_meters", "source"} objects
samples_path = "step_samples.json"

# ============================================================================
# Remote Sync Gateway
# ============================================================================
[gateway]
base_url = "https://steps.example.com"

# Bearer API key (use environment variable)
api_key = "${STEPSYNC_API_KEY}"

# Per-request timeout in seconds
timeout_seconds = 15

# ============================================================================
# Sync Window and Limits
# ============================================================================
[sync]
# Days requested on the very first sync (1-90)
backfill_days = 30

# Days per gateway call (1-31)
max_batch_entries = 31

# Execution window of one run, in seconds
run_deadline_seconds = 25

# An in-progress marker older than this belongs to a dead run
in_progress_timeout_seconds = 120

# Age after which the last sync counts as stale
stale_after_hours = 24

# ============================================================================
# Fast Retry
# ============================================================================
[retry]
# Delay before each in-process retry; the number of entries is the budget
fast_retry_delays_minutes = [5, 10, 15]

# ============================================================================
# Sync State
# ============================================================================
[state]
path = "stepsync_state.json"

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Enable local file logging
local_enabled = true

# Local log directory
local_path = "logs"

# Log rotation (daily, hourly or never)
local_rotation = "daily"
"#
        .to_string()
    }
}
