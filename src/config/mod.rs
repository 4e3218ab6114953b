//! Configuration management for stepsync.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! stepsync uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `STEPSYNC_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation of every section on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use stepsync::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("stepsync.toml")?;
//!
//! println!("Gateway: {}", config.gateway.base_url);
//! println!("Backfill: {} days", config.sync.backfill_days);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - log level and dry run
//! - [`TrackingConfig`] - enablement, user and source
//! - [`HealthConfig`] - health sample export location
//! - [`GatewayConfig`] - remote step store URL, API key and timeout
//! - [`SyncConfig`] - backfill window, batch size, deadlines
//! - [`RetryConfig`] - fast-retry delays
//! - [`StateConfig`] - sync state file
//! - [`LoggingConfig`] - file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [tracking]
//! user_id = "user-42"
//! source = "healthkit"
//!
//! [gateway]
//! base_url = "https://steps.example.com"
//! api_key = "${STEPSYNC_API_KEY}"
//!
//! [sync]
//! backfill_days = 30
//! run_deadline_seconds = 25
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, Environment, GatewayConfig, HealthConfig, LoggingConfig, RetryConfig,
    StateConfig, StepSyncConfig, SyncConfig, TrackingConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
