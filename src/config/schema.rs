//! Configuration schema types
//!
//! This module defines the configuration structure for stepsync. Every section
//! maps onto a TOML table and validates itself.

use crate::config::SecretString;
use crate::domain::ids::{SourceId, UserId};
use crate::domain::MAX_BATCH_ENTRIES;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

/// Largest backfill window a cold start may request
pub const MAX_BACKFILL_DAYS: u32 = 90;

/// Runtime environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment
    #[default]
    Development,
    /// Staging environment
    Staging,
    /// Production environment
    Production,
}

/// Main stepsync configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSyncConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: Environment,

    /// Tracking enablement and identity
    pub tracking: TrackingConfig,

    /// Health data provider settings
    #[serde(default)]
    pub health: HealthConfig,

    /// Remote sync gateway settings
    pub gateway: GatewayConfig,

    /// Sync windowing and execution limits
    #[serde(default)]
    pub sync: SyncConfig,

    /// Fast-retry policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// Local sync state persistence
    #[serde(default)]
    pub state: StateConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StepSyncConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.tracking.validate()?;
        self.health.validate()?;
        self.gateway.validate(&self.environment)?;
        self.sync.validate()?;
        self.retry.validate()?;
        self.state.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dry run mode (in-memory gateway, state file left untouched)
    #[serde(default)]
    pub dry_run: bool,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

/// Tracking enablement and identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Whether step tracking is switched on; a disabled run is a no-op
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// User the remote records belong to
    pub user_id: String,

    /// Health backend the steps come from
    #[serde(default = "default_source")]
    pub source: String,
}

impl TrackingConfig {
    fn validate(&self) -> Result<(), String> {
        UserId::new(self.user_id.clone()).map_err(|e| format!("tracking.user_id: {e}"))?;
        SourceId::new(self.source.clone()).map_err(|e| format!("tracking.source: {e}"))?;
        Ok(())
    }

    /// Parsed source identifier
    ///
    /// # Errors
    ///
    /// Returns an error if the source is empty or too long.
    pub fn source_id(&self) -> Result<SourceId, String> {
        SourceId::new(self.source.clone())
    }
}

/// Health data provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// JSON export of daily step samples
    #[serde(default = "default_samples_path")]
    pub samples_path: String,
}

impl HealthConfig {
    fn validate(&self) -> Result<(), String> {
        if self.samples_path.trim().is_empty() {
            return Err("health.samples_path cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            samples_path: default_samples_path(),
        }
    }
}

/// Remote sync gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the remote step store
    pub base_url: String,

    /// Bearer API key
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl GatewayConfig {
    fn validate(&self, environment: &Environment) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("gateway.base_url cannot be empty".to_string());
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("gateway.base_url must start with http:// or https://".to_string());
        }

        if *environment == Environment::Production && !self.base_url.starts_with("https://") {
            return Err("gateway.base_url must use https:// in production".to_string());
        }

        if self.timeout_seconds == 0 {
            return Err("gateway.timeout_seconds must be > 0".to_string());
        }

        if self.api_key.as_ref().is_some_and(|k| k.expose_secret().is_blank()) {
            return Err("gateway.api_key is set but empty".to_string());
        }

        Ok(())
    }
}

/// Sync windowing and execution limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Days requested on a cold start
    #[serde(default = "default_backfill_days")]
    pub backfill_days: u32,

    /// Entries per gateway call
    #[serde(default = "default_max_batch_entries")]
    pub max_batch_entries: usize,

    /// Outer deadline for one run
    #[serde(default = "default_run_deadline_seconds")]
    pub run_deadline_seconds: u64,

    /// Age after which an in-progress marker is considered abandoned
    #[serde(default = "default_in_progress_timeout_seconds")]
    pub in_progress_timeout_seconds: u64,

    /// Age after which the last sync counts as stale
    #[serde(default = "default_stale_after_hours")]
    pub stale_after_hours: u64,
}

impl SyncConfig {
    fn validate(&self) -> Result<(), String> {
        if self.backfill_days == 0 || self.backfill_days > MAX_BACKFILL_DAYS {
            return Err(format!(
                "sync.backfill_days must be between 1 and {MAX_BACKFILL_DAYS}"
            ));
        }

        if self.max_batch_entries == 0 || self.max_batch_entries > MAX_BATCH_ENTRIES {
            return Err(format!(
                "sync.max_batch_entries must be between 1 and {MAX_BATCH_ENTRIES}"
            ));
        }

        if self.run_deadline_seconds == 0 {
            return Err("sync.run_deadline_seconds must be > 0".to_string());
        }

        if self.in_progress_timeout_seconds == 0 {
            return Err("sync.in_progress_timeout_seconds must be > 0".to_string());
        }

        // A marker younger than the longest possible run must never look abandoned.
        if self.run_deadline_seconds >= self.in_progress_timeout_seconds {
            return Err(format!(
                "sync.run_deadline_seconds ({}) must be less than sync.in_progress_timeout_seconds ({})",
                self.run_deadline_seconds, self.in_progress_timeout_seconds
            ));
        }

        if self.stale_after_hours == 0 {
            return Err("sync.stale_after_hours must be > 0".to_string());
        }

        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            backfill_days: default_backfill_days(),
            max_batch_entries: default_max_batch_entries(),
            run_deadline_seconds: default_run_deadline_seconds(),
            in_progress_timeout_seconds: default_in_progress_timeout_seconds(),
            stale_after_hours: default_stale_after_hours(),
        }
    }
}

/// Fast-retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Delay before each fast retry, in minutes; the length is the budget
    #[serde(default = "default_fast_retry_delays_minutes")]
    pub fast_retry_delays_minutes: Vec<u64>,
}

impl RetryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.fast_retry_delays_minutes.is_empty() {
            return Err("retry.fast_retry_delays_minutes cannot be empty".to_string());
        }
        if self.fast_retry_delays_minutes.contains(&0) {
            return Err("retry.fast_retry_delays_minutes must all be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            fast_retry_delays_minutes: default_fast_retry_delays_minutes(),
        }
    }
}

/// Sync state persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// Path of the JSON state file
    #[serde(default = "default_state_path")]
    pub path: String,
}

impl StateConfig {
    fn validate(&self) -> Result<(), String> {
        if self.path.trim().is_empty() {
            return Err("state.path cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default = "default_true")]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: true,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_source() -> String {
    "healthkit".to_string()
}

fn default_samples_path() -> String {
    "step_samples.json".to_string()
}

fn default_timeout_seconds() -> u64 {
    15
}

fn default_backfill_days() -> u32 {
    30
}

fn default_max_batch_entries() -> usize {
    MAX_BATCH_ENTRIES
}

fn default_run_deadline_seconds() -> u64 {
    25
}

fn default_in_progress_timeout_seconds() -> u64 {
    120
}

fn default_stale_after_hours() -> u64 {
    24
}

fn default_fast_retry_delays_minutes() -> Vec<u64> {
    vec![5, 10, 15]
}

fn default_state_path() -> String {
    "stepsync_state.json".to_string()
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
