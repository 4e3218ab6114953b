//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::StepSyncConfig;
use super::secret::secret_string;
use crate::domain::errors::SyncError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into StepSyncConfig
/// 4. Applies environment variable overrides (STEPSYNC_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use stepsync::config::loader::load_config;
///
/// let config = load_config("stepsync.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<StepSyncConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(SyncError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        SyncError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text
///
/// Same pipeline as [`load_config`] minus the file read.
///
/// # Errors
///
/// Returns an error if substitution, parsing or validation fails.
pub fn parse_config(contents: &str) -> Result<StepSyncConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: StepSyncConfig = toml::from_str(&contents)
        .map_err(|e| SyncError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        SyncError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| SyncError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        let trimmed = line.trim_start();

        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(SyncError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(variable = name, value = %raw, "Ignoring unparseable override");
            None
        }
    }
}

/// Applies environment variable overrides using STEPSYNC_* prefix
///
/// Environment variables follow the pattern: STEPSYNC_<SECTION>_<KEY>
/// For example: STEPSYNC_GATEWAY_BASE_URL, STEPSYNC_SYNC_BACKFILL_DAYS
fn apply_env_overrides(config: &mut StepSyncConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("STEPSYNC_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Some(val) = env_parse("STEPSYNC_APPLICATION_DRY_RUN") {
        config.application.dry_run = val;
    }

    // Tracking overrides
    if let Some(val) = env_parse("STEPSYNC_TRACKING_ENABLED") {
        config.tracking.enabled = val;
    }
    if let Ok(val) = std::env::var("STEPSYNC_TRACKING_USER_ID") {
        config.tracking.user_id = val;
    }
    if let Ok(val) = std::env::var("STEPSYNC_TRACKING_SOURCE") {
        config.tracking.source = val;
    }

    // Health overrides
    if let Ok(val) = std::env::var("STEPSYNC_HEALTH_SAMPLES_PATH") {
        config.health.samples_path = val;
    }

    // Gateway overrides
    if let Ok(val) = std::env::var("STEPSYNC_GATEWAY_BASE_URL") {
        config.gateway.base_url = val;
    }
    if let Ok(val) = std::env::var("STEPSYNC_GATEWAY_API_KEY") {
        config.gateway.api_key = Some(secret_string(val));
    }
    if let Some(val) = env_parse("STEPSYNC_GATEWAY_TIMEOUT_SECONDS") {
        config.gateway.timeout_seconds = val;
    }

    // Sync overrides
    if let Some(val) = env_parse("STEPSYNC_SYNC_BACKFILL_DAYS") {
        config.sync.backfill_days = val;
    }
    if let Some(val) = env_parse("STEPSYNC_SYNC_MAX_BATCH_ENTRIES") {
        config.sync.max_batch_entries = val;
    }
    if let Some(val) = env_parse("STEPSYNC_SYNC_RUN_DEADLINE_SECONDS") {
        config.sync.run_deadline_seconds = val;
    }

    // State overrides
    if let Ok(val) = std::env::var("STEPSYNC_STATE_PATH") {
        config.state.path = val;
    }

    // Logging overrides
    if let Some(val) = env_parse("STEPSYNC_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val;
    }
    if let Ok(val) = std::env::var("STEPSYNC_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}
