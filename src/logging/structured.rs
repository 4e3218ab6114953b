//! Subscriber setup for the sync binary
//!
//! Console output goes to stderr so `--json` command output on stdout stays
//! machine-readable. The optional file log is one flattened JSON object per
//! line, each carrying the enclosing `sync_run` span (`run_id`, `trigger`), so
//! every line of a background run can be grouped without parsing messages.
//!
//! # Example
//!
//! ```no_run
//! use stepsync::logging::init_logging;
//! use stepsync::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//! ```

use crate::config::LoggingConfig;
use crate::domain::{Result, SyncError};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// File name inside `logging.local_path`; the appender adds a date suffix
/// unless rotation is `never`
pub const LOG_FILE_NAME: &str = "stepsync.log";

/// Flushes the file log when dropped; keep it alive until exit
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize console logging plus the JSON file log if `config` enables it
///
/// `RUST_LOG` overrides `log_level` when set.
///
/// # Errors
///
/// Returns a configuration error for an unknown level or a log directory that
/// cannot be created.
pub fn init_logging(log_level: &str, config: &LoggingConfig) -> Result<LoggingGuard> {
    let filter = build_filter(log_level)?;

    let console = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(filter.clone())
        .boxed();

    let mut file_guard = None;
    let file = if config.local_enabled {
        std::fs::create_dir_all(&config.local_path).map_err(|e| {
            SyncError::Configuration(format!(
                "Failed to create log directory {}: {e}",
                config.local_path
            ))
        })?;

        let appender = RollingFileAppender::new(
            parse_rotation(&config.local_rotation),
            &config.local_path,
            LOG_FILE_NAME,
        );
        let (writer, guard) = tracing_appender::non_blocking(appender);
        file_guard = Some(guard);

        // CLOSE records how long each sync_run span was busy.
        Some(
            tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_span_list(false)
                .with_span_events(FmtSpan::CLOSE)
                .with_writer(writer)
                .with_filter(filter)
                .boxed(),
        )
    } else {
        None
    };

    tracing_subscriber::registry().with(console).with(file).init();

    tracing::info!(
        file_log = config.local_enabled,
        path = %config.local_path,
        rotation = %config.local_rotation,
        "Logging initialized"
    );

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Console-only logging for the short interactive commands
///
/// # Errors
///
/// Returns a configuration error for an unknown level.
pub fn init_console_logging(log_level: &str) -> Result<LoggingGuard> {
    let config = LoggingConfig {
        local_enabled: false,
        ..LoggingConfig::default()
    };
    init_logging(log_level, &config)
}

fn build_filter(log_level: &str) -> Result<EnvFilter> {
    let level = parse_log_level(log_level)?;
    Ok(EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("stepsync={level}"))))
}

fn parse_rotation(rotation: &str) -> Rotation {
    match rotation {
        "hourly" => Rotation::HOURLY,
        "never" => Rotation::NEVER,
        _ => Rotation::DAILY,
    }
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(SyncError::Configuration(format!(
            "Invalid log level: {level}. Must be one of: trace, debug, info, warn, error"
        ))),
    }
}
