//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for stepsync using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// stepsync - background step-count sync
#[derive(Parser, Debug)]
#[command(name = "stepsync")]
#[command(version, about, long_about = None)]
#[command(author = "Stepsync Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "stepsync.toml", env = "STEPSYNC_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "STEPSYNC_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one sync of daily step counts to the remote store
    Sync(commands::sync::SyncArgs),

    /// Show sync state and staleness
    Status(commands::status::StatusArgs),

    /// Clear sync state, as when tracking is switched off
    Reset(commands::reset::ResetArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
