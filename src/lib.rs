// stepsync - Background step-count sync
// Copyright (c) 2025 Stepsync Contributors
// Licensed under the MIT License

//! # stepsync - background step-count sync
//!
//! stepsync keeps a remote step store in line with the daily step counts a
//! device's health store records. It is the core a background scheduler wakes
//! up: each run reads persisted state, decides which days to send, pushes them
//! in bounded chunks, and records what happened so the next run can resume.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Sync orchestration, retry policy, sync state
//! - [`adapters`] - Health data providers, sync gateways, state storage
//! - [`domain`] - Day entries, identifiers and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stepsync::config::load_config;
//! use stepsync::core::sync::{SyncOrchestrator, SyncTrigger};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("stepsync.toml")?;
//!     let (_stop_tx, stop_rx) = tokio::sync::watch::channel(false);
//!
//!     let orchestrator = SyncOrchestrator::from_config(&config, stop_rx).await?;
//!     let summary = orchestrator.run_sync(SyncTrigger::Scheduled).await?;
//!
//!     println!("{}: {} days synced", summary.outcome, summary.days_succeeded);
//!     Ok(())
//! }
//! ```
//!
//! ## Sync Guarantees
//!
//! - The sync point never moves backwards, and only moves over days the
//!   gateway confirmed.
//! - A day that was sent without confirmation stays queued in the pending set
//!   until a later run confirms it.
//! - At most one run is active at a time; an abandoned in-progress marker is
//!   taken over once it is older than the configured timeout.
//! - Every gateway call carries at most 31 days and is an idempotent upsert.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
