//! Domain error types
//!
//! This module defines the error hierarchy for stepsync. Every error maps onto a
//! [`FailureKind`] so the retry policy can tell a transient network blip apart
//! from a revoked health permission or a malformed entry.
//! Errors are domain-specific and don't expose third-party types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main stepsync error type
///
/// This is the primary error type used throughout the crate.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A step entry failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Health data access was revoked or never granted
    #[error("Health data permission denied: {0}")]
    PermissionDenied(String),

    /// The health data provider failed for a reason other than permissions
    #[error("Health data provider error: {0}")]
    Provider(String),

    /// Remote sync gateway errors
    #[error("Sync gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// A single provider or gateway call exceeded its request timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// The whole run exceeded its execution window
    #[error("Sync deadline exceeded after {0} seconds")]
    DeadlineExceeded(u64),

    /// The invoking platform asked the run to stop
    #[error("Sync cancelled: {0}")]
    Cancelled(String),

    /// State store errors
    #[error("State store error: {0}")]
    State(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

impl SyncError {
    /// Classify this error for retry and reporting purposes
    pub fn kind(&self) -> FailureKind {
        match self {
            SyncError::PermissionDenied(_) => FailureKind::Permission,
            SyncError::Validation(_) => FailureKind::Validation,
            SyncError::Gateway(GatewayError::Rejected { .. })
            | SyncError::Gateway(GatewayError::Unauthorized(_)) => FailureKind::Rejected,
            SyncError::DeadlineExceeded(_) | SyncError::Cancelled(_) => FailureKind::Interrupted,
            _ => FailureKind::Transient,
        }
    }

    /// Whether the error aborted the run as a whole rather than a single call
    pub fn is_interruption(&self) -> bool {
        self.kind() == FailureKind::Interrupted
    }
}

/// Remote sync gateway errors
///
/// Errors that occur when talking to the remote step store.
/// These errors don't expose the HTTP client's types.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Failed to reach the gateway
    #[error("Failed to connect to sync gateway: {0}")]
    ConnectionFailed(String),

    /// Request timed out
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Server error (5xx, 408, 429)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// The gateway refused the batch (4xx other than auth)
    #[error("Batch rejected: {status} - {message}")]
    Rejected { status: u16, message: String },

    /// Credentials were refused
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Response body could not be understood
    #[error("Invalid response from gateway: {0}")]
    InvalidResponse(String),
}

/// Failure taxonomy recorded in sync state and used by the retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Network, timeout, or server-side failure; eligible for fast retry
    Transient,
    /// Health data access revoked; needs foreground remediation
    Permission,
    /// Malformed entry; dropped and never retried
    Validation,
    /// Ambiguous per-entry outcome; the whole chunk is re-queued
    PartialBatch,
    /// The gateway refused the batch or the credentials; resending as-is cannot help
    Rejected,
    /// The run was cancelled or ran out of its execution window
    Interrupted,
}

impl FailureKind {
    /// Whether an in-process fast retry can possibly help
    pub fn is_fast_retryable(&self) -> bool {
        matches!(self, FailureKind::Transient | FailureKind::PartialBatch)
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::Transient => "transient",
            FailureKind::Permission => "permission",
            FailureKind::Validation => "validation",
            FailureKind::PartialBatch => "partial_batch",
            FailureKind::Rejected => "rejected",
            FailureKind::Interrupted => "interrupted",
        };
        f.write_str(s)
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::Configuration(format!("TOML parse error: {err}"))
    }
}
