//! Fast-retry policy
//!
//! Maps the number of consecutive failed runs to either a short in-process
//! retry or a deferral to the next externally scheduled wake. The budget is
//! deliberately small: a timer per failure competes with the platform's own
//! background budget.

use crate::config::RetryConfig;
use crate::domain::FailureKind;
use serde::Serialize;
use std::time::Duration;

/// Default fast-retry delays for failed attempts 1, 2 and 3
pub const DEFAULT_RETRY_DELAYS_MINUTES: [u64; 3] = [5, 10, 15];

/// What to do after a failed run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "action", content = "delay_seconds")]
pub enum RetryDecision {
    /// Retry in-process after the delay
    #[serde(serialize_with = "serialize_secs")]
    FastRetry(Duration),
    /// Wait for the next externally triggered run
    Defer,
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_secs())
}

impl RetryDecision {
    /// Delay before the fast retry, if any
    pub fn delay(&self) -> Option<Duration> {
        match self {
            RetryDecision::FastRetry(d) => Some(*d),
            RetryDecision::Defer => None,
        }
    }
}

impl std::fmt::Display for RetryDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryDecision::FastRetry(d) => write!(f, "retry in {}s", d.as_secs()),
            RetryDecision::Defer => f.write_str("defer to next scheduled run"),
        }
    }
}

/// Bounded fast-retry table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_minutes(&DEFAULT_RETRY_DELAYS_MINUTES)
    }
}

impl RetryPolicy {
    /// Build a policy from per-attempt delays
    pub fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    /// Build a policy from per-attempt delays in minutes
    pub fn from_minutes(minutes: &[u64]) -> Self {
        Self::new(
            minutes
                .iter()
                .map(|m| Duration::from_secs(m.saturating_mul(60)))
                .collect(),
        )
    }

    /// Build a policy from the `[retry]` config section
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::from_minutes(&config.fast_retry_delays_minutes)
    }

    /// Number of fast retries before deferring
    pub fn budget(&self) -> u32 {
        u32::try_from(self.delays.len()).unwrap_or(u32::MAX)
    }

    /// Decide what happens after a run
    ///
    /// `failed_attempts` is the count since the last success, already including
    /// the run that just finished. Only transient and partial-batch failures
    /// are retried in-process; attempt `n` waits `delays[n - 1]`.
    pub fn decide(&self, failed_attempts: u32, last_failure: Option<FailureKind>) -> RetryDecision {
        match last_failure {
            Some(kind) if kind.is_fast_retryable() => {}
            _ => return RetryDecision::Defer,
        }

        if failed_attempts == 0 {
            return RetryDecision::Defer;
        }

        match self.delays.get((failed_attempts - 1) as usize) {
            Some(delay) => RetryDecision::FastRetry(*delay),
            None => RetryDecision::Defer,
        }
    }
}
