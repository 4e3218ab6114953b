// Fast-retry policy

pub mod policy;

pub use policy::{RetryDecision, RetryPolicy, DEFAULT_RETRY_DELAYS_MINUTES};
