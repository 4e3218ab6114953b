//! Health data providers
//!
//! - [`FileHealthProvider`] - JSON sample export on disk
//! - [`StaticHealthProvider`] - fixed in-memory entries for tests

pub mod file;
pub mod static_provider;
pub mod traits;

pub use file::FileHealthProvider;
pub use static_provider::StaticHealthProvider;
pub use traits::HealthDataProvider;

use crate::config::HealthConfig;
use std::sync::Arc;

/// Create the health data provider described by configuration
pub fn create_health_provider(config: &HealthConfig) -> Arc<dyn HealthDataProvider> {
    tracing::debug!(samples_path = %config.samples_path, "Using file health provider");
    Arc::new(FileHealthProvider::new(&config.samples_path))
}
