//! Remote sync gateways
//!
//! - [`HttpSyncGateway`] - the remote step store over HTTP
//! - [`MemoryGateway`] - in-process upsert store for dry runs and tests

pub mod http;
pub mod memory;
pub mod traits;

pub use http::HttpSyncGateway;
pub use memory::{InjectedFailure, MemoryGateway};
pub use traits::SyncGateway;

use crate::config::StepSyncConfig;
use crate::domain::ids::UserId;
use crate::domain::{Result, SyncError};
use std::sync::Arc;

/// Create the gateway selected by configuration
///
/// A dry run talks to an in-memory store instead of the remote endpoint.
///
/// # Errors
///
/// Returns a configuration error if the user id is invalid or the HTTP client
/// cannot be built.
pub fn create_gateway(config: &StepSyncConfig) -> Result<Arc<dyn SyncGateway>> {
    if config.application.dry_run {
        let user = UserId::new(config.tracking.user_id.clone())
            .map_err(|e| SyncError::Configuration(format!("tracking.user_id: {e}")))?;
        tracing::info!("Dry run: batches go to an in-memory gateway");
        return Ok(Arc::new(MemoryGateway::new(user)));
    }

    let gateway = HttpSyncGateway::new(config.gateway.clone())?;
    tracing::debug!(url = %gateway.url(), "Using HTTP sync gateway");
    Ok(Arc::new(gateway))
}
