//! HTTP sync gateway
//!
//! Posts batches to `{base_url}/v1/step-entries/sync` with a bearer API key and
//! maps HTTP status codes onto [`GatewayError`] so the orchestrator can tell
//! transient failures from refused ones.

use super::traits::{check_batch_size, SyncGateway};
use crate::config::GatewayConfig;
use crate::domain::{GatewayError, Result, StepDayEntry, SyncBatchResult, SyncError};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use std::time::Duration;

const SYNC_PATH: &str = "/v1/step-entries/sync";

#[derive(Serialize)]
struct SyncRequest<'a> {
    entries: &'a [StepDayEntry],
}

/// Remote sync gateway over HTTP
pub struct HttpSyncGateway {
    /// Full endpoint URL
    url: String,

    /// HTTP client with the request timeout applied
    client: Client,

    /// Gateway configuration (holds the API key)
    config: GatewayConfig,
}

impl HttpSyncGateway {
    /// Create a new HTTP gateway
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.timeout_seconds.min(10)))
            .build()
            .map_err(|e| SyncError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        let url = format!("{}{}", config.base_url.trim_end_matches('/'), SYNC_PATH);

        Ok(Self {
            url,
            client,
            config,
        })
    }

    /// Endpoint the gateway posts to
    pub fn url(&self) -> &str {
        &self.url
    }

    fn map_send_error(e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Timeout(e.to_string())
        } else {
            GatewayError::ConnectionFailed(e.to_string())
        }
    }

    fn map_status(status: StatusCode, body: String) -> GatewayError {
        let code = status.as_u16();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                GatewayError::Unauthorized(format!("{code}: {body}"))
            }
            StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
                GatewayError::ServerError {
                    status: code,
                    message: body,
                }
            }
            s if s.is_server_error() => GatewayError::ServerError {
                status: code,
                message: body,
            },
            _ => GatewayError::Rejected {
                status: code,
                message: body,
            },
        }
    }
}

#[async_trait]
impl SyncGateway for HttpSyncGateway {
    async fn sync_batch(&self, entries: &[StepDayEntry]) -> Result<SyncBatchResult> {
        check_batch_size(entries)?;

        let mut request = self
            .client
            .post(&self.url)
            .json(&SyncRequest { entries });

        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key.expose_secret().as_str());
        }

        tracing::debug!(url = %self.url, entries = entries.len(), "Posting step batch");

        let response = request.send().await.map_err(Self::map_send_error)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %body, "Gateway refused batch");
            return Err(Self::map_status(status, body).into());
        }

        let result = response
            .json::<SyncBatchResult>()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        Ok(result)
    }

    fn name(&self) -> &str {
        "http"
    }
}
