//! HTTP relevance oracle -- `POST {endpoint}` with a JSON body.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::{AnalyzeRequest, CheckResult, ErrorBody, RelevanceOracle};
use crate::error::{ConfigError, CoreError, OracleError, Result};
use crate::storage::OracleConfig;

/// Longest error body echoed back into an [`OracleError::Rejected`].
const MAX_ERROR_BODY_CHARS: usize = 200;

pub struct HttpOracle {
    client: Client,
    endpoint: Url,
    timeout: Duration,
}

impl HttpOracle {
    /// Build a client with a bounded per-request timeout.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    /// # Errors
    /// Returns an error if the configured endpoint is not a valid URL.
    pub fn from_config(config: &OracleConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            CoreError::Config(ConfigError::InvalidValue {
                key: "oracle.endpoint".into(),
                message: e.to_string(),
            })
        })?;
        Self::new(endpoint, Duration::from_secs(config.timeout_secs))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl RelevanceOracle for HttpOracle {
    async fn judge(&self, request: &AnalyzeRequest) -> Result<CheckResult, OracleError> {
        let timeout_secs = self.timeout.as_secs();
        debug!(
            endpoint = %self.endpoint,
            content_chars = request.content.chars().count(),
            "submitting content to oracle"
        );

        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| OracleError::from_transport(&e, timeout_secs))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| OracleError::from_transport(&e, timeout_secs))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ErrorBody>(&body) {
                Ok(err) => err.message,
                Err(_) => super::truncate_chars(&body, MAX_ERROR_BODY_CHARS).to_string(),
            };
            return Err(OracleError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str::<CheckResult>(&body)
            .map_err(|e| OracleError::MalformedResponse(e.to_string()))
    }
}
