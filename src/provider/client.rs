use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use super::ProviderError;
use super::payload::{SheetPayload, parse_payload};

/// HTTP client for the spreadsheet-backed rates endpoint.
#[derive(Debug, Clone)]
pub struct SheetClient {
    http: reqwest::Client,
    url: String,
}

impl SheetClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ProviderError::Http)?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn fetch(&self) -> Result<SheetPayload, ProviderError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(ProviderError::Http)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body: Value = response.json().await.map_err(ProviderError::Http)?;
        let payload = parse_payload(body)?;
        debug!(
            records = payload.historical.len(),
            has_current_rates = payload.current_rates.is_some(),
            "decoded rate sheet payload"
        );
        Ok(payload)
    }
}
