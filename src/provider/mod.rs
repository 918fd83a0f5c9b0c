//! Historical and current rate data, read from the rates sheet with a built-in
//! fallback dataset.

mod client;
mod defaults;
mod payload;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::config::ProviderConfig;
use crate::core::{CurrentRates, HistoricalRecord};

pub use client::SheetClient;
pub use defaults::{DEFAULT_CURRENT_RATES, default_history};
pub use payload::{SheetPayload, parse_payload};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("rate sheet request failed: {0}")]
    Http(#[source] reqwest::Error),
    #[error("rate sheet responded with HTTP {0}")]
    Status(u16),
    #[error("rate sheet reported an error: {0}")]
    Sheet(String),
    #[error("rate sheet payload has an unexpected structure")]
    UnexpectedShape,
    #[error("rate sheet payload could not be decoded: {0}")]
    Decode(#[source] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataSource {
    #[serde(rename = "remote")]
    Remote,
    #[serde(rename = "default")]
    BuiltIn,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateDataset {
    pub historical: Vec<HistoricalRecord>,
    pub current_rates: CurrentRates,
    pub source: DataSource,
    pub last_updated: Option<DateTime<Utc>>,
}

impl RateDataset {
    pub fn built_in() -> Self {
        Self {
            historical: default_history(),
            current_rates: DEFAULT_CURRENT_RATES,
            source: DataSource::BuiltIn,
            last_updated: None,
        }
    }

    /// Applies a fresh sheet payload. Current rates carry over when the sheet omits them.
    pub fn with_payload(&self, payload: SheetPayload, fetched_at: DateTime<Utc>) -> Self {
        Self {
            historical: payload.historical,
            current_rates: payload.current_rates.unwrap_or(self.current_rates),
            source: DataSource::Remote,
            last_updated: Some(fetched_at),
        }
    }
}

/// Holds the latest dataset and knows how to refresh it.
#[derive(Debug)]
pub struct RateProvider {
    client: Option<SheetClient>,
    dataset: RwLock<RateDataset>,
    /// Held across fetch and install so overlapping refreshes apply in order.
    refresh_guard: Mutex<()>,
}

impl RateProvider {
    pub fn new(client: Option<SheetClient>) -> Self {
        Self {
            client,
            dataset: RwLock::new(RateDataset::built_in()),
            refresh_guard: Mutex::new(()),
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = config
            .source_url
            .as_deref()
            .map(|url| SheetClient::new(url, config.fetch_timeout))
            .transpose()?;
        Ok(Self::new(client))
    }

    pub async fn snapshot(&self) -> RateDataset {
        self.dataset.read().await.clone()
    }

    /// Re-reads the sheet. Any failure installs the built-in dataset rather than
    /// surfacing an error.
    pub async fn refresh(&self) -> RateDataset {
        let _refreshing = self.refresh_guard.lock().await;
        let Some(client) = &self.client else {
            let dataset = RateDataset::built_in();
            *self.dataset.write().await = dataset.clone();
            return dataset;
        };

        let fetched = client.fetch().await;
        let mut guard = self.dataset.write().await;
        let next = match fetched {
            Ok(payload) => {
                let next = guard.with_payload(payload, Utc::now());
                info!(
                    url = client.url(),
                    records = next.historical.len(),
                    "loaded rates from sheet"
                );
                next
            }
            Err(err) => {
                warn!(url = client.url(), error = %err, "rate sheet unavailable, using built-in dataset");
                RateDataset::built_in()
            }
        };
        *guard = next.clone();
        next
    }
}

/// Refreshes immediately, then every `interval`, until the handle is aborted.
pub fn spawn_refresh_loop(provider: Arc<RateProvider>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            provider.refresh().await;
        }
    })
}
