//! Hyperliquid API client implementation.

use super::parse::filter_explorer_txs;
use super::{DataSource, DataSourceError};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.hyperliquid.xyz";
pub const DEFAULT_EXPLORER_URL: &str = "https://rpc.hyperliquid.xyz/explorer";

/// Hyperliquid data source using the public Info API and the explorer RPC.
#[derive(Debug, Clone)]
pub struct HyperliquidDataSource {
    client: Client,
    base_url: String,
    explorer_url: String,
    max_elapsed: Duration,
}

impl HyperliquidDataSource {
    pub fn new(base_url: String, explorer_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            explorer_url,
            max_elapsed: Duration::from_secs(30),
        }
    }

    /// Create with the public Hyperliquid endpoints.
    pub fn default_url() -> Self {
        Self::new(DEFAULT_API_URL.to_string(), DEFAULT_EXPLORER_URL.to_string())
    }

    /// Cap on total time spent retrying one request.
    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = max_elapsed;
        self
    }

    async fn post_info(&self, payload: Value) -> Result<Value, DataSourceError> {
        let url = format!("{}/info", self.base_url);
        self.post(&url, payload).await
    }

    async fn post(&self, url: &str, payload: Value) -> Result<Value, DataSourceError> {
        debug!(url, request = %payload["type"], "posting");
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.max_elapsed),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self
                .client
                .post(url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| {
                    backoff::Error::transient(DataSourceError::NetworkError(e.to_string()))
                })?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(DataSourceError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(DataSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(DataSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<Value>()
                .await
                .map_err(|e| backoff::Error::permanent(DataSourceError::ParseError(e.to_string())))
        })
        .await
    }
}

#[async_trait]
impl DataSource for HyperliquidDataSource {
    async fn user_fills(&self, user: &str, aggregate_by_time: bool) -> Result<Value, DataSourceError> {
        self.post_info(json!({
            "type": "userFills",
            "user": user,
            "aggregateByTime": aggregate_by_time
        }))
        .await
    }

    async fn twap_history(&self, user: &str) -> Result<Value, DataSourceError> {
        self.post_info(json!({"type": "twapHistory", "user": user}))
            .await
    }

    async fn user_funding(&self, user: &str) -> Result<Value, DataSourceError> {
        self.post_info(json!({"type": "userFunding", "user": user, "startTime": 0}))
            .await
    }

    async fn ledger_updates(&self, user: &str) -> Result<Value, DataSourceError> {
        self.post_info(json!({
            "type": "userNonFundingLedgerUpdates",
            "user": user,
            "startTime": 0
        }))
        .await
    }

    async fn user_details(&self, user: &str) -> Result<Value, DataSourceError> {
        let details = self
            .post(&self.explorer_url, json!({"type": "userDetails", "user": user}))
            .await?;
        Ok(filter_explorer_txs(details))
    }

    async fn perp_meta(&self) -> Result<Value, DataSourceError> {
        self.post_info(json!({"type": "meta"})).await
    }

    async fn spot_meta(&self) -> Result<Value, DataSourceError> {
        self.post_info(json!({"type": "spotMeta"})).await
    }
}
