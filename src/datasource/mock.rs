//! Mock data source for testing without network calls.

use super::{DataSource, DataSourceError, Stream};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Mock data source that returns predefined raw responses.
///
/// Streams without a configured response return an empty array (an object
/// with an empty `txs` array for the explorer), which is what the exchange
/// returns for a fresh account.
#[derive(Debug, Clone, Default)]
pub struct MockDataSource {
    responses: HashMap<(String, Stream), Value>,
    perp_meta: Option<Value>,
    spot_meta: Option<Value>,
    failing: Option<Stream>,
    calls: Arc<AtomicUsize>,
}

impl MockDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the raw response for one user's stream.
    pub fn with_response(mut self, user: &str, stream: Stream, response: Value) -> Self {
        self.responses
            .insert((user.to_lowercase(), stream), response);
        self
    }

    pub fn with_fills(self, user: &str, fills: Value) -> Self {
        self.with_response(user, Stream::Fills, fills)
    }

    pub fn with_twaps(self, user: &str, twaps: Value) -> Self {
        self.with_response(user, Stream::Twap, twaps)
    }

    pub fn with_funding(self, user: &str, funding: Value) -> Self {
        self.with_response(user, Stream::Funding, funding)
    }

    pub fn with_ledger(self, user: &str, ledger: Value) -> Self {
        self.with_response(user, Stream::Ledger, ledger)
    }

    pub fn with_user_details(self, user: &str, details: Value) -> Self {
        self.with_response(user, Stream::Explorer, details)
    }

    pub fn with_meta(mut self, perp_meta: Value, spot_meta: Value) -> Self {
        self.perp_meta = Some(perp_meta);
        self.spot_meta = Some(spot_meta);
        self
    }

    /// Make every request for `stream` fail with a network error.
    pub fn failing(mut self, stream: Stream) -> Self {
        self.failing = Some(stream);
        self
    }

    /// Number of requests served, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn respond(&self, user: &str, stream: Stream) -> Result<Value, DataSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing == Some(stream) {
            return Err(DataSourceError::NetworkError(format!(
                "mock failure for {}",
                stream
            )));
        }
        let empty = match stream {
            Stream::Explorer => json!({"txs": []}),
            _ => json!([]),
        };
        Ok(self
            .responses
            .get(&(user.to_lowercase(), stream))
            .cloned()
            .unwrap_or(empty))
    }

    fn meta(&self, meta: &Option<Value>) -> Result<Value, DataSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        meta.clone()
            .ok_or_else(|| DataSourceError::Other("no meta configured".to_string()))
    }
}

#[async_trait]
impl DataSource for MockDataSource {
    async fn user_fills(&self, user: &str, _aggregate_by_time: bool) -> Result<Value, DataSourceError> {
        self.respond(user, Stream::Fills)
    }

    async fn twap_history(&self, user: &str) -> Result<Value, DataSourceError> {
        self.respond(user, Stream::Twap)
    }

    async fn user_funding(&self, user: &str) -> Result<Value, DataSourceError> {
        self.respond(user, Stream::Funding)
    }

    async fn ledger_updates(&self, user: &str) -> Result<Value, DataSourceError> {
        self.respond(user, Stream::Ledger)
    }

    async fn user_details(&self, user: &str) -> Result<Value, DataSourceError> {
        self.respond(user, Stream::Explorer)
    }

    async fn perp_meta(&self) -> Result<Value, DataSourceError> {
        self.meta(&self.perp_meta)
    }

    async fn spot_meta(&self) -> Result<Value, DataSourceError> {
        self.meta(&self.spot_meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_returns_configured_response() {
        let mock = MockDataSource::new().with_ledger(
            "0xABC",
            json!([{"time": 1, "delta": {"type": "deposit", "usdc": "1"}}]),
        );
        let ledger = mock.ledger_updates("0xabc").await.unwrap();
        assert_eq!(ledger.as_array().unwrap().len(), 1);
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_defaults_to_empty() {
        let mock = MockDataSource::new();
        assert_eq!(mock.user_fills("0x1", true).await.unwrap(), json!([]));
        assert_eq!(mock.user_details("0x1").await.unwrap(), json!({"txs": []}));
        assert!(mock.perp_meta().await.is_err());
    }

    #[tokio::test]
    async fn test_mock_failing_stream() {
        let mock = MockDataSource::new().failing(Stream::Twap);
        let err = mock.twap_history("0x1").await.unwrap_err();
        assert!(matches!(err, DataSourceError::NetworkError(_)));
    }
}
