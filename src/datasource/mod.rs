//! Data source abstraction for the raw Hyperliquid account streams.
//!
//! Sources return the exchange's JSON untouched; [`parse`] turns records into
//! typed events and [`cache`] stores raw responses on disk.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

pub mod cache;
pub mod hyperliquid;
pub mod mock;
pub mod parse;

pub use cache::CachedDataSource;
pub use hyperliquid::HyperliquidDataSource;
pub use mock::MockDataSource;
pub use parse::{ParseError, Parsed};

/// One raw per-account stream. Used for cache layout, logging and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stream {
    Fills,
    Twap,
    Funding,
    Ledger,
    Explorer,
}

impl Stream {
    pub const ALL: [Stream; 5] = [
        Stream::Fills,
        Stream::Twap,
        Stream::Funding,
        Stream::Ledger,
        Stream::Explorer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stream::Fills => "fills",
            Stream::Twap => "twap",
            Stream::Funding => "funding",
            Stream::Ledger => "ledger",
            Stream::Explorer => "explorer",
        }
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw access to everything the replay needs for one account.
///
/// Implementations handle retry/backoff; records come back exactly as the
/// exchange sent them.
#[async_trait]
pub trait DataSource: Send + Sync + fmt::Debug {
    /// `userFills`: array of fill records.
    async fn user_fills(&self, user: &str, aggregate_by_time: bool) -> Result<Value, DataSourceError>;

    /// `twapHistory`: array of `{time, state, status, twapId}` records.
    async fn twap_history(&self, user: &str) -> Result<Value, DataSourceError>;

    /// `userFunding`: array of `{time, hash, delta}` records.
    async fn user_funding(&self, user: &str) -> Result<Value, DataSourceError>;

    /// `userNonFundingLedgerUpdates`: array of `{time, hash, delta}` records.
    async fn ledger_updates(&self, user: &str) -> Result<Value, DataSourceError>;

    /// Explorer `userDetails`: object with a `txs` array.
    async fn user_details(&self, user: &str) -> Result<Value, DataSourceError>;

    /// Perp `meta`.
    async fn perp_meta(&self) -> Result<Value, DataSourceError>;

    /// `spotMeta`.
    async fn spot_meta(&self) -> Result<Value, DataSourceError>;
}

/// Error type for data source operations.
#[derive(Debug, Error)]
pub enum DataSourceError {
    /// Network error (e.g., connection timeout, DNS failure)
    #[error("Network error: {0}")]
    NetworkError(String),
    /// HTTP error (e.g., 4xx client error, 5xx server error)
    #[error("HTTP error {status}: {message}")]
    HttpError { status: u16, message: String },
    /// Invalid JSON or a response of the wrong shape
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Rate limited")]
    RateLimited,
    /// Reading or writing the response cache failed
    #[error("Cache error at {path}: {source}")]
    Cache {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Error: {0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datasource_error_display() {
        let err = DataSourceError::NetworkError("connection timeout".to_string());
        assert_eq!(err.to_string(), "Network error: connection timeout");

        let err = DataSourceError::HttpError {
            status: 429,
            message: "Too many requests".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 429: Too many requests");

        let err = DataSourceError::ParseError("invalid JSON".to_string());
        assert_eq!(err.to_string(), "Parse error: invalid JSON");

        let err = DataSourceError::RateLimited;
        assert_eq!(err.to_string(), "Rate limited");
    }

    #[test]
    fn test_stream_names() {
        let names: Vec<&str> = Stream::ALL.iter().map(Stream::as_str).collect();
        assert_eq!(names, vec!["fills", "twap", "funding", "ledger", "explorer"]);
    }
}
