//! Fetch and parse every event stream for one account.

use crate::datasource::parse::{
    parse_fill, parse_funding, parse_ledger, parse_records, parse_twap, parse_user_details,
};
use crate::datasource::{DataSource, DataSourceError, ParseError, Parsed, Stream};
use crate::domain::{sort_events_chronologically, Address, Event};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("fetching {stream} for {user}: {source}")]
    Fetch {
        user: String,
        stream: Stream,
        #[source]
        source: DataSourceError,
    },
    #[error("{stream} response for {user} has the wrong shape: {source}")]
    Shape {
        user: String,
        stream: Stream,
        #[source]
        source: ParseError,
    },
}

/// Per-stream record counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreamCounts {
    pub fetched: usize,
    pub parsed: usize,
    pub skipped: usize,
}

impl<T> From<&Parsed<T>> for StreamCounts {
    fn from(parsed: &Parsed<T>) -> Self {
        Self {
            fetched: parsed.fetched(),
            parsed: parsed.items.len(),
            skipped: parsed.skipped,
        }
    }
}

/// What was fetched and what survived parsing, per stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub streams: BTreeMap<Stream, StreamCounts>,
}

impl LoadReport {
    pub fn fetched(&self) -> usize {
        self.streams.values().map(|c| c.fetched).sum()
    }

    pub fn parsed(&self) -> usize {
        self.streams.values().map(|c| c.parsed).sum()
    }

    pub fn skipped(&self) -> usize {
        self.streams.values().map(|c| c.skipped).sum()
    }

    pub fn get(&self, stream: Stream) -> StreamCounts {
        self.streams.get(&stream).copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct LoadedEvents {
    /// Chronologically sorted.
    pub events: Vec<Event>,
    pub report: LoadReport,
}

#[derive(Debug, Clone)]
pub struct EventLoader {
    source: Arc<dyn DataSource>,
    aggregate_fills_by_time: bool,
}

impl EventLoader {
    pub fn new(source: Arc<dyn DataSource>, aggregate_fills_by_time: bool) -> Self {
        Self {
            source,
            aggregate_fills_by_time,
        }
    }

    /// Fetch all five streams concurrently, parse them and merge them into
    /// one time-ordered list.
    ///
    /// A failed fetch or a response of the wrong shape aborts the load;
    /// malformed individual records are skipped and counted.
    pub async fn load(&self, user: &Address) -> Result<LoadedEvents, LoadError> {
        let addr = user.as_str();
        let fetch_err = |stream: Stream| {
            move |source: DataSourceError| LoadError::Fetch {
                user: addr.to_string(),
                stream,
                source,
            }
        };

        let (fills, twaps, funding, ledger, details) = futures::try_join!(
            async {
                self.source
                    .user_fills(addr, self.aggregate_fills_by_time)
                    .await
                    .map_err(fetch_err(Stream::Fills))
            },
            async {
                self.source
                    .twap_history(addr)
                    .await
                    .map_err(fetch_err(Stream::Twap))
            },
            async {
                self.source
                    .user_funding(addr)
                    .await
                    .map_err(fetch_err(Stream::Funding))
            },
            async {
                self.source
                    .ledger_updates(addr)
                    .await
                    .map_err(fetch_err(Stream::Ledger))
            },
            async {
                self.source
                    .user_details(addr)
                    .await
                    .map_err(fetch_err(Stream::Explorer))
            },
        )?;

        let shape_err = |stream: Stream| {
            move |source: ParseError| LoadError::Shape {
                user: addr.to_string(),
                stream,
                source,
            }
        };

        let fills = parse_records(Stream::Fills, &fills, parse_fill)
            .map_err(shape_err(Stream::Fills))?;
        let twaps = parse_records(Stream::Twap, &twaps, parse_twap)
            .map_err(shape_err(Stream::Twap))?;
        let funding = parse_records(Stream::Funding, &funding, parse_funding)
            .map_err(shape_err(Stream::Funding))?;
        let ledger = parse_records(Stream::Ledger, &ledger, parse_ledger)
            .map_err(shape_err(Stream::Ledger))?;
        let leverage = parse_user_details(&details).map_err(shape_err(Stream::Explorer))?;

        let mut report = LoadReport::default();
        report.streams.insert(Stream::Fills, (&fills).into());
        report.streams.insert(Stream::Twap, (&twaps).into());
        report.streams.insert(Stream::Funding, (&funding).into());
        report.streams.insert(Stream::Ledger, (&ledger).into());
        report.streams.insert(Stream::Explorer, (&leverage).into());

        let mut events: Vec<Event> = Vec::with_capacity(report.parsed());
        events.extend(ledger.items.into_iter().map(Event::from));
        events.extend(twaps.items.into_iter().map(Event::from));
        events.extend(fills.items.into_iter().map(Event::from));
        events.extend(funding.items.into_iter().map(Event::from));
        events.extend(leverage.items.into_iter().map(Event::from));
        sort_events_chronologically(&mut events);

        if report.skipped() > 0 {
            warn!(
                user = %user,
                skipped = report.skipped(),
                parsed = report.parsed(),
                "some records could not be parsed"
            );
        }
        info!(user = %user, events = events.len(), "loaded events");

        Ok(LoadedEvents { events, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::MockDataSource;
    use crate::domain::EventKind;
    use serde_json::json;

    #[tokio::test]
    async fn test_load_merges_streams_in_time_order() {
        let user = "0xabc";
        let mock = MockDataSource::new()
            .with_ledger(user, json!([{"time": 3000, "hash": "0x1", "delta": {"type": "deposit", "usdc": "100"}}]))
            .with_funding(
                user,
                json!([{"time": 1000, "hash": "0x2",
                        "delta": {"type": "funding", "coin": "BTC", "usdc": "-1", "szi": "1", "fundingRate": "0.0001"}}]),
            )
            .with_twaps(user, json!([{"time": 2, "state": {"coin": "BTC", "side": "B", "sz": "1",
                "executedSz": "1", "executedNtl": "100"}, "status": {"status": "finished"}}]));

        let loader = EventLoader::new(Arc::new(mock), true);
        let loaded = loader.load(&Address::new(user)).await.unwrap();

        let kinds: Vec<EventKind> = loaded.events.iter().map(Event::kind).collect();
        assert_eq!(kinds, vec![EventKind::Funding, EventKind::Twap, EventKind::Ledger]);
        assert_eq!(loaded.report.parsed(), 3);
        assert_eq!(loaded.report.get(Stream::Fills), StreamCounts::default());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_fatal() {
        let loader = EventLoader::new(Arc::new(MockDataSource::new().failing(Stream::Ledger)), true);
        let err = loader.load(&Address::new("0xabc")).await.unwrap_err();
        assert!(matches!(
            err,
            LoadError::Fetch {
                stream: Stream::Ledger,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_wrong_shape_is_fatal() {
        let mock = MockDataSource::new().with_fills("0xabc", json!({"error": "rate limited"}));
        let loader = EventLoader::new(Arc::new(mock), true);
        let err = loader.load(&Address::new("0xabc")).await.unwrap_err();
        assert!(matches!(
            err,
            LoadError::Shape {
                stream: Stream::Fills,
                ..
            }
        ));
    }
}
