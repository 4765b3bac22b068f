//! On-disk cache of raw responses.

use super::{DataSource, DataSourceError, Stream};
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Decorator that stores every raw response as pretty JSON.
///
/// Layout: `{dir}/{stream}/{address}_{stream}.json` for account streams,
/// except fills, which are keyed by aggregation mode as
/// `{dir}/fills/{address}_fills_{agg|no_agg}.json`, and
/// `{dir}/meta/{perp|spot}_meta.json` for exchange metadata. With
/// `use_cache` off every request goes to the inner source and overwrites
/// the cached copy.
#[derive(Debug, Clone)]
pub struct CachedDataSource<D> {
    inner: D,
    dir: PathBuf,
    use_cache: bool,
}

impl<D: DataSource> CachedDataSource<D> {
    pub fn new(inner: D, dir: impl Into<PathBuf>, use_cache: bool) -> Self {
        Self {
            inner,
            dir: dir.into(),
            use_cache,
        }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }

    pub fn stream_path(&self, user: &str, stream: Stream) -> PathBuf {
        self.dir
            .join(stream.as_str())
            .join(format!("{}_{}.json", user.to_lowercase(), stream))
    }

    /// Aggregated and per-execution fills are different responses.
    pub fn fills_path(&self, user: &str, aggregate_by_time: bool) -> PathBuf {
        let mode = if aggregate_by_time { "agg" } else { "no_agg" };
        self.dir
            .join(Stream::Fills.as_str())
            .join(format!("{}_fills_{}.json", user.to_lowercase(), mode))
    }

    pub fn meta_path(&self, name: &str) -> PathBuf {
        self.dir.join("meta").join(format!("{}_meta.json", name))
    }

    async fn cached<F>(&self, path: PathBuf, fetch: F) -> Result<Value, DataSourceError>
    where
        F: Future<Output = Result<Value, DataSourceError>> + Send,
    {
        if self.use_cache {
            if let Some(value) = read_json(&path).await? {
                debug!(path = %path.display(), "cache hit");
                return Ok(value);
            }
        }

        let value = fetch.await?;
        write_json(&path, &value).await?;
        info!(path = %path.display(), "cached response");
        Ok(value)
    }
}

async fn read_json(path: &Path) -> Result<Option<Value>, DataSourceError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(DataSourceError::Cache {
                path: path.display().to_string(),
                source,
            })
        }
    };
    serde_json::from_slice(&bytes).map(Some).map_err(|e| {
        DataSourceError::ParseError(format!("corrupt cache file {}: {}", path.display(), e))
    })
}

async fn write_json(path: &Path, value: &Value) -> Result<(), DataSourceError> {
    let cache_err = |source| DataSourceError::Cache {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(cache_err)?;
    }
    let body = serde_json::to_vec_pretty(value)
        .map_err(|e| DataSourceError::ParseError(e.to_string()))?;
    tokio::fs::write(path, body).await.map_err(cache_err)
}

#[async_trait]
impl<D: DataSource> DataSource for CachedDataSource<D> {
    async fn user_fills(&self, user: &str, aggregate_by_time: bool) -> Result<Value, DataSourceError> {
        self.cached(
            self.fills_path(user, aggregate_by_time),
            self.inner.user_fills(user, aggregate_by_time),
        )
        .await
    }

    async fn twap_history(&self, user: &str) -> Result<Value, DataSourceError> {
        self.cached(self.stream_path(user, Stream::Twap), self.inner.twap_history(user))
            .await
    }

    async fn user_funding(&self, user: &str) -> Result<Value, DataSourceError> {
        self.cached(
            self.stream_path(user, Stream::Funding),
            self.inner.user_funding(user),
        )
        .await
    }

    async fn ledger_updates(&self, user: &str) -> Result<Value, DataSourceError> {
        self.cached(
            self.stream_path(user, Stream::Ledger),
            self.inner.ledger_updates(user),
        )
        .await
    }

    async fn user_details(&self, user: &str) -> Result<Value, DataSourceError> {
        self.cached(
            self.stream_path(user, Stream::Explorer),
            self.inner.user_details(user),
        )
        .await
    }

    async fn perp_meta(&self) -> Result<Value, DataSourceError> {
        self.cached(self.meta_path("perp"), self.inner.perp_meta())
            .await
    }

    async fn spot_meta(&self) -> Result<Value, DataSourceError> {
        self.cached(self.meta_path("spot"), self.inner.spot_meta())
            .await
    }
}
