use crate::config::ConfigError;
use crate::datasource::DataSourceError;
use crate::export::ExportError;
use crate::orchestration::{LoadError, OrchestrationError};
use thiserror::Error;

/// Top-level error for a `hypestate` run.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Data source error: {0}")]
    DataSource(#[from] DataSourceError),
    #[error("Load error: {0}")]
    Load(#[from] LoadError),
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<OrchestrationError> for AppError {
    fn from(err: OrchestrationError) -> Self {
        match err {
            OrchestrationError::Load(e) => AppError::Load(e),
            OrchestrationError::Export(e) => AppError::Export(e),
            OrchestrationError::Task(e) => AppError::Task(e),
        }
    }
}
