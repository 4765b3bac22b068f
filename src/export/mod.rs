//! Writing replay results to disk.

use crate::domain::Address;
use crate::engine::Replay;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

pub mod csv;
pub mod json;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExportError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        ExportError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Both,
    None,
}

impl ExportFormat {
    pub fn csv(&self) -> bool {
        matches!(self, ExportFormat::Csv | ExportFormat::Both)
    }

    pub fn json(&self) -> bool {
        matches!(self, ExportFormat::Json | ExportFormat::Both)
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "both" => Ok(ExportFormat::Both),
            "none" => Ok(ExportFormat::None),
            other => Err(format!("must be csv, json, both, or none, got {}", other)),
        }
    }
}

/// Writes each account's replay under `{output_dir}/{address}/`.
#[derive(Debug, Clone)]
pub struct Exporter {
    output_dir: PathBuf,
    format: ExportFormat,
}

impl Exporter {
    pub fn new(output_dir: impl Into<PathBuf>, format: ExportFormat) -> Self {
        Self {
            output_dir: output_dir.into(),
            format,
        }
    }

    pub fn account_dir(&self, user: &Address) -> PathBuf {
        self.output_dir.join(user.to_lowercase())
    }

    /// Write the configured files and return their paths.
    pub fn export(&self, user: &Address, replay: &Replay) -> Result<Vec<PathBuf>, ExportError> {
        if self.format == ExportFormat::None {
            return Ok(Vec::new());
        }

        let dir = self.account_dir(user);
        std::fs::create_dir_all(&dir).map_err(|e| ExportError::io(&dir, e))?;

        let mut written = Vec::new();
        if self.format.csv() {
            written.push(csv::write_balances(&dir.join(csv::BALANCES_FILE), replay)?);
            written.push(csv::write_positions(&dir.join(csv::POSITIONS_FILE), replay)?);
        }
        if self.format.json() {
            written.push(json::write_steps(&dir.join(json::STEPS_FILE), replay)?);
            written.push(json::write_final_state(
                &dir.join(json::FINAL_STATE_FILE),
                replay.final_state(),
            )?);
        }

        info!(user = %user, files = written.len(), dir = %dir.display(), "exported replay");
        Ok(written)
    }
}
