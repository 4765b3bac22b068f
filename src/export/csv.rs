//! Tabular exports: one balance row per step, one position row per position
//! per step.

use super::ExportError;
use crate::engine::Replay;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const BALANCES_FILE: &str = "balances.csv";
pub const POSITIONS_FILE: &str = "positions.csv";

#[derive(Debug, Serialize)]
struct BalanceRow<'a> {
    time_ms: i64,
    datetime: String,
    event: String,
    event_key: String,
    spot_usdc: &'a str,
    perp_usdc: &'a str,
}

#[derive(Debug, Serialize)]
struct PositionRow<'a> {
    time_ms: i64,
    event_key: &'a str,
    pool: &'static str,
    token: &'a str,
    amount: String,
    leverage: Option<String>,
}

pub fn write_balances(path: &Path, replay: &Replay) -> Result<PathBuf, ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    for step in &replay.steps {
        let spot_usdc = step.state.spot_usdc.to_canonical_string();
        let perp_usdc = step.state.perp_usdc.to_canonical_string();
        writer.serialize(BalanceRow {
            time_ms: step.state.time.as_ms(),
            datetime: step.state.time.to_rfc3339().unwrap_or_default(),
            event: step.event.label(),
            event_key: step.event.event_key(),
            spot_usdc: &spot_usdc,
            perp_usdc: &perp_usdc,
        })?;
    }
    writer.flush().map_err(|e| ExportError::io(path, e))?;
    Ok(path.to_path_buf())
}

pub fn write_positions(path: &Path, replay: &Replay) -> Result<PathBuf, ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    for step in &replay.steps {
        let state = &step.state;
        let time_ms = state.time.as_ms();
        let event_key = step.event.event_key();

        for (token, pos) in &state.spot_positions {
            writer.serialize(PositionRow {
                time_ms,
                event_key: &event_key,
                pool: "spot",
                token: token.as_str(),
                amount: pos.balance.to_canonical_string(),
                leverage: None,
            })?;
        }
        for (token, pos) in &state.perp_positions {
            writer.serialize(PositionRow {
                time_ms,
                event_key: &event_key,
                pool: "perp",
                token: token.as_str(),
                amount: pos.size.to_canonical_string(),
                leverage: Some(pos.leverage.to_canonical_string()),
            })?;
        }
        for (vault, pos) in &state.vault_positions {
            writer.serialize(PositionRow {
                time_ms,
                event_key: &event_key,
                pool: "vault",
                token: vault.as_str(),
                amount: pos.balance.to_canonical_string(),
                leverage: None,
            })?;
        }
    }
    writer.flush().map_err(|e| ExportError::io(path, e))?;
    Ok(path.to_path_buf())
}
