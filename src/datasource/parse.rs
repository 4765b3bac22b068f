//! Raw JSON records → typed events.
//!
//! Each `parse_*` function handles one record. The exchange sends most
//! numbers as strings, so numeric fields accept either a JSON string or a
//! JSON number. [`parse_records`] applies a parser to a whole response and
//! skips (and logs) records that fail, so one bad record never sinks a batch.

use super::Stream;
use crate::domain::{
    Address, Coin, Decimal, Direction, Fill, FundingPayment, LedgerDelta, LedgerTransaction,
    LeverageUpdate, Side, TimeMs, TwapExecution, TwapStatus,
};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Explorer action types that never affect account state and are dropped
/// before caching.
pub const FILTERED_TX_TYPES: &[&str] = &["evmRawTx"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected {0}")]
    WrongShape(&'static str),
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("invalid `{field}`: {value}")]
    InvalidField { field: &'static str, value: String },
}

/// Result of parsing a whole response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed<T> {
    pub items: Vec<T>,
    /// Records that failed to parse and were skipped.
    pub skipped: usize,
}

impl<T> Parsed<T> {
    pub fn fetched(&self) -> usize {
        self.items.len() + self.skipped
    }
}

/// Parse every record of an array response with `parse`.
///
/// A response that is not an array is an error; individual records that
/// fail are logged at `warn` and counted.
pub fn parse_records<T>(
    stream: Stream,
    response: &Value,
    parse: impl Fn(&Value) -> Result<T, ParseError>,
) -> Result<Parsed<T>, ParseError> {
    let records = response
        .as_array()
        .ok_or(ParseError::WrongShape("array response"))?;
    Ok(parse_each(stream, records.iter(), parse))
}

fn parse_each<'a, T>(
    stream: Stream,
    records: impl Iterator<Item = &'a Value>,
    parse: impl Fn(&Value) -> Result<T, ParseError>,
) -> Parsed<T> {
    let mut items = Vec::new();
    let mut skipped = 0;
    for (index, record) in records.enumerate() {
        match parse(record) {
            Ok(item) => items.push(item),
            Err(e) => {
                warn!(stream = %stream, index, error = %e, "skipping malformed record");
                skipped += 1;
            }
        }
    }
    debug!(stream = %stream, parsed = items.len(), skipped, "parsed records");
    Parsed { items, skipped }
}

/// Leverage updates from an explorer `userDetails` response.
///
/// Only `updateLeverage` actions without an `error` are considered; other
/// transactions are not counted as skipped.
pub fn parse_user_details(details: &Value) -> Result<Parsed<LeverageUpdate>, ParseError> {
    let txs = details
        .get("txs")
        .and_then(Value::as_array)
        .ok_or(ParseError::WrongShape("object with a `txs` array"))?;

    let leverage_txs = txs.iter().filter(|tx| {
        let is_leverage = tx
            .get("action")
            .and_then(|a| a.get("type"))
            .and_then(Value::as_str)
            == Some("updateLeverage");
        let failed = tx.get("error").map(|e| !e.is_null()).unwrap_or(false);
        is_leverage && !failed
    });

    Ok(parse_each(Stream::Explorer, leverage_txs, parse_leverage))
}

/// Drop explorer transactions whose action type is in [`FILTERED_TX_TYPES`].
pub fn filter_explorer_txs(mut details: Value) -> Value {
    if let Some(txs) = details.get_mut("txs").and_then(Value::as_array_mut) {
        txs.retain(|tx| {
            let action_type = tx
                .get("action")
                .and_then(|a| a.get("type"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            !FILTERED_TX_TYPES.contains(&action_type)
        });
    }
    details
}

pub fn parse_fill(record: &Value) -> Result<Fill, ParseError> {
    let dir = Direction::from_wire(string(record, "dir")?);

    let mut fill = Fill::new(
        TimeMs::new(int(record, "time")?),
        Coin::new(string(record, "coin")?),
        side(record, "side")?,
        decimal(record, "px")?,
        decimal(record, "sz")?,
        decimal(record, "startPosition")?,
        dir,
    );
    fill.closed_pnl = decimal_or_zero(record, "closedPnl")?;
    fill.fee = decimal_or_zero(record, "fee")?;
    fill.fee_token = opt_string(record, "feeToken").map(Coin::new);
    fill.hash = opt_string(record, "hash").map(str::to_string);
    fill.tid = opt_int(record, "tid");
    fill.oid = opt_int(record, "oid");
    fill.twap_id = opt_int(record, "twapId");
    Ok(fill)
}

/// TWAP history reports `time` in seconds.
pub fn parse_twap(record: &Value) -> Result<TwapExecution, ParseError> {
    let state = field(record, "state")?;
    let status = string(field(record, "status")?, "status")?;

    Ok(TwapExecution {
        time_ms: TimeMs::from_secs(int(record, "time")?),
        coin: Coin::new(string(state, "coin")?),
        side: side(state, "side")?,
        sz: decimal(state, "sz")?,
        executed_sz: decimal(state, "executedSz")?,
        executed_ntl: decimal(state, "executedNtl")?,
        minutes: opt_int(state, "minutes").unwrap_or_default(),
        reduce_only: opt_bool(state, "reduceOnly").unwrap_or_default(),
        randomize: opt_bool(state, "randomize").unwrap_or_default(),
        status: TwapStatus::from_wire(status).ok_or_else(|| ParseError::InvalidField {
            field: "status",
            value: status.to_string(),
        })?,
        twap_id: opt_int(record, "twapId"),
    })
}

pub fn parse_funding(record: &Value) -> Result<FundingPayment, ParseError> {
    let delta = field(record, "delta")?;
    Ok(FundingPayment {
        time_ms: TimeMs::new(int(record, "time")?),
        coin: Coin::new(string(delta, "coin")?),
        usdc: decimal(delta, "usdc")?,
        position: decimal_or_zero(delta, "szi")?,
        rate: decimal_or_zero(delta, "fundingRate")?,
        n_samples: opt_int(delta, "nSamples"),
        hash: opt_string(record, "hash").map(str::to_string),
    })
}

/// Unrecognised ledger `type`s parse to [`LedgerDelta::Unknown`].
pub fn parse_ledger(record: &Value) -> Result<LedgerTransaction, ParseError> {
    let time_ms = TimeMs::new(int(record, "time")?);
    let hash = opt_string(record, "hash").map(str::to_string);
    let d = field(record, "delta")?;

    let delta = match string(d, "type")? {
        "deposit" => LedgerDelta::Deposit {
            usdc: decimal(d, "usdc")?,
        },
        "withdraw" => LedgerDelta::Withdraw {
            usdc: decimal(d, "usdc")?,
            fee: decimal_or_zero(d, "fee")?,
            nonce: opt_int(d, "nonce"),
        },
        "internalTransfer" => LedgerDelta::InternalTransfer {
            usdc: decimal(d, "usdc")?,
            user: Address::new(string(d, "user")?),
            destination: Address::new(string(d, "destination")?),
            fee: decimal_or_zero(d, "fee")?,
        },
        "accountClassTransfer" => LedgerDelta::AccountClassTransfer {
            usdc: decimal(d, "usdc")?,
            to_perp: boolean(d, "toPerp")?,
        },
        "spotTransfer" => LedgerDelta::SpotTransfer {
            token: Coin::new(string(d, "token")?),
            amount: decimal(d, "amount")?,
            usdc_value: decimal_or_zero(d, "usdcValue")?,
            user: Address::new(string(d, "user")?),
            destination: Address::new(string(d, "destination")?),
            fee: decimal_or_zero(d, "fee")?,
        },
        "cStakingTransfer" => LedgerDelta::CStakingTransfer {
            token: Coin::new(string(d, "token")?),
            amount: decimal(d, "amount")?,
            is_deposit: boolean(d, "isDeposit")?,
        },
        "accountActivationGas" => LedgerDelta::AccountActivationGas {
            token: Coin::new(string(d, "token")?),
            amount: decimal(d, "amount")?,
        },
        "vaultDeposit" => LedgerDelta::VaultDeposit {
            vault: Address::new(string(d, "vault")?),
            usdc: decimal(d, "usdc")?,
        },
        "vaultWithdraw" => LedgerDelta::VaultWithdraw {
            vault: Address::new(string(d, "vault")?),
            requested_usd: decimal_or_zero(d, "requestedUsd")?,
            commission: decimal_or_zero(d, "commission")?,
            closing_cost: decimal_or_zero(d, "closingCost")?,
            basis: decimal_or_zero(d, "basis")?,
            net_withdrawn_usd: decimal(d, "netWithdrawnUsd")?,
        },
        other => LedgerDelta::Unknown {
            kind: other.to_string(),
        },
    };

    Ok(LedgerTransaction::new(time_ms, hash, delta))
}

/// One explorer transaction carrying an `updateLeverage` action.
pub fn parse_leverage(tx: &Value) -> Result<LeverageUpdate, ParseError> {
    let action = field(tx, "action")?;
    let asset = field(action, "asset")?;
    let asset_id = match asset {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => {
            return Err(ParseError::InvalidField {
                field: "asset",
                value: other.to_string(),
            })
        }
    };

    let leverage = decimal(action, "leverage")?;
    if !leverage.is_positive() {
        return Err(ParseError::InvalidField {
            field: "leverage",
            value: leverage.to_string(),
        });
    }

    Ok(LeverageUpdate {
        time_ms: TimeMs::new(int(tx, "time")?),
        asset_id,
        is_cross: opt_bool(action, "isCross").unwrap_or(true),
        leverage,
        block: opt_int(tx, "block"),
        hash: opt_string(tx, "hash").map(str::to_string),
    })
}

fn field<'a>(v: &'a Value, name: &'static str) -> Result<&'a Value, ParseError> {
    match v.get(name) {
        Some(Value::Null) | None => Err(ParseError::MissingField(name)),
        Some(value) => Ok(value),
    }
}

fn string<'a>(v: &'a Value, name: &'static str) -> Result<&'a str, ParseError> {
    let value = field(v, name)?;
    value.as_str().ok_or_else(|| ParseError::InvalidField {
        field: name,
        value: value.to_string(),
    })
}

fn decimal(v: &Value, name: &'static str) -> Result<Decimal, ParseError> {
    let value = field(v, name)?;
    let invalid = || ParseError::InvalidField {
        field: name,
        value: value.to_string(),
    };
    match value {
        Value::String(s) => Decimal::from_str_canonical(s).map_err(|_| invalid()),
        Value::Number(n) => Decimal::from_str_canonical(&n.to_string()).map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

fn decimal_or_zero(v: &Value, name: &'static str) -> Result<Decimal, ParseError> {
    match decimal(v, name) {
        Err(ParseError::MissingField(_)) => Ok(Decimal::zero()),
        other => other,
    }
}

fn int(v: &Value, name: &'static str) -> Result<i64, ParseError> {
    let value = field(v, name)?;
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ParseError::InvalidField {
        field: name,
        value: value.to_string(),
    })
}

fn boolean(v: &Value, name: &'static str) -> Result<bool, ParseError> {
    let value = field(v, name)?;
    value.as_bool().ok_or_else(|| ParseError::InvalidField {
        field: name,
        value: value.to_string(),
    })
}

fn side(v: &Value, name: &'static str) -> Result<Side, ParseError> {
    let raw = string(v, name)?;
    Side::from_wire(raw).ok_or_else(|| ParseError::InvalidField {
        field: name,
        value: raw.to_string(),
    })
}

fn opt_int(v: &Value, name: &'static str) -> Option<i64> {
    int(v, name).ok()
}

fn opt_bool(v: &Value, name: &'static str) -> Option<bool> {
    v.get(name).and_then(Value::as_bool)
}

fn opt_string<'a>(v: &'a Value, name: &str) -> Option<&'a str> {
    v.get(name).and_then(Value::as_str)
}
