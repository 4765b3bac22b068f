//! TWAP order execution records.

use crate::domain::{Coin, Decimal, Side, TimeMs};
use serde::{Deserialize, Serialize};

/// Lifecycle status reported for a TWAP order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TwapStatus {
    /// Order started; nothing executed yet.
    Activated,
    Finished,
    Terminated,
    Error,
}

impl TwapStatus {
    pub fn from_wire(s: &str) -> Option<TwapStatus> {
        match s.trim() {
            "activated" => Some(TwapStatus::Activated),
            "finished" => Some(TwapStatus::Finished),
            "terminated" => Some(TwapStatus::Terminated),
            "error" => Some(TwapStatus::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TwapStatus::Activated => "activated",
            TwapStatus::Finished => "finished",
            TwapStatus::Terminated => "terminated",
            TwapStatus::Error => "error",
        }
    }
}

/// One entry of a user's TWAP history: the cumulative execution of a TWAP
/// order at a status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwapExecution {
    pub time_ms: TimeMs,
    /// Market as reported; spot markets use the `@<index>` form.
    pub coin: Coin,
    pub side: Side,
    /// Total requested size.
    pub sz: Decimal,
    pub executed_sz: Decimal,
    pub executed_ntl: Decimal,
    pub minutes: i64,
    pub reduce_only: bool,
    pub randomize: bool,
    pub status: TwapStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twap_id: Option<i64>,
}

impl TwapExecution {
    /// TWAPs on spot markets (`@<index>` or `BASE/QUOTE`) trade spot;
    /// everything else is a perp.
    pub fn is_perp(&self) -> bool {
        !self.coin.is_spot_market()
    }

    /// Signed executed size: `+executedSz` for buys, `-executedSz` for sells.
    pub fn signed_executed_size(&self) -> Decimal {
        match self.side {
            Side::Buy => self.executed_sz,
            Side::Sell => -self.executed_sz,
        }
    }

    pub fn twap_key(&self) -> String {
        match self.twap_id {
            Some(id) => format!("twap:{}:{}:{}", id, self.status.as_str(), self.time_ms),
            None => format!(
                "twap:{}:{}:{}",
                self.coin,
                self.status.as_str(),
                self.time_ms
            ),
        }
    }
}
