//! Leverage change actions recovered from the explorer transaction log.

use crate::domain::{Decimal, TimeMs};
use serde::{Deserialize, Serialize};

/// An `updateLeverage` action submitted by the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeverageUpdate {
    pub time_ms: TimeMs,
    /// Perp asset index as sent in the action (`"159"`); normalized before use.
    pub asset_id: String,
    pub is_cross: bool,
    /// Always > 0.
    pub leverage: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl LeverageUpdate {
    pub fn leverage_key(&self) -> String {
        match self.hash.as_deref() {
            Some(hash) => format!("{}:updateLeverage", hash.to_lowercase()),
            None => format!("leverage:{}:{}", self.asset_id, self.time_ms),
        }
    }
}
