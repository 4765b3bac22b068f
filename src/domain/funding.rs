//! Funding payment ledger event.

use crate::domain::{Coin, Decimal, TimeMs};
use serde::{Deserialize, Serialize};

/// A periodic perpetual funding cash flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingPayment {
    pub time_ms: TimeMs,
    pub coin: Coin,
    /// Signed USDC amount; positive means the account received funding.
    pub usdc: Decimal,
    /// Signed position size at funding time.
    pub position: Decimal,
    pub rate: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_samples: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl FundingPayment {
    /// Compute a stable key for this payment.
    ///
    /// Funding hashes are shared by every coin settled in the same block
    /// (often all zeros), so the key always hashes the deterministic fields.
    pub fn funding_key(&self) -> String {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(self.time_ms.as_ms().to_le_bytes());
        hasher.update((self.coin.as_str().len() as u32).to_le_bytes());
        hasher.update(self.coin.as_str());
        hasher.update(self.usdc.to_canonical_string());
        hasher.update(self.position.to_canonical_string());
        let hash = hasher.finalize();
        format!("funding:{}", hex::encode(&hash[..16]))
    }
}
