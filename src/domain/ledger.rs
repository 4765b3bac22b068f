//! Non-funding ledger transactions (deposits, withdrawals, transfers, staking).

use crate::domain::{Address, Coin, Decimal, TimeMs};
use serde::{Deserialize, Serialize};

/// A ledger transaction: one balance-affecting, non-trading change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub time_ms: TimeMs,
    /// Transaction hash when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    pub delta: LedgerDelta,
}

/// The typed payload of a ledger transaction, discriminated by the wire `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LedgerDelta {
    /// Bridge deposit.
    Deposit { usdc: Decimal },
    /// Bridge withdrawal; `usdc` is already net of the fee.
    Withdraw {
        usdc: Decimal,
        fee: Decimal,
        #[serde(skip_serializing_if = "Option::is_none")]
        nonce: Option<i64>,
    },
    /// USDC sent between accounts.
    InternalTransfer {
        usdc: Decimal,
        user: Address,
        destination: Address,
        fee: Decimal,
    },
    /// USDC moved between the spot and perp pools of the same account.
    AccountClassTransfer { usdc: Decimal, to_perp: bool },
    /// Arbitrary spot token sent between accounts.
    SpotTransfer {
        token: Coin,
        amount: Decimal,
        usdc_value: Decimal,
        user: Address,
        destination: Address,
        fee: Decimal,
    },
    /// Staking (`is_deposit`) or unstaking of a spot token.
    CStakingTransfer {
        token: Coin,
        amount: Decimal,
        is_deposit: bool,
    },
    /// Gas paid to activate the account.
    AccountActivationGas { token: Coin, amount: Decimal },
    VaultDeposit { vault: Address, usdc: Decimal },
    VaultWithdraw {
        vault: Address,
        requested_usd: Decimal,
        commission: Decimal,
        closing_cost: Decimal,
        basis: Decimal,
        net_withdrawn_usd: Decimal,
    },
    /// A ledger type this crate does not model. Kept so it can be counted
    /// and skipped by the replay instead of vanishing at parse time.
    Unknown { kind: String },
}

impl LedgerDelta {
    /// The wire discriminant (`"deposit"`, `"spotTransfer"`, ...).
    pub fn type_name(&self) -> &str {
        match self {
            LedgerDelta::Deposit { .. } => "deposit",
            LedgerDelta::Withdraw { .. } => "withdraw",
            LedgerDelta::InternalTransfer { .. } => "internalTransfer",
            LedgerDelta::AccountClassTransfer { .. } => "accountClassTransfer",
            LedgerDelta::SpotTransfer { .. } => "spotTransfer",
            LedgerDelta::CStakingTransfer { .. } => "cStakingTransfer",
            LedgerDelta::AccountActivationGas { .. } => "accountActivationGas",
            LedgerDelta::VaultDeposit { .. } => "vaultDeposit",
            LedgerDelta::VaultWithdraw { .. } => "vaultWithdraw",
            LedgerDelta::Unknown { kind } => kind,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, LedgerDelta::Unknown { .. })
    }
}

impl LedgerTransaction {
    pub fn new(time_ms: TimeMs, hash: Option<String>, delta: LedgerDelta) -> Self {
        Self {
            time_ms,
            hash: normalize_tx_hash(hash),
            delta,
        }
    }

    /// Compute a stable unique key for this transaction.
    ///
    /// Priority: `hash` (if present) > hash of deterministic fields
    /// (time, type). The type is always appended because one transaction hash
    /// can carry several ledger deltas.
    pub fn ledger_key(&self) -> String {
        if let Some(tx) = self.hash.as_deref() {
            return format!("{}:{}", tx, self.delta.type_name());
        }

        use sha2::{Digest, Sha256};

        fn hash_var(hasher: &mut Sha256, data: &str) {
            hasher.update((data.len() as u32).to_le_bytes());
            hasher.update(data.as_bytes());
        }

        let mut hasher = Sha256::new();
        hasher.update(self.time_ms.as_ms().to_le_bytes());
        hash_var(&mut hasher, self.delta.type_name());
        // serde_json output is stable for a given value; the enum carries no maps.
        hash_var(&mut hasher, &serde_json::to_string(&self.delta).unwrap_or_default());

        let hash = hasher.finalize();
        format!("hash:{}", hex::encode(&hash[..16]))
    }
}

fn normalize_tx_hash(tx_hash: Option<String>) -> Option<String> {
    tx_hash
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
}
