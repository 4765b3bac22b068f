use crate::domain::{Address, Coin, Decimal};
use serde::{Deserialize, Serialize};

/// A spot token holding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotPosition {
    pub token: Coin,
    pub balance: Decimal,
    /// Left at its initial value; valuation happens outside the engine.
    pub usdc_value: Decimal,
}

impl SpotPosition {
    pub fn new(token: Coin, balance: Decimal) -> Self {
        Self {
            token,
            balance,
            usdc_value: Decimal::zero(),
        }
    }
}

/// A perpetual position. Positive size is long, negative is short.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerpPosition {
    pub token: Coin,
    pub size: Decimal,
    pub leverage: Decimal,
    pub entry_price: Decimal,
    pub usdc_value: Decimal,
}

impl PerpPosition {
    pub fn new(token: Coin, size: Decimal, leverage: Decimal) -> Self {
        Self {
            token,
            size,
            leverage,
            entry_price: Decimal::zero(),
            usdc_value: Decimal::zero(),
        }
    }

    pub fn is_flat(&self) -> bool {
        self.size.is_zero()
    }
}

/// Principal deposited into a vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultPosition {
    pub vault: Address,
    pub balance: Decimal,
    pub usdc_value: Decimal,
}

impl VaultPosition {
    pub fn new(vault: Address, balance: Decimal) -> Self {
        Self {
            vault,
            balance,
            usdc_value: Decimal::zero(),
        }
    }
}
