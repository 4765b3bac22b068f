use crate::domain::{Address, Coin, Decimal, TimeMs};

/// Which balance pool a delta lands in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pool {
    Spot,
    Perp,
    /// Vault principal held in the given vault.
    Vault(Address),
}

/// A primitive signed balance/position change produced by a transformer.
///
/// Never persisted; one event expands to zero, one or two of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDelta {
    pub time: TimeMs,
    pub token: Coin,
    pub pool: Pool,
    pub delta: Decimal,
}

impl StateDelta {
    pub fn spot(time: TimeMs, token: Coin, delta: Decimal) -> Self {
        Self {
            time,
            token,
            pool: Pool::Spot,
            delta,
        }
    }

    pub fn perp(time: TimeMs, token: Coin, delta: Decimal) -> Self {
        Self {
            time,
            token,
            pool: Pool::Perp,
            delta,
        }
    }

    pub fn vault(time: TimeMs, vault: Address, token: Coin, delta: Decimal) -> Self {
        Self {
            time,
            token,
            pool: Pool::Vault(vault),
            delta,
        }
    }
}
