//! Account state snapshots and the primitive update applied to them.
//!
//! An [`AccountState`] is never mutated after it is produced. Position maps
//! hold `Arc`s, so a new snapshot shares every untouched entry with its
//! predecessor and rebuilds only the entry a delta touches.

use crate::domain::{Address, Coin, Decimal, TimeMs};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

pub mod delta;
pub mod positions;

pub use delta::{Pool, StateDelta};
pub use positions::{PerpPosition, SpotPosition, VaultPosition};

/// Parameters of the primitive update that are fixed for a whole replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaRules {
    /// Token whose deltas move the pool USDC balances instead of a position.
    pub usdc: Coin,
    /// Leverage given to perp positions created by a delta.
    pub default_leverage: Decimal,
}

/// A snapshot of one account after some prefix of its event history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub user: Address,
    /// Time of the last applied event.
    pub time: TimeMs,
    pub spot_usdc: Decimal,
    pub perp_usdc: Decimal,
    pub spot_positions: BTreeMap<Coin, Arc<SpotPosition>>,
    pub perp_positions: BTreeMap<Coin, Arc<PerpPosition>>,
    pub vault_positions: BTreeMap<Address, Arc<VaultPosition>>,
}

impl AccountState {
    /// Zero balances and no positions.
    pub fn new(user: Address, time: TimeMs) -> Self {
        Self {
            user,
            time,
            spot_usdc: Decimal::zero(),
            perp_usdc: Decimal::zero(),
            spot_positions: BTreeMap::new(),
            perp_positions: BTreeMap::new(),
            vault_positions: BTreeMap::new(),
        }
    }

    /// Apply one delta and return the resulting snapshot.
    ///
    /// USDC deltas move `spot_usdc` or `perp_usdc`; a USDC vault delta is
    /// applied negated onto `perp_usdc` and added to the vault's principal.
    /// Other tokens change only the `size`/`balance` of their position,
    /// creating it on first touch.
    pub fn apply_delta(&self, delta: &StateDelta, rules: &DeltaRules) -> AccountState {
        let mut next = self.clone();
        next.time = delta.time;

        let is_usdc = delta.token == rules.usdc;
        match &delta.pool {
            Pool::Spot if is_usdc => next.spot_usdc = next.spot_usdc + delta.delta,
            Pool::Perp if is_usdc => next.perp_usdc = next.perp_usdc + delta.delta,
            Pool::Spot => {
                let position = match next.spot_positions.get(&delta.token) {
                    Some(old) => SpotPosition {
                        balance: old.balance + delta.delta,
                        ..old.as_ref().clone()
                    },
                    None => SpotPosition::new(delta.token.clone(), delta.delta),
                };
                next.spot_positions
                    .insert(delta.token.clone(), Arc::new(position));
            }
            Pool::Perp => {
                let position = match next.perp_positions.get(&delta.token) {
                    Some(old) => PerpPosition {
                        size: old.size + delta.delta,
                        ..old.as_ref().clone()
                    },
                    None => PerpPosition::new(
                        delta.token.clone(),
                        delta.delta,
                        rules.default_leverage,
                    ),
                };
                next.perp_positions
                    .insert(delta.token.clone(), Arc::new(position));
            }
            Pool::Vault(vault) => {
                if is_usdc {
                    next.perp_usdc = next.perp_usdc - delta.delta;
                }
                let position = match next.vault_positions.get(vault) {
                    Some(old) => VaultPosition {
                        balance: old.balance + delta.delta,
                        ..old.as_ref().clone()
                    },
                    None => VaultPosition::new(vault.clone(), delta.delta),
                };
                next.vault_positions.insert(vault.clone(), Arc::new(position));
            }
        }

        next
    }

    /// Return a snapshot whose perp position for `token` carries `leverage`.
    ///
    /// The position is created with zero size when absent.
    pub fn with_perp_leverage(&self, token: &Coin, leverage: Decimal) -> AccountState {
        let mut next = self.clone();
        let position = match next.perp_positions.get(token) {
            Some(old) => PerpPosition {
                leverage,
                ..old.as_ref().clone()
            },
            None => PerpPosition::new(token.clone(), Decimal::zero(), leverage),
        };
        next.perp_positions.insert(token.clone(), Arc::new(position));
        next
    }

    pub fn perp_position(&self, token: &Coin) -> Option<&PerpPosition> {
        self.perp_positions.get(token).map(Arc::as_ref)
    }

    pub fn spot_position(&self, token: &Coin) -> Option<&SpotPosition> {
        self.spot_positions.get(token).map(Arc::as_ref)
    }

    pub fn vault_position(&self, vault: &Address) -> Option<&VaultPosition> {
        self.vault_positions.get(vault).map(Arc::as_ref)
    }

    /// `spot_usdc + perp_usdc`.
    pub fn total_usdc(&self) -> Decimal {
        self.spot_usdc + self.perp_usdc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> DeltaRules {
        DeltaRules {
            usdc: Coin::new("USDC"),
            default_leverage: Decimal::from_i64(10),
        }
    }

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn zero_state() -> AccountState {
        AccountState::new(Address::new("0xabc"), TimeMs::new(0))
    }

    #[test]
    fn test_usdc_routing() {
        let usdc = Coin::new("USDC");
        let state = zero_state()
            .apply_delta(&StateDelta::spot(TimeMs::new(1), usdc.clone(), d("100")), &rules())
            .apply_delta(&StateDelta::perp(TimeMs::new(2), usdc.clone(), d("50")), &rules());

        assert_eq!(state.spot_usdc, d("100"));
        assert_eq!(state.perp_usdc, d("50"));
        assert!(state.spot_positions.is_empty());
        assert!(state.perp_positions.is_empty());
        assert_eq!(state.time, TimeMs::new(2));
    }

    #[test]
    fn test_usdc_vault_delta_negates_onto_perp() {
        let vault = Address::new("0xvault");
        let state = zero_state().apply_delta(
            &StateDelta::vault(TimeMs::new(1), vault.clone(), Coin::new("USDC"), d("25")),
            &rules(),
        );

        assert_eq!(state.perp_usdc, d("-25"));
        assert_eq!(state.spot_usdc, Decimal::zero());
        assert_eq!(state.vault_position(&vault).unwrap().balance, d("25"));
    }

    #[test]
    fn test_perp_position_created_with_default_leverage() {
        let btc = Coin::new("BTC");
        let state =
            zero_state().apply_delta(&StateDelta::perp(TimeMs::new(1), btc.clone(), d("0.5")), &rules());

        let pos = state.perp_position(&btc).unwrap();
        assert_eq!(pos.size, d("0.5"));
        assert_eq!(pos.leverage, Decimal::from_i64(10));
        assert_eq!(pos.entry_price, Decimal::zero());
        assert_eq!(pos.usdc_value, Decimal::zero());
    }

    #[test]
    fn test_perp_delta_only_touches_size() {
        let btc = Coin::new("BTC");
        let state = zero_state()
            .with_perp_leverage(&btc, Decimal::from_i64(3))
            .apply_delta(&StateDelta::perp(TimeMs::new(1), btc.clone(), d("2")), &rules())
            .apply_delta(&StateDelta::perp(TimeMs::new(2), btc.clone(), d("-0.5")), &rules());

        let pos = state.perp_position(&btc).unwrap();
        assert_eq!(pos.size, d("1.5"));
        assert_eq!(pos.leverage, Decimal::from_i64(3));
    }

    #[test]
    fn test_spot_balance_accumulates() {
        let hype = Coin::new("HYPE");
        let state = zero_state()
            .apply_delta(&StateDelta::spot(TimeMs::new(1), hype.clone(), d("10")), &rules())
            .apply_delta(&StateDelta::spot(TimeMs::new(2), hype.clone(), d("-3.5")), &rules());

        assert_eq!(state.spot_position(&hype).unwrap().balance, d("6.5"));
    }

    #[test]
    fn test_previous_snapshot_unchanged() {
        let btc = Coin::new("BTC");
        let first =
            zero_state().apply_delta(&StateDelta::perp(TimeMs::new(1), btc.clone(), d("1")), &rules());
        let second = first.apply_delta(&StateDelta::perp(TimeMs::new(2), btc.clone(), d("1")), &rules());

        assert_eq!(first.perp_position(&btc).unwrap().size, d("1"));
        assert_eq!(second.perp_position(&btc).unwrap().size, d("2"));
        assert!(!Arc::ptr_eq(
            &first.perp_positions[&btc],
            &second.perp_positions[&btc]
        ));
    }

    #[test]
    fn test_untouched_entries_are_shared() {
        let btc = Coin::new("BTC");
        let eth = Coin::new("ETH");
        let first = zero_state()
            .apply_delta(&StateDelta::perp(TimeMs::new(1), btc.clone(), d("1")), &rules())
            .apply_delta(&StateDelta::perp(TimeMs::new(1), eth.clone(), d("1")), &rules());
        let second = first.apply_delta(&StateDelta::perp(TimeMs::new(2), eth.clone(), d("1")), &rules());

        assert!(Arc::ptr_eq(
            &first.perp_positions[&btc],
            &second.perp_positions[&btc]
        ));
    }

    #[test]
    fn test_with_perp_leverage_creates_flat_position() {
        let hype = Coin::new("HYPE");
        let state = zero_state().with_perp_leverage(&hype, Decimal::from_i64(5));

        let pos = state.perp_position(&hype).unwrap();
        assert!(pos.is_flat());
        assert_eq!(pos.leverage, Decimal::from_i64(5));
    }
}
