//! Pure, deterministic replay of account events into state snapshots.
//!
//! Each event kind has a transformer that expands the event into
//! [`StateDelta`]s against the current snapshot; the driver in [`replay`]
//! folds them in timestamp order.

use crate::domain::{Coin, Decimal, Event};
use crate::state::{AccountState, DeltaRules, StateDelta};
use crate::symbols::SymbolTable;
use tracing::warn;

pub mod funding;
pub mod ledger;
pub mod leverage;
pub mod replay;
pub mod trade;

pub use replay::{final_state, Replay, ReplayIter, ReplayStats, ReplayStep};

/// Leverage assumed for a perp position that has never seen a leverage update.
pub const DEFAULT_LEVERAGE: i64 = 10;

/// Symbol of the quote/settlement token.
pub const USDC: &str = "USDC";

/// Engine-wide constants, overridable per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub default_leverage: Decimal,
    pub usdc_symbol: Coin,
    /// Drop fills that belong to a TWAP; the TWAP execution already carries
    /// their size and notional.
    pub skip_twap_fills: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_leverage: Decimal::from_i64(DEFAULT_LEVERAGE),
            usdc_symbol: Coin::new(USDC),
            skip_twap_fills: false,
        }
    }
}

/// Outcome of feeding one event to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Applied(AccountState),
    /// The event's kind is not modelled; state is unchanged.
    SkippedUnknown,
    /// The event was excluded by configuration.
    Filtered,
}

/// Applies events to account state.
#[derive(Debug, Clone)]
pub struct ReplayEngine {
    config: EngineConfig,
    symbols: SymbolTable,
    rules: DeltaRules,
}

impl ReplayEngine {
    pub fn new(config: EngineConfig, symbols: SymbolTable) -> Self {
        let rules = DeltaRules {
            usdc: config.usdc_symbol.clone(),
            default_leverage: config.default_leverage,
        };
        Self {
            config,
            symbols,
            rules,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Compute the state that follows `state` after `event`.
    pub fn apply(&self, state: &AccountState, event: &Event) -> Transition {
        let deltas = match event {
            Event::Ledger(tx) if tx.delta.is_unknown() => return Transition::SkippedUnknown,
            Event::Ledger(tx) => ledger::ledger_deltas(self, state, tx),
            Event::Twap(twap) => trade::twap_deltas(self, state, twap),
            Event::Fill(fill) if self.config.skip_twap_fills && fill.twap_id.is_some() => {
                return Transition::Filtered
            }
            Event::Fill(fill) => trade::fill_deltas(self, state, fill),
            Event::Funding(payment) => funding::funding_deltas(self, payment),
            Event::Leverage(update) => {
                return Transition::Applied(leverage::apply_leverage(self, state, update))
            }
        };

        Transition::Applied(self.fold(state, &deltas))
    }

    /// Apply `deltas` in order. An empty list returns an equal snapshot.
    pub fn fold(&self, state: &AccountState, deltas: &[StateDelta]) -> AccountState {
        deltas
            .iter()
            .fold(state.clone(), |acc, delta| acc.apply_delta(delta, &self.rules))
    }

    pub(crate) fn usdc(&self) -> &Coin {
        &self.config.usdc_symbol
    }

    pub(crate) fn normalize(&self, coin: &Coin) -> Coin {
        self.symbols.normalize(coin)
    }

    /// Leverage of the perp position on `token`, or the default when there
    /// is none yet.
    pub(crate) fn leverage_for(&self, state: &AccountState, token: &Coin) -> Decimal {
        state
            .perp_position(token)
            .map(|p| p.leverage)
            .unwrap_or(self.config.default_leverage)
    }

    /// `-gross / leverage`, sign-flipped when the trade reduces the position
    /// it starts from.
    pub(crate) fn perp_margin_delta(
        &self,
        token: &Coin,
        gross_notional: Decimal,
        leverage: Decimal,
        start_position: Decimal,
        size_delta: Decimal,
    ) -> Decimal {
        let margin = match gross_notional.checked_div(leverage) {
            Some(m) => m,
            None => {
                warn!(
                    token = %token,
                    leverage = %leverage,
                    "unusable leverage, falling back to default"
                );
                gross_notional
                    .checked_div(self.config.default_leverage)
                    .unwrap_or_default()
            }
        };

        if start_position.opposes(&size_delta) {
            margin
        } else {
            -margin
        }
    }
}

impl Default for ReplayEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default(), SymbolTable::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Address, TimeMs};

    #[test]
    fn test_perp_margin_delta_sign() {
        let engine = ReplayEngine::default();
        let btc = Coin::new("BTC");
        let five = Decimal::from_i64(5);

        let open = engine.perp_margin_delta(
            &btc,
            Decimal::from_i64(200),
            five,
            Decimal::zero(),
            Decimal::from_i64(10),
        );
        assert_eq!(open, Decimal::from_i64(-40));

        let close = engine.perp_margin_delta(
            &btc,
            Decimal::from_i64(200),
            five,
            Decimal::from_i64(-10),
            Decimal::from_i64(10),
        );
        assert_eq!(close, Decimal::from_i64(40));
    }

    #[test]
    fn test_zero_leverage_falls_back_to_default() {
        let engine = ReplayEngine::default();
        let margin = engine.perp_margin_delta(
            &Coin::new("BTC"),
            Decimal::from_i64(200),
            Decimal::zero(),
            Decimal::zero(),
            Decimal::one(),
        );
        assert_eq!(margin, Decimal::from_i64(-20));
    }

    #[test]
    fn test_leverage_for_defaults() {
        let engine = ReplayEngine::default();
        let state = AccountState::new(Address::new("0xabc"), TimeMs::new(0));
        assert_eq!(
            engine.leverage_for(&state, &Coin::new("ETH")),
            Decimal::from_i64(DEFAULT_LEVERAGE)
        );
    }
}
