use super::ReplayEngine;
use crate::domain::{Coin, Decimal, LeverageUpdate};
use crate::state::{AccountState, StateDelta};

/// Advance time with a zero-size perp delta, then set the position's leverage.
///
/// A leverage change may precede the first fill on an asset, so the position
/// is created flat when absent.
pub fn apply_leverage(
    engine: &ReplayEngine,
    state: &AccountState,
    update: &LeverageUpdate,
) -> AccountState {
    let token = engine.normalize(&Coin::new(update.asset_id.as_str()));
    let touched = engine.fold(
        state,
        &[StateDelta::perp(update.time_ms, token.clone(), Decimal::zero())],
    );
    touched.with_perp_leverage(&token, update.leverage)
}
