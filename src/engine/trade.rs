//! Fills and TWAP executions → position and USDC deltas.

use super::ReplayEngine;
use crate::domain::{Decimal, Fill, Side, TwapExecution, TwapStatus};
use crate::state::{AccountState, StateDelta};

/// A perp fill moves the position by its signed size and perp USDC by the
/// leveraged notional; a spot fill moves the spot balance and spot USDC by
/// the full notional.
pub fn fill_deltas(engine: &ReplayEngine, state: &AccountState, fill: &Fill) -> Vec<StateDelta> {
    let time = fill.time_ms;
    let token = engine.normalize(&fill.coin);
    let size_delta = fill.signed_size();
    let notional = fill.notional();

    if fill.dir.is_perp() {
        let leverage = engine.leverage_for(state, &token);
        let margin = engine.perp_margin_delta(
            &token,
            notional,
            leverage,
            fill.start_position,
            size_delta,
        );
        vec![
            StateDelta::perp(time, token, size_delta),
            StateDelta::perp(time, engine.usdc().clone(), margin),
        ]
    } else {
        vec![
            StateDelta::spot(time, token, size_delta),
            StateDelta::spot(time, engine.usdc().clone(), spot_cash_delta(fill.side, notional)),
        ]
    }
}

/// Same rules as fills, using the executed size and notional. The starting
/// position is read from the current state since TWAP records carry none.
pub fn twap_deltas(
    engine: &ReplayEngine,
    state: &AccountState,
    twap: &TwapExecution,
) -> Vec<StateDelta> {
    if twap.status == TwapStatus::Activated {
        return Vec::new();
    }

    let time = twap.time_ms;
    let token = engine.normalize(&twap.coin);
    let size_delta = twap.signed_executed_size();

    if twap.is_perp() {
        let (start_position, leverage) = match state.perp_position(&token) {
            Some(pos) => (pos.size, pos.leverage),
            None => (Decimal::zero(), engine.config().default_leverage),
        };
        let margin = engine.perp_margin_delta(
            &token,
            twap.executed_ntl,
            leverage,
            start_position,
            size_delta,
        );
        vec![
            StateDelta::perp(time, token, size_delta),
            StateDelta::perp(time, engine.usdc().clone(), margin),
        ]
    } else {
        vec![
            StateDelta::spot(time, token, size_delta),
            StateDelta::spot(
                time,
                engine.usdc().clone(),
                spot_cash_delta(twap.side, twap.executed_ntl),
            ),
        ]
    }
}

fn spot_cash_delta(side: Side, notional: Decimal) -> Decimal {
    match side {
        Side::Buy => -notional,
        Side::Sell => notional,
    }
}
