use super::ReplayEngine;
use crate::domain::FundingPayment;
use crate::state::StateDelta;

/// Funding is already signed by the exchange and settles in perp USDC.
pub fn funding_deltas(engine: &ReplayEngine, payment: &FundingPayment) -> Vec<StateDelta> {
    vec![StateDelta::perp(
        payment.time_ms,
        engine.usdc().clone(),
        payment.usdc,
    )]
}
