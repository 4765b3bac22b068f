//! Ledger transactions → deltas.

use super::ReplayEngine;
use crate::domain::{Address, Decimal, LedgerDelta, LedgerTransaction};
use crate::state::{AccountState, StateDelta};

/// Expand a ledger transaction into spot/perp/vault deltas.
///
/// `Unknown` deltas yield nothing; the caller decides how to report them.
pub fn ledger_deltas(
    engine: &ReplayEngine,
    state: &AccountState,
    tx: &LedgerTransaction,
) -> Vec<StateDelta> {
    let time = tx.time_ms;
    let usdc = engine.usdc().clone();

    match &tx.delta {
        LedgerDelta::Deposit { usdc: amount } => vec![StateDelta::spot(time, usdc, *amount)],
        LedgerDelta::Withdraw { usdc: amount, .. } => vec![StateDelta::spot(time, usdc, -*amount)],
        LedgerDelta::InternalTransfer {
            usdc: amount,
            user,
            destination,
            ..
        } => transfer_deltas(state, user, destination, *amount, |d| {
            StateDelta::spot(time, usdc.clone(), d)
        }),
        LedgerDelta::AccountClassTransfer {
            usdc: amount,
            to_perp,
        } => {
            let into_perp = if *to_perp { *amount } else { -*amount };
            vec![
                StateDelta::spot(time, usdc.clone(), -into_perp),
                StateDelta::perp(time, usdc, into_perp),
            ]
        }
        LedgerDelta::SpotTransfer {
            token,
            amount,
            user,
            destination,
            ..
        } => {
            let token = engine.normalize(token);
            transfer_deltas(state, user, destination, *amount, |d| {
                StateDelta::spot(time, token.clone(), d)
            })
        }
        LedgerDelta::CStakingTransfer {
            token,
            amount,
            is_deposit,
        } => {
            let delta = if *is_deposit { *amount } else { -*amount };
            vec![StateDelta::spot(time, engine.normalize(token), delta)]
        }
        LedgerDelta::AccountActivationGas { token, amount } => {
            vec![StateDelta::spot(time, engine.normalize(token), -*amount)]
        }
        LedgerDelta::VaultDeposit { vault, usdc: amount } => {
            vec![StateDelta::vault(time, vault.clone(), usdc, *amount)]
        }
        LedgerDelta::VaultWithdraw {
            vault,
            net_withdrawn_usd,
            ..
        } => vec![StateDelta::vault(time, vault.clone(), usdc, -*net_withdrawn_usd)],
        LedgerDelta::Unknown { .. } => Vec::new(),
    }
}

/// Sender and recipient checks are independent, so a self-transfer nets to zero.
fn transfer_deltas(
    state: &AccountState,
    sender: &Address,
    recipient: &Address,
    amount: Decimal,
    make: impl Fn(Decimal) -> StateDelta,
) -> Vec<StateDelta> {
    let mut deltas = Vec::with_capacity(2);
    if sender.matches(&state.user) {
        deltas.push(make(-amount));
    }
    if recipient.matches(&state.user) {
        deltas.push(make(amount));
    }
    deltas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coin, TimeMs};

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn me() -> Address {
        Address::new("0xAbC")
    }

    fn state() -> AccountState {
        AccountState::new(me(), TimeMs::new(0))
    }

    fn tx(delta: LedgerDelta) -> LedgerTransaction {
        LedgerTransaction::new(TimeMs::new(1_000), Some("0x01".to_string()), delta)
    }

    #[test]
    fn test_deposit_and_withdraw() {
        let engine = ReplayEngine::default();
        let deposit = ledger_deltas(&engine, &state(), &tx(LedgerDelta::Deposit { usdc: d("100") }));
        assert_eq!(deposit, vec![StateDelta::spot(TimeMs::new(1_000), Coin::new("USDC"), d("100"))]);

        let withdraw = ledger_deltas(
            &engine,
            &state(),
            &tx(LedgerDelta::Withdraw {
                usdc: d("40"),
                fee: d("1"),
                nonce: None,
            }),
        );
        assert_eq!(withdraw[0].delta, d("-40"));
    }

    #[test]
    fn test_internal_transfer_direction() {
        let engine = ReplayEngine::default();
        let out = ledger_deltas(
            &engine,
            &state(),
            &tx(LedgerDelta::InternalTransfer {
                usdc: d("5"),
                user: Address::new("0xabc"),
                destination: Address::new("0xdef"),
                fee: Decimal::zero(),
            }),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].delta, d("-5"));

        let unrelated = ledger_deltas(
            &engine,
            &state(),
            &tx(LedgerDelta::InternalTransfer {
                usdc: d("5"),
                user: Address::new("0x111"),
                destination: Address::new("0x222"),
                fee: Decimal::zero(),
            }),
        );
        assert!(unrelated.is_empty());
    }

    #[test]
    fn test_account_class_transfer_from_perp() {
        let engine = ReplayEngine::default();
        let deltas = ledger_deltas(
            &engine,
            &state(),
            &tx(LedgerDelta::AccountClassTransfer {
                usdc: d("30"),
                to_perp: false,
            }),
        );
        let next = engine.fold(&state(), &deltas);
        assert_eq!(next.spot_usdc, d("30"));
        assert_eq!(next.perp_usdc, d("-30"));
    }

    #[test]
    fn test_spot_transfer_normalizes_token() {
        let engine = ReplayEngine::default();
        let deltas = ledger_deltas(
            &engine,
            &state(),
            &tx(LedgerDelta::SpotTransfer {
                token: Coin::new("@107"),
                amount: d("2"),
                usdc_value: d("50"),
                user: Address::new("0xdef"),
                destination: me(),
                fee: Decimal::zero(),
            }),
        );
        assert_eq!(deltas, vec![StateDelta::spot(TimeMs::new(1_000), Coin::new("HYPE"), d("2"))]);
    }

    #[test]
    fn test_staking_and_gas() {
        let engine = ReplayEngine::default();
        let hype = Coin::new("HYPE");
        let unstake = ledger_deltas(
            &engine,
            &state(),
            &tx(LedgerDelta::CStakingTransfer {
                token: hype.clone(),
                amount: d("3"),
                is_deposit: false,
            }),
        );
        assert_eq!(unstake[0].delta, d("-3"));

        let gas = ledger_deltas(
            &engine,
            &state(),
            &tx(LedgerDelta::AccountActivationGas {
                token: hype,
                amount: d("0.1"),
            }),
        );
        assert_eq!(gas[0].delta, d("-0.1"));
    }

    #[test]
    fn test_vault_flows() {
        let engine = ReplayEngine::default();
        let vault = Address::new("0xvault");
        let deposit = ledger_deltas(
            &engine,
            &state(),
            &tx(LedgerDelta::VaultDeposit {
                vault: vault.clone(),
                usdc: d("100"),
            }),
        );
        let after_deposit = engine.fold(&state(), &deposit);
        assert_eq!(after_deposit.perp_usdc, d("-100"));
        assert_eq!(after_deposit.vault_position(&vault).unwrap().balance, d("100"));

        let withdraw = ledger_deltas(
            &engine,
            &after_deposit,
            &tx(LedgerDelta::VaultWithdraw {
                vault: vault.clone(),
                requested_usd: d("110"),
                commission: d("1"),
                closing_cost: Decimal::zero(),
                basis: d("100"),
                net_withdrawn_usd: d("109"),
            }),
        );
        let after_withdraw = engine.fold(&after_deposit, &withdraw);
        assert_eq!(after_withdraw.perp_usdc, d("9"));
        assert_eq!(after_withdraw.vault_position(&vault).unwrap().balance, d("-9"));
    }
}
