//! Replay driver: order events, fold transformers, collect snapshots.

use super::{ReplayEngine, Transition};
use crate::domain::{sort_events_chronologically, Event};
use crate::state::AccountState;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// One applied event and the snapshot it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayStep {
    pub event: Event,
    pub state: AccountState,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayStats {
    /// Events that produced a step.
    pub applied: usize,
    /// Events of a kind the engine does not model.
    pub skipped_unknown: usize,
    /// Events excluded by configuration.
    pub skipped_filtered: usize,
}

impl ReplayStats {
    pub fn total(&self) -> usize {
        self.applied + self.skipped_unknown + self.skipped_filtered
    }
}

/// Full result of a replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replay {
    pub initial: AccountState,
    pub steps: Vec<ReplayStep>,
    pub stats: ReplayStats,
}

impl Replay {
    /// State after the last step, or the initial state when nothing applied.
    pub fn final_state(&self) -> &AccountState {
        self.steps
            .last()
            .map(|step| &step.state)
            .unwrap_or(&self.initial)
    }

    pub fn states(&self) -> impl Iterator<Item = &AccountState> {
        self.steps.iter().map(|step| &step.state)
    }
}

/// Lazily yields one [`ReplayStep`] per applied event, holding only the
/// current state.
pub struct ReplayIter<'a> {
    engine: &'a ReplayEngine,
    events: std::vec::IntoIter<Event>,
    current: AccountState,
    stats: ReplayStats,
}

impl<'a> ReplayIter<'a> {
    pub fn stats(&self) -> ReplayStats {
        self.stats
    }

    /// The most recently produced state.
    pub fn current(&self) -> &AccountState {
        &self.current
    }

    pub fn into_current(self) -> AccountState {
        self.current
    }
}

impl Iterator for ReplayIter<'_> {
    type Item = ReplayStep;

    fn next(&mut self) -> Option<ReplayStep> {
        for event in self.events.by_ref() {
            match self.engine.apply(&self.current, &event) {
                Transition::Applied(state) => {
                    trace!(event = %event.label(), time = %state.time, "applied");
                    self.stats.applied += 1;
                    self.current = state.clone();
                    return Some(ReplayStep { event, state });
                }
                Transition::SkippedUnknown => {
                    warn!(
                        event = %event.label(),
                        key = %event.event_key(),
                        "skipping unrecognised event"
                    );
                    self.stats.skipped_unknown += 1;
                }
                Transition::Filtered => {
                    debug!(event = %event.label(), key = %event.event_key(), "event filtered");
                    self.stats.skipped_filtered += 1;
                }
            }
        }
        None
    }
}

impl ReplayEngine {
    /// Replay `events` over `initial`, keeping every intermediate snapshot.
    ///
    /// Events are sorted by time first; ties keep their input order.
    pub fn replay(&self, initial: AccountState, events: Vec<Event>) -> Replay {
        let mut iter = self.iter(initial.clone(), events);
        let steps: Vec<ReplayStep> = iter.by_ref().collect();
        let stats = iter.stats();

        debug!(
            user = %initial.user,
            applied = stats.applied,
            skipped_unknown = stats.skipped_unknown,
            skipped_filtered = stats.skipped_filtered,
            "replay complete"
        );

        Replay {
            initial,
            steps,
            stats,
        }
    }

    pub fn iter(&self, initial: AccountState, mut events: Vec<Event>) -> ReplayIter<'_> {
        sort_events_chronologically(&mut events);
        ReplayIter {
            engine: self,
            events: events.into_iter(),
            current: initial,
            stats: ReplayStats::default(),
        }
    }
}

/// Fold all events without keeping history.
pub fn final_state(
    engine: &ReplayEngine,
    initial: AccountState,
    events: Vec<Event>,
) -> (AccountState, ReplayStats) {
    let mut iter = engine.iter(initial, events);
    iter.by_ref().for_each(drop);
    let stats = iter.stats();
    (iter.into_current(), stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Address, Coin, Decimal, LedgerDelta, LedgerTransaction, TimeMs};
    use crate::engine::{EngineConfig, ReplayEngine};
    use crate::symbols::SymbolTable;

    fn deposit(time: i64, usdc: i64) -> Event {
        LedgerTransaction::new(
            TimeMs::new(time),
            None,
            LedgerDelta::Deposit {
                usdc: Decimal::from_i64(usdc),
            },
        )
        .into()
    }

    fn unknown(time: i64) -> Event {
        LedgerTransaction::new(
            TimeMs::new(time),
            None,
            LedgerDelta::Unknown {
                kind: "borrowLend".to_string(),
            },
        )
        .into()
    }

    fn initial() -> AccountState {
        AccountState::new(Address::new("0xabc"), TimeMs::new(0))
    }

    #[test]
    fn test_replay_sorts_and_counts() {
        let engine = ReplayEngine::default();
        let replay = engine.replay(initial(), vec![deposit(200, 2), unknown(150), deposit(100, 1)]);

        assert_eq!(replay.steps.len(), 2);
        assert_eq!(replay.steps[0].event.time(), TimeMs::new(100));
        assert_eq!(replay.final_state().spot_usdc, Decimal::from_i64(3));
        assert_eq!(
            replay.stats,
            ReplayStats {
                applied: 2,
                skipped_unknown: 1,
                skipped_filtered: 0
            }
        );
        assert_eq!(replay.stats.total(), 3);
    }

    #[test]
    fn test_empty_replay_returns_initial() {
        let engine = ReplayEngine::default();
        let replay = engine.replay(initial(), Vec::new());
        assert!(replay.steps.is_empty());
        assert_eq!(replay.final_state(), &initial());
    }

    #[test]
    fn test_final_state_matches_replay() {
        let engine = ReplayEngine::default();
        let events = vec![deposit(1, 5), deposit(2, 7), unknown(3)];
        let replay = engine.replay(initial(), events.clone());
        let (state, stats) = final_state(&engine, initial(), events);
        assert_eq!(&state, replay.final_state());
        assert_eq!(stats, replay.stats);
    }

    #[test]
    fn test_twap_fills_filtered_when_configured() {
        use crate::domain::{Direction, Fill, Side};

        let config = EngineConfig {
            skip_twap_fills: true,
            ..EngineConfig::default()
        };
        let engine = ReplayEngine::new(config, SymbolTable::builtin());
        let fill = Fill::new(
            TimeMs::new(10),
            Coin::new("BTC"),
            Side::Buy,
            Decimal::from_i64(100),
            Decimal::one(),
            Decimal::zero(),
            Direction::OpenLong,
        )
        .with_twap_id(3);

        let replay = engine.replay(initial(), vec![fill.into()]);
        assert!(replay.steps.is_empty());
        assert_eq!(replay.stats.skipped_filtered, 1);
    }
}
