//! The account event union replayed by the engine.

use crate::domain::{Fill, FundingPayment, LedgerTransaction, LeverageUpdate, TimeMs, TwapExecution};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminant of [`Event`], used for dispatch, logging and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Ledger,
    Twap,
    Fill,
    Funding,
    Leverage,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Ledger => "ledger",
            EventKind::Twap => "twap",
            EventKind::Fill => "fill",
            EventKind::Funding => "funding",
            EventKind::Leverage => "leverage",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One account event, from any of the five upstream streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "event", rename_all = "lowercase")]
pub enum Event {
    Ledger(LedgerTransaction),
    Twap(TwapExecution),
    Fill(Fill),
    Funding(FundingPayment),
    Leverage(LeverageUpdate),
}

impl Event {
    pub fn time(&self) -> TimeMs {
        match self {
            Event::Ledger(tx) => tx.time_ms,
            Event::Twap(twap) => twap.time_ms,
            Event::Fill(fill) => fill.time_ms,
            Event::Funding(funding) => funding.time_ms,
            Event::Leverage(update) => update.time_ms,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Event::Ledger(_) => EventKind::Ledger,
            Event::Twap(_) => EventKind::Twap,
            Event::Fill(_) => EventKind::Fill,
            Event::Funding(_) => EventKind::Funding,
            Event::Leverage(_) => EventKind::Leverage,
        }
    }

    /// Short human label, e.g. `ledger:deposit` or `fill:Open Long`.
    pub fn label(&self) -> String {
        match self {
            Event::Ledger(tx) => format!("ledger:{}", tx.delta.type_name()),
            Event::Twap(twap) => format!("twap:{}", twap.status.as_str()),
            Event::Fill(fill) => format!("fill:{}", fill.dir.as_str()),
            Event::Funding(_) => "funding".to_string(),
            Event::Leverage(_) => "leverage:updateLeverage".to_string(),
        }
    }

    /// Stable identifier of the underlying record.
    pub fn event_key(&self) -> String {
        match self {
            Event::Ledger(tx) => tx.ledger_key(),
            Event::Twap(twap) => twap.twap_key(),
            Event::Fill(fill) => fill.fill_key(),
            Event::Funding(funding) => funding.funding_key(),
            Event::Leverage(update) => update.leverage_key(),
        }
    }
}

impl From<LedgerTransaction> for Event {
    fn from(value: LedgerTransaction) -> Self {
        Event::Ledger(value)
    }
}

impl From<TwapExecution> for Event {
    fn from(value: TwapExecution) -> Self {
        Event::Twap(value)
    }
}

impl From<Fill> for Event {
    fn from(value: Fill) -> Self {
        Event::Fill(value)
    }
}

impl From<FundingPayment> for Event {
    fn from(value: FundingPayment) -> Self {
        Event::Funding(value)
    }
}

impl From<LeverageUpdate> for Event {
    fn from(value: LeverageUpdate) -> Self {
        Event::Leverage(value)
    }
}
