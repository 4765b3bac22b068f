//! Domain types for Hyperliquid account state reconstruction.
//!
//! This module provides:
//! - Lossless numeric handling via Decimal wrapper
//! - Domain primitives: TimeMs, Address, Coin, Side
//! - The five event kinds (ledger, TWAP, fill, funding, leverage) and the
//!   `Event` union over them
//! - Stable chronological ordering for deterministic replay

pub mod decimal;
pub mod event;
pub mod fill;
pub mod funding;
pub mod ledger;
pub mod leverage;
pub mod ordering;
pub mod primitives;
pub mod twap;

pub use decimal::Decimal;
pub use event::{Event, EventKind};
pub use fill::{Direction, Fill};
pub use funding::FundingPayment;
pub use ledger::{LedgerDelta, LedgerTransaction};
pub use leverage::LeverageUpdate;
pub use ordering::{is_chronological, sort_events_chronologically};
pub use primitives::{Address, Coin, Side, TimeMs};
pub use twap::{TwapExecution, TwapStatus};
