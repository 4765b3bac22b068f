//! Stable event ordering for deterministic replay.

use crate::domain::Event;

/// Sort events chronologically.
///
/// The sort is stable: events sharing a millisecond keep their input order,
/// since the upstream APIs do not expose intra-millisecond sequencing.
pub fn sort_events_chronologically(events: &mut [Event]) {
    events.sort_by_key(|event| event.time());
}

/// Returns true if `events` is already in non-decreasing time order.
pub fn is_chronological(events: &[Event]) -> bool {
    events.windows(2).all(|w| w[0].time() <= w[1].time())
}
