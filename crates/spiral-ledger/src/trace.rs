//! Recency decay used to rank events for presentation.
//!
//! The score is a pure function of an event's age relative to the newest
//! event in the ledger. It never gates a write path.

use std::f64::consts::LN_2;

use spiral_types::Event;

use crate::Ledger;

/// Default half-life, in ticks.
pub const DEFAULT_HALF_LIFE: f64 = 450.0;

/// Score an event's freshness in `(0, 1]`.
///
/// The score halves every `half_life` ticks of age, where age is the
/// newest timestamp in the ledger minus the event's timestamp (clamped at
/// zero). An empty ledger scores every event as `0.0`. Half-lives below
/// one tick are treated as one tick.
pub fn trace_score(event: &Event, ledger: &Ledger, half_life: f64) -> f64 {
    match ledger.latest_timestamp() {
        Some(newest) => decay(newest.saturating_sub(event.timestamp), half_life),
        None => 0.0,
    }
}

/// Exponential decay of an age in ticks, floored at the smallest positive
/// `f64` so that very old events still rank above "no score".
pub fn decay(age: u64, half_life: f64) -> f64 {
    let half_life = half_life.max(1.0);
    #[allow(clippy::cast_precision_loss)]
    let age = age as f64;
    (-(age / half_life) * LN_2).exp().max(f64::MIN_POSITIVE)
}
