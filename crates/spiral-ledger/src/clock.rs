//! Ledger-scoped logical clock.
//!
//! Each append consumes one tick. A tick is `max(last + step, observed)`,
//! where `observed` comes from the configured [`TimeSource`]. With the
//! logical source the clock is a pure counter; with the wall clock it
//! follows real time but never moves backwards under jitter.

use chrono::Utc;
use serde::Deserialize;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// The clock step must be at least one tick.
    #[error("invalid clock step: must be at least 1")]
    InvalidStep,
}

/// Where the clock reads "current time" from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSource {
    /// Always reads zero, so ticks are a pure counter. Deterministic.
    #[default]
    Logical,
    /// Milliseconds since the Unix epoch.
    WallClock,
}

impl TimeSource {
    /// Read the source. A pre-epoch wall clock reads as zero.
    pub fn observe(self) -> u64 {
        match self {
            Self::Logical => 0,
            Self::WallClock => u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0),
        }
    }
}

/// A forward-clamping logical clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerClock {
    /// The last issued tick (or the starting reading before any tick).
    last: u64,
    /// Minimum advance per tick.
    step: u64,
    /// Source of observed time.
    source: TimeSource,
}

impl Default for LedgerClock {
    fn default() -> Self {
        Self::logical()
    }
}

impl LedgerClock {
    /// A deterministic counter starting at zero with step one.
    pub const fn logical() -> Self {
        Self {
            last: 0,
            step: 1,
            source: TimeSource::Logical,
        }
    }

    /// Create a clock from a source and step.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidStep`] if `step` is zero.
    pub fn new(source: TimeSource, step: u64) -> Result<Self, ClockError> {
        if step == 0 {
            return Err(ClockError::InvalidStep);
        }
        Ok(Self {
            last: source.observe(),
            step,
            source,
        })
    }

    /// The last issued tick.
    pub const fn last(&self) -> u64 {
        self.last
    }

    /// Compute the next tick for an observed reading without committing it.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if `last + step` overflows.
    pub fn propose_at(&self, observed: u64) -> Result<u64, ClockError> {
        let floor = self
            .last
            .checked_add(self.step)
            .ok_or(ClockError::TickOverflow)?;
        Ok(floor.max(observed))
    }

    /// Compute the next tick from the configured source without committing it.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the counter would overflow.
    pub fn propose(&self) -> Result<u64, ClockError> {
        self.propose_at(self.source.observe())
    }

    /// Record a proposed tick as issued. Earlier values are ignored.
    pub fn commit(&mut self, tick: u64) {
        self.last = self.last.max(tick);
    }

    /// Issue the next tick from the configured source.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the counter would overflow.
    pub fn tick(&mut self) -> Result<u64, ClockError> {
        let next = self.propose()?;
        self.commit(next);
        Ok(next)
    }
}
