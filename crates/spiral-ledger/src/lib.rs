//! Append-only causal event ledger for the Spiral engine.
//!
//! Every event ever produced -- external inputs, conflict diagnostics, and
//! synthetic noise -- is appended to a single [`Ledger`]. Nothing is ever
//! removed or edited. Parents may reference ids the ledger has never seen;
//! a dangling parent is a normal state, not an error.
//!
//! # Architecture
//!
//! - [`clock`] -- [`LedgerClock`]: a logical clock that clamps forward so
//!   ticks never move backwards.
//! - [`ledger`] -- The [`Ledger`] struct: append-only store with id lookup.
//! - [`trace`] -- [`trace_score`]: recency decay used for ranking.
//! - [`binding`] -- Audit of the conflict-pair binding invariant.
//!
//! # Binding Invariant
//!
//! Every conflict-heat `observe` event and every conflict `noise` event
//! must have exactly two distinct, resolvable `input` parents ordered
//! old to new. A conflict `noise` event must additionally carry exactly
//! the parents of the nearest earlier conflict-heat `observe` event.
//! Violations are reported as [`BindingViolation`] values; the audit
//! never panics.
//!
//! # Usage
//!
//! ```
//! use spiral_ledger::Ledger;
//! use spiral_types::EventDraft;
//!
//! let mut ledger = Ledger::new();
//! let first = ledger.append(EventDraft::input(Vec::new(), "x", "evt0")).map(|e| e.id).ok();
//! let parents = first.into_iter().collect();
//! ledger.append(EventDraft::input(parents, "y", "evt1")).ok();
//!
//! assert_eq!(ledger.len(), 2);
//! assert!(ledger.verify_bindings().is_empty());
//! ```

pub mod binding;
pub mod clock;
pub mod ledger;
pub mod trace;

// Re-export primary types at crate root.
pub use binding::{BindingViolation, PairRole};
pub use clock::{ClockError, LedgerClock, TimeSource};
pub use ledger::Ledger;
pub use trace::{DEFAULT_HALF_LIFE, trace_score};

use spiral_types::EventId;

/// Errors that can occur when appending to the ledger.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// An event with the same content-derived id is already stored.
    #[error("duplicate event id: {0}")]
    DuplicateId(EventId),

    /// The clock could not issue a new tick.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// The event fingerprint could not be encoded.
    #[error("failed to encode event fingerprint: {source}")]
    Fingerprint {
        /// The underlying serializer error.
        #[from]
        source: serde_json::Error,
    },

    /// An internal error that should not occur in normal operation.
    #[error("internal ledger error: {0}")]
    InternalError(&'static str),
}
