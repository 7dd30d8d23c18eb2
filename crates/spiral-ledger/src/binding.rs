//! Conflict-pair binding audit.
//!
//! The observe gate and noise injector must attach their events to the
//! evidence that justified them. This module checks that they did:
//!
//! - Every conflict-heat `observe` event has exactly two parents, both
//!   resolvable, both `input` events, distinct, and ordered old to new by
//!   timestamp.
//! - Every conflict `noise` event satisfies the same shape clauses **and**
//!   carries, element for element, the parents of the nearest conflict-heat
//!   `observe` event with a strictly earlier timestamp.
//!
//! The audit is a separate pass run on demand over a completed or
//! in-progress ledger. It reports every violated clause it finds and never
//! panics. A `noise` event with no earlier conflict-heat `observe` event is
//! only shape-checked.

use spiral_types::{Event, EventId, EventKind};
use tracing::warn;

use crate::Ledger;

/// Which kind of bound event a shape violation was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairRole {
    /// A conflict-heat `observe` event.
    Observe,
    /// A conflict `noise` event.
    Noise,
}

impl core::fmt::Display for PairRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Observe => "OBS",
            Self::Noise => "NOISE",
        })
    }
}

/// A single violated clause of the binding invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingViolation {
    /// The event does not have exactly two parents.
    ParentCount {
        /// Role of the offending event.
        role: PairRole,
        /// The offending event.
        event: EventId,
        /// How many parents it has.
        count: usize,
    },

    /// A parent id does not resolve in the ledger.
    MissingParent {
        /// Role of the offending event.
        role: PairRole,
        /// The offending event.
        event: EventId,
        /// The dangling parent.
        parent: EventId,
    },

    /// A parent resolves but is not an `input` event.
    ParentNotInput {
        /// Role of the offending event.
        role: PairRole,
        /// The offending event.
        event: EventId,
        /// The non-input parent.
        parent: EventId,
        /// Its kind.
        kind: EventKind,
    },

    /// Both parents are the same event.
    DuplicateParents {
        /// Role of the offending event.
        role: PairRole,
        /// The offending event.
        event: EventId,
        /// The repeated parent.
        parent: EventId,
    },

    /// The first parent is newer than the second.
    OrderNotOldToNew {
        /// Role of the offending event.
        role: PairRole,
        /// The offending event.
        event: EventId,
        /// First parent, with the later timestamp.
        first: EventId,
        /// Second parent, with the earlier timestamp.
        second: EventId,
    },

    /// A noise event's parents differ from its justifying observe event.
    StrongBindMismatch {
        /// The offending noise event.
        noise: EventId,
        /// Its parents.
        noise_parents: Vec<EventId>,
        /// The nearest earlier conflict-heat observe event.
        observe: EventId,
        /// That event's parents.
        observe_parents: Vec<EventId>,
    },
}

/// Render a parent list as comma-separated short ids.
fn short_list(ids: &[EventId]) -> String {
    ids.iter().map(EventId::short).collect::<Vec<_>>().join(",")
}

impl core::fmt::Display for BindingViolation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ParentCount { role, event, count } => {
                write!(f, "{role} parents len != 2: id={} p={count}", event.short())
            }
            Self::MissingParent { role, event, parent } => write!(
                f,
                "{role} parent missing: id={} parent={}",
                event.short(),
                parent.short()
            ),
            Self::ParentNotInput {
                role,
                event,
                parent,
                kind,
            } => write!(
                f,
                "{role} parent not input: id={} parent={}({kind})",
                event.short(),
                parent.short()
            ),
            Self::DuplicateParents { role, event, parent } => write!(
                f,
                "{role} parents duplicated: id={} a=b={}",
                event.short(),
                parent.short()
            ),
            Self::OrderNotOldToNew {
                role,
                event,
                first,
                second,
            } => write!(
                f,
                "{role} parents order not old->new: id={} a={} b={}",
                event.short(),
                first.short(),
                second.short()
            ),
            Self::StrongBindMismatch {
                noise,
                noise_parents,
                observe,
                observe_parents,
            } => write!(
                f,
                "STRONG_BIND mismatch: noise={} parents=[{}] != prev_obs={} parents=[{}]",
                noise.short(),
                short_list(noise_parents),
                observe.short(),
                short_list(observe_parents)
            ),
        }
    }
}

/// Check the pair-shape clauses for one bound event.
fn check_pair(ledger: &Ledger, event: &Event, role: PairRole, out: &mut Vec<BindingViolation>) {
    let parents = &event.parent_ids;
    if parents.len() != 2 {
        out.push(BindingViolation::ParentCount {
            role,
            event: event.id,
            count: parents.len(),
        });
    }

    for parent in parents {
        match ledger.get(parent) {
            None => out.push(BindingViolation::MissingParent {
                role,
                event: event.id,
                parent: *parent,
            }),
            Some(p) if !p.is_input() => out.push(BindingViolation::ParentNotInput {
                role,
                event: event.id,
                parent: *parent,
                kind: p.kind,
            }),
            Some(_) => {}
        }
    }

    let (Some(a), Some(b), 2) = (parents.first(), parents.get(1), parents.len()) else {
        return;
    };
    if a == b {
        out.push(BindingViolation::DuplicateParents {
            role,
            event: event.id,
            parent: *a,
        });
        return;
    }
    if let (Some(ea), Some(eb)) = (ledger.get(a), ledger.get(b)) {
        if ea.timestamp > eb.timestamp {
            out.push(BindingViolation::OrderNotOldToNew {
                role,
                event: event.id,
                first: *a,
                second: *b,
            });
        }
    }
}

/// The conflict-heat observe event nearest before `timestamp`.
fn preceding_observe(ledger: &Ledger, timestamp: u64) -> Option<&Event> {
    ledger
        .all()
        .iter()
        .rev()
        .filter(|e| e.timestamp < timestamp)
        .find(|e| e.is_conflict_observe())
}

/// Audit the binding invariant over every event in the ledger.
///
/// Returns every violated clause, observe events first, then noise events,
/// each in insertion order. An empty result means the ledger is currently
/// consistent.
pub fn verify_bindings(ledger: &Ledger) -> Vec<BindingViolation> {
    let mut violations = Vec::new();

    for event in ledger.all().iter().filter(|e| e.is_conflict_observe()) {
        check_pair(ledger, event, PairRole::Observe, &mut violations);
    }

    for event in ledger.all().iter().filter(|e| e.is_conflict_noise()) {
        check_pair(ledger, event, PairRole::Noise, &mut violations);

        if let Some(observe) = preceding_observe(ledger, event.timestamp) {
            if observe.parent_ids != event.parent_ids {
                violations.push(BindingViolation::StrongBindMismatch {
                    noise: event.id,
                    noise_parents: event.parent_ids.clone(),
                    observe: observe.id,
                    observe_parents: observe.parent_ids.clone(),
                });
            }
        }
    }

    if !violations.is_empty() {
        warn!(count = violations.len(), "binding invariant violated");
    }
    violations
}
