//! The central ledger: an append-only store of all events.
//!
//! The [`Ledger`] holds every [`Event`] in insertion order plus an index
//! from [`EventId`] to position. Insertion order is the only total order;
//! timestamps are a coarser secondary order.
//!
//! # Design
//!
//! - **Append-only**: [`Ledger::append`] is the sole mutation point. No
//!   method removes or edits a stored event.
//! - **Unique ids**: an append whose derived id already exists is rejected
//!   and leaves the ledger unchanged.
//! - **Dangling parents are legal**: parents are stored as given and never
//!   resolved at append time.

use std::collections::HashMap;

use spiral_types::{Event, EventDraft, EventId, EventKind};
use tracing::trace;

use crate::binding::{BindingViolation, verify_bindings};
use crate::clock::LedgerClock;
use crate::LedgerError;

/// The append-only event store.
#[derive(Debug, Default)]
pub struct Ledger {
    /// All events, in insertion order.
    events: Vec<Event>,
    /// Position of each event in `events`.
    index: HashMap<EventId, usize>,
    /// Issues one tick per append.
    clock: LedgerClock,
}

impl Ledger {
    /// Create an empty ledger with a deterministic logical clock.
    pub fn new() -> Self {
        Self::with_clock(LedgerClock::logical())
    }

    /// Create an empty ledger driven by the given clock.
    pub fn with_clock(clock: LedgerClock) -> Self {
        Self {
            events: Vec::new(),
            index: HashMap::new(),
            clock,
        }
    }

    /// Return the number of events in the ledger.
    pub const fn len(&self) -> usize {
        self.events.len()
    }

    /// Return whether the ledger has no events.
    pub const fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Stamp a draft with the next tick, derive its id, and store it.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DuplicateId`] if the derived id is already
    /// stored, [`LedgerError::Clock`] if the clock cannot advance, or
    /// [`LedgerError::Fingerprint`] if the fingerprint cannot be encoded.
    /// On error the ledger and its clock are unchanged.
    pub fn append(&mut self, draft: EventDraft) -> Result<&Event, LedgerError> {
        let timestamp = self.clock.propose()?;
        let event = draft.stamp(timestamp)?;
        if self.index.contains_key(&event.id) {
            return Err(LedgerError::DuplicateId(event.id));
        }

        self.clock.commit(timestamp);
        let position = self.events.len();
        self.index.insert(event.id, position);
        trace!(
            id = %event.id.short(),
            kind = %event.kind,
            timestamp,
            parents = event.parent_ids.len(),
            "event appended"
        );
        self.events.push(event);

        // Return a reference to the event we just pushed.
        self.events.last().ok_or(LedgerError::InternalError(
            "failed to retrieve event after append",
        ))
    }

    /// Look up an event by id.
    pub fn get(&self, id: &EventId) -> Option<&Event> {
        self.index.get(id).and_then(|&pos| self.events.get(pos))
    }

    /// Whether an id resolves in this ledger.
    pub fn contains(&self, id: &EventId) -> bool {
        self.index.contains_key(id)
    }

    /// Insertion position of an event.
    pub fn position(&self, id: &EventId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// All events, in insertion order.
    pub fn all(&self) -> &[Event] {
        &self.events
    }

    /// The most recently appended event.
    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    /// Timestamp of the newest event.
    pub fn latest_timestamp(&self) -> Option<u64> {
        self.events.last().map(|e| e.timestamp)
    }

    /// Events of one kind, in insertion order.
    pub fn iter_kind(&self, kind: EventKind) -> impl DoubleEndedIterator<Item = &Event> {
        self.events.iter().filter(move |e| e.kind == kind)
    }

    /// Audit the conflict-pair binding invariant over the whole ledger.
    pub fn verify_bindings(&self) -> Vec<BindingViolation> {
        verify_bindings(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clock::TimeSource;

    /// Accept an input chained onto the current last event.
    fn input(ledger: &mut Ledger, topic: &str, label: &str) -> EventId {
        let parents = ledger.last().map(|e| e.id).into_iter().collect();
        ledger
            .append(EventDraft::input(parents, topic, label))
            .map(|e| e.id)
            .unwrap()
    }

    #[test]
    fn new_ledger_is_empty() {
        let ledger = Ledger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.len(), 0);
        assert!(ledger.last().is_none());
        assert!(ledger.latest_timestamp().is_none());
    }

    #[test]
    fn append_stores_and_indexes() {
        let mut ledger = Ledger::new();
        let a = input(&mut ledger, "x", "evt0");
        let b = input(&mut ledger, "y", "evt1");

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.position(&a), Some(0));
        assert_eq!(ledger.position(&b), Some(1));
        assert_eq!(ledger.get(&b).map(|e| e.parent_ids.clone()), Some(vec![a]));
        assert_eq!(ledger.last().map(|e| e.id), Some(b));
    }

    #[test]
    fn timestamps_strictly_increase() {
        let mut ledger = Ledger::new();
        for i in 0..5 {
            input(&mut ledger, "x", &format!("evt{i}"));
        }
        let ts: Vec<u64> = ledger.all().iter().map(|e| e.timestamp).collect();
        assert_eq!(ts, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn all_only_grows() {
        let mut ledger = Ledger::new();
        let mut seen: Vec<EventId> = Vec::new();
        for i in 0..8 {
            input(&mut ledger, if i % 2 == 0 { "x" } else { "y" }, &format!("evt{i}"));
            let now: Vec<EventId> = ledger.all().iter().map(|e| e.id).collect();
            assert!(now.len() > seen.len());
            assert!(now.starts_with(&seen));
            seen = now;
        }
    }

    #[test]
    fn identical_feeds_give_identical_ids() {
        let mut a = Ledger::new();
        let mut b = Ledger::new();
        for i in 0..6 {
            let topic = if i % 3 == 0 { "x" } else { "z" };
            input(&mut a, topic, &format!("evt{i}"));
            input(&mut b, topic, &format!("evt{i}"));
        }
        let ids_a: Vec<EventId> = a.all().iter().map(|e| e.id).collect();
        let ids_b: Vec<EventId> = b.all().iter().map(|e| e.id).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn dangling_parent_is_accepted() {
        let mut ledger = Ledger::new();
        let ghost = EventId::from_fingerprint(b"never appended");
        let result = ledger.append(EventDraft::input(vec![ghost], "x", "orphan"));
        assert!(result.is_ok());
        assert!(!ledger.contains(&ghost));
    }

    #[test]
    fn duplicate_id_is_rejected_without_side_effects() {
        let mut ledger = Ledger::new();
        let existing = ledger
            .append(EventDraft::input(Vec::new(), "x", "evt0"))
            .map(|e| e.id)
            .unwrap();

        // Rewind the clock so the same fingerprint is produced again.
        ledger.clock = LedgerClock::logical();
        let result = ledger.append(EventDraft::input(Vec::new(), "x", "evt0"));

        assert!(matches!(result, Err(LedgerError::DuplicateId(id)) if id == existing));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.clock.last(), 0);
    }

    #[test]
    fn iter_kind_filters() {
        let mut ledger = Ledger::new();
        input(&mut ledger, "x", "evt0");
        let _ = ledger.append(EventDraft::conflict_observe(Vec::new(), "obs"));
        input(&mut ledger, "y", "evt1");

        assert_eq!(ledger.iter_kind(EventKind::Input).count(), 2);
        assert_eq!(ledger.iter_kind(EventKind::Observe).count(), 1);
        assert_eq!(ledger.iter_kind(EventKind::Noise).count(), 0);
    }

    #[test]
    fn wall_clock_ledger_stays_ordered() {
        let clock = LedgerClock::new(TimeSource::WallClock, 1).unwrap_or_default();
        let mut ledger = Ledger::with_clock(clock);
        for i in 0..4 {
            input(&mut ledger, "x", &format!("evt{i}"));
        }
        let ts: Vec<u64> = ledger.all().iter().map(|e| e.timestamp).collect();
        assert!(ts.windows(2).all(|w| w.first() < w.get(1)));
    }
}
