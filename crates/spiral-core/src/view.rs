//! Read-only filter views.
//!
//! A view selects from history; it can never edit it.

use std::collections::HashMap;

use spiral_ledger::Ledger;
use spiral_types::{Event, EventId, EventKind};

use crate::frontier::rank;

/// Chain depth accepted by [`View::TraceableOnly`] unless configured.
pub const DEFAULT_TRACE_DEPTH: usize = 6;

/// A read-only filter over the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// The last `n` events, newest first.
    Last(usize),
    /// Every `observe` event, ranked by trace score.
    ObserveOnly,
    /// Non-noise events whose ancestry fully resolves within `max_depth`
    /// events, in insertion order.
    TraceableOnly {
        /// Longest accepted ancestor chain, counting the event itself.
        max_depth: usize,
    },
}

impl View {
    /// Apply the view.
    pub fn select<'a>(&self, ledger: &'a Ledger, half_life: f64) -> Vec<&'a Event> {
        match *self {
            Self::Last(n) => ledger.all().iter().rev().take(n).collect(),
            Self::ObserveOnly => {
                let mut observes: Vec<&Event> = ledger.iter_kind(EventKind::Observe).collect();
                rank(ledger, &mut observes, half_life);
                observes
            }
            Self::TraceableOnly { max_depth } => {
                let depths = chain_depths(ledger);
                ledger
                    .all()
                    .iter()
                    .filter(|e| e.kind != EventKind::Noise)
                    .filter(|e| {
                        depths
                            .get(&e.id)
                            .copied()
                            .flatten()
                            .is_some_and(|d| d <= max_depth)
                    })
                    .collect()
            }
        }
    }
}

/// Longest ancestor chain per event, counting the event itself.
///
/// `None` marks an event with a dangling parent anywhere in its ancestry.
/// Parents always precede their children in insertion order, so a single
/// forward pass fills the table.
pub fn chain_depths(ledger: &Ledger) -> HashMap<EventId, Option<usize>> {
    let mut depths: HashMap<EventId, Option<usize>> = HashMap::with_capacity(ledger.len());
    for event in ledger.all() {
        let mut deepest = Some(0_usize);
        for parent in &event.parent_ids {
            let parent_depth = depths.get(parent).copied().flatten();
            deepest = deepest.zip(parent_depth).map(|(a, b)| a.max(b));
        }
        depths.insert(event.id, deepest.and_then(|d| d.checked_add(1)));
    }
    depths
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use spiral_ledger::DEFAULT_HALF_LIFE;
    use spiral_types::EventDraft;

    fn append(ledger: &mut Ledger, draft: EventDraft) -> EventId {
        ledger.append(draft).map(|e| e.id).unwrap()
    }

    fn chain(ledger: &mut Ledger, n: usize) -> Vec<EventId> {
        (0..n)
            .map(|i| {
                let parents = ledger.last().map(|e| e.id).into_iter().collect();
                append(ledger, EventDraft::input(parents, "x", &format!("evt{i}")))
            })
            .collect()
    }

    fn ids(events: &[&Event]) -> Vec<EventId> {
        events.iter().map(|e| e.id).collect()
    }

    #[test]
    fn last_is_newest_first() {
        let mut ledger = Ledger::new();
        let c = chain(&mut ledger, 5);
        let v = ids(&View::Last(3).select(&ledger, DEFAULT_HALF_LIFE));
        assert_eq!(v, vec![c[4], c[3], c[2]]);
        assert_eq!(View::Last(50).select(&ledger, DEFAULT_HALF_LIFE).len(), 5);
    }

    #[test]
    fn observe_only_ranks_newest_first() {
        let mut ledger = Ledger::new();
        let c = chain(&mut ledger, 2);
        let o1 = append(&mut ledger, EventDraft::conflict_observe(c.clone(), "o1"));
        let _ = chain(&mut ledger, 1);
        let o2 = append(&mut ledger, EventDraft::conflict_observe(c, "o2"));
        let v = ids(&View::ObserveOnly.select(&ledger, DEFAULT_HALF_LIFE));
        assert_eq!(v, vec![o2, o1]);
    }

    #[test]
    fn chain_depth_counts_nodes() {
        let mut ledger = Ledger::new();
        let c = chain(&mut ledger, 4);
        let depths = chain_depths(&ledger);
        assert_eq!(depths[&c[0]], Some(1));
        assert_eq!(depths[&c[3]], Some(4));
    }

    #[test]
    fn dangling_ancestry_is_untraceable() {
        let mut ledger = Ledger::new();
        let ghost = EventId::from_fingerprint(b"ghost");
        let orphan = append(&mut ledger, EventDraft::input(vec![ghost], "x", "orphan"));
        let child = append(&mut ledger, EventDraft::input(vec![orphan], "x", "child"));
        let depths = chain_depths(&ledger);
        assert_eq!(depths[&orphan], None);
        assert_eq!(depths[&child], None);
        let v = View::TraceableOnly { max_depth: 100 }.select(&ledger, DEFAULT_HALF_LIFE);
        assert!(v.is_empty());
    }

    #[test]
    fn traceable_only_bounds_depth_and_hides_noise() {
        let mut ledger = Ledger::new();
        let c = chain(&mut ledger, 8);
        let _ = append(&mut ledger, EventDraft::conflict_noise(vec![c[0], c[1]], "n"));
        let v = ids(
            &View::TraceableOnly {
                max_depth: DEFAULT_TRACE_DEPTH,
            }
            .select(&ledger, DEFAULT_HALF_LIFE),
        );
        assert_eq!(v, c[..6].to_vec());
    }

    #[test]
    fn longest_parent_chain_wins() {
        let mut ledger = Ledger::new();
        let c = chain(&mut ledger, 3);
        let fresh = append(&mut ledger, EventDraft::input(Vec::new(), "y", "fresh"));
        let joined = append(&mut ledger, EventDraft::input(vec![fresh, c[2]], "x", "join"));
        assert_eq!(chain_depths(&ledger)[&joined], Some(4));
    }
}
