//! Bounded, ranked views of the causal graph.
//!
//! A frontier starts from a handful of roots (the newest inputs and
//! observes), walks their ancestors to a bounded depth, then attaches
//! one-hop children so that noise and observe events bound to the
//! skeleton stay visible. The kept set is ranked by trace score and
//! truncated.

use std::cmp::Ordering;
use std::collections::{HashSet, VecDeque};

use serde::Deserialize;
use spiral_ledger::{Ledger, trace_score};
use spiral_types::{Event, EventId, EventKind};
use tracing::debug;

/// Which seeds feed the ancestor closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrontierMode {
    /// Roots only.
    #[default]
    Global,
    /// Roots plus the last `recent_k` events in insertion order.
    Recent,
}

/// Frontier bounds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FrontierParams {
    /// Maximum number of input roots.
    #[serde(default = "default_last_inputs")]
    pub last_inputs: usize,

    /// Maximum number of observe roots.
    #[serde(default = "default_last_observes")]
    pub last_observes: usize,

    /// Maximum ancestor distance from a seed.
    #[serde(default = "default_anc_depth")]
    pub anc_depth: usize,

    /// Maximum number of events returned.
    #[serde(default = "default_topk")]
    pub topk: usize,

    /// Tail length seeded in [`FrontierMode::Recent`].
    #[serde(default = "default_recent_k")]
    pub recent_k: usize,
}

impl Default for FrontierParams {
    fn default() -> Self {
        Self {
            last_inputs: default_last_inputs(),
            last_observes: default_last_observes(),
            anc_depth: default_anc_depth(),
            topk: default_topk(),
            recent_k: default_recent_k(),
        }
    }
}

const fn default_last_inputs() -> usize {
    4
}

const fn default_last_observes() -> usize {
    2
}

const fn default_anc_depth() -> usize {
    6
}

const fn default_topk() -> usize {
    20
}

const fn default_recent_k() -> usize {
    12
}

/// Newest inputs and observes, each kind capped independently.
pub fn roots<'a>(ledger: &'a Ledger, params: &FrontierParams) -> Vec<&'a Event> {
    let mut inputs = Vec::new();
    let mut observes = Vec::new();
    for event in ledger.all().iter().rev() {
        if inputs.len() >= params.last_inputs && observes.len() >= params.last_observes {
            break;
        }
        match event.kind {
            EventKind::Input if inputs.len() < params.last_inputs => inputs.push(event),
            EventKind::Observe if observes.len() < params.last_observes => observes.push(event),
            _ => {}
        }
    }
    observes.reverse();
    inputs.reverse();
    observes.extend(inputs);
    observes
}

/// Ids reachable from `seeds` within `max_depth` parent hops.
///
/// Breadth-first, so every id is reached at its minimal depth. Seeds are
/// at depth 0. Ids that do not resolve in the ledger are skipped.
pub fn ancestor_closure(
    ledger: &Ledger,
    seeds: impl IntoIterator<Item = EventId>,
    max_depth: usize,
) -> HashSet<EventId> {
    let mut keep = HashSet::new();
    let mut queue: VecDeque<(EventId, usize)> = seeds.into_iter().map(|id| (id, 0)).collect();

    while let Some((id, depth)) = queue.pop_front() {
        if keep.contains(&id) {
            continue;
        }
        let Some(event) = ledger.get(&id) else {
            continue;
        };
        keep.insert(id);
        if depth < max_depth {
            let next = depth.saturating_add(1);
            queue.extend(
                event
                    .parent_ids
                    .iter()
                    .filter(|p| !keep.contains(*p))
                    .map(|p| (*p, next)),
            );
        }
    }
    keep
}

/// Sort by trace score descending, newer insertion first on ties.
pub(crate) fn rank<'a>(ledger: &Ledger, events: &mut [&'a Event], half_life: f64) {
    let mut scored: Vec<(f64, usize, &'a Event)> = events
        .iter()
        .map(|e| {
            (
                trace_score(e, ledger, half_life),
                ledger.position(&e.id).unwrap_or_default(),
                *e,
            )
        })
        .collect();
    scored.sort_by(|a, b| match b.0.total_cmp(&a.0) {
        Ordering::Equal => b.1.cmp(&a.1),
        other => other,
    });
    for (slot, (_, _, event)) in events.iter_mut().zip(scored) {
        *slot = event;
    }
}

/// Compute a frontier.
pub fn select<'a>(
    ledger: &'a Ledger,
    mode: FrontierMode,
    params: &FrontierParams,
    half_life: f64,
) -> Vec<&'a Event> {
    let roots = roots(ledger, params);
    if roots.is_empty() {
        return Vec::new();
    }

    let mut seeds: Vec<EventId> = roots.iter().map(|e| e.id).collect();
    if mode == FrontierMode::Recent {
        let all = ledger.all();
        let start = all.len().saturating_sub(params.recent_k);
        seeds.extend(all.iter().skip(start).map(|e| e.id));
    }

    let skeleton = ancestor_closure(ledger, seeds, params.anc_depth);

    // One-hop forward attach.
    let mut kept: Vec<&Event> = ledger
        .all()
        .iter()
        .filter(|e| skeleton.contains(&e.id) || e.parent_ids.iter().any(|p| skeleton.contains(p)))
        .collect();

    rank(ledger, &mut kept, half_life);
    kept.truncate(params.topk);
    debug!(
        ?mode,
        skeleton = skeleton.len(),
        returned = kept.len(),
        "frontier selected"
    );
    kept
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use spiral_ledger::DEFAULT_HALF_LIFE;
    use spiral_types::EventDraft;

    /// Chain of inputs, each parented on the previous event.
    fn chain(ledger: &mut Ledger, n: usize) -> Vec<EventId> {
        (0..n)
            .map(|i| {
                let parents = ledger.last().map(|e| e.id).into_iter().collect();
                ledger
                    .append(EventDraft::input(parents, "x", &format!("evt{i}")))
                    .map(|e| e.id)
                    .unwrap()
            })
            .collect()
    }

    fn ids(events: &[&Event]) -> Vec<EventId> {
        events.iter().map(|e| e.id).collect()
    }

    #[test]
    fn empty_ledger_has_no_frontier() {
        let ledger = Ledger::new();
        let params = FrontierParams::default();
        assert!(select(&ledger, FrontierMode::Global, &params, DEFAULT_HALF_LIFE).is_empty());
        assert!(select(&ledger, FrontierMode::Recent, &params, DEFAULT_HALF_LIFE).is_empty());
    }

    #[test]
    fn no_roots_means_empty_even_in_recent_mode() {
        let mut ledger = Ledger::new();
        let _ = ledger.append(EventDraft::conflict_noise(Vec::new(), "n")).unwrap();
        let params = FrontierParams::default();
        assert!(select(&ledger, FrontierMode::Recent, &params, DEFAULT_HALF_LIFE).is_empty());
    }

    #[test]
    fn roots_cap_each_kind_independently() {
        let mut ledger = Ledger::new();
        let inputs = chain(&mut ledger, 6);
        let o1 = ledger
            .append(EventDraft::conflict_observe(vec![inputs[0], inputs[1]], "o1"))
            .map(|e| e.id)
            .unwrap();
        let more = chain(&mut ledger, 5);

        let params = FrontierParams::default();
        let r = ids(&roots(&ledger, &params));
        assert_eq!(r, vec![o1, more[1], more[2], more[3], more[4]]);
    }

    #[test]
    fn closure_is_depth_bounded() {
        let mut ledger = Ledger::new();
        let c = chain(&mut ledger, 10);
        let keep = ancestor_closure(&ledger, [c[9]], 3);
        assert_eq!(keep.len(), 4);
        assert!(keep.contains(&c[6]));
        assert!(!keep.contains(&c[5]));
    }

    #[test]
    fn closure_skips_dangling_ids() {
        let mut ledger = Ledger::new();
        let ghost = EventId::from_fingerprint(b"ghost");
        let id = ledger
            .append(EventDraft::input(vec![ghost], "x", "orphan"))
            .map(|e| e.id)
            .unwrap();
        let keep = ancestor_closure(&ledger, [id, ghost], 6);
        assert_eq!(keep.len(), 1);
        assert!(keep.contains(&id));
    }

    #[test]
    fn closure_reaches_shared_ancestor_at_minimal_depth() {
        // c0 <- c1 <- c2 <- d, and d also points straight at c0.
        let mut ledger = Ledger::new();
        let c = chain(&mut ledger, 3);
        let d = ledger
            .append(EventDraft::input(vec![c[2], c[0]], "x", "d"))
            .map(|e| e.id)
            .unwrap();
        let keep = ancestor_closure(&ledger, [d], 1);
        assert!(keep.contains(&c[0]));
        assert!(keep.contains(&c[2]));
        assert!(!keep.contains(&c[1]));
    }

    #[test]
    fn noise_children_are_attached() {
        let mut ledger = Ledger::new();
        let c = chain(&mut ledger, 3);
        let noise = ledger
            .append(EventDraft::conflict_noise(vec![c[0], c[1]], "n"))
            .map(|e| e.id)
            .unwrap();
        let params = FrontierParams::default();
        let f = ids(&select(&ledger, FrontierMode::Global, &params, DEFAULT_HALF_LIFE));
        assert!(f.contains(&noise));
        assert_eq!(f.len(), 4);
    }

    #[test]
    fn ranked_newest_first_and_truncated() {
        let mut ledger = Ledger::new();
        let c = chain(&mut ledger, 8);
        let params = FrontierParams {
            topk: 3,
            ..FrontierParams::default()
        };
        let f = ids(&select(&ledger, FrontierMode::Global, &params, DEFAULT_HALF_LIFE));
        assert_eq!(f, vec![c[7], c[6], c[5]]);
    }

    #[test]
    fn equal_scores_break_by_insertion_order() {
        let mut ledger = Ledger::new();
        let c = chain(&mut ledger, 4);
        let mut events: Vec<&Event> = c.iter().filter_map(|id| ledger.get(id)).collect();
        // A huge half-life flattens scores to within float precision.
        rank(&ledger, &mut events, f64::MAX);
        assert_eq!(ids(&events), vec![c[3], c[2], c[1], c[0]]);
    }

    #[test]
    fn recent_mode_seeds_the_raw_tail() {
        let mut ledger = Ledger::new();
        let c = chain(&mut ledger, 4);
        // Unparented events are reachable only through the tail seed.
        let loose = ledger
            .append(EventDraft::conflict_noise(Vec::new(), "loose"))
            .map(|e| e.id)
            .unwrap();
        let params = FrontierParams {
            recent_k: 1,
            ..FrontierParams::default()
        };
        let global = ids(&select(&ledger, FrontierMode::Global, &params, DEFAULT_HALF_LIFE));
        let recent = ids(&select(&ledger, FrontierMode::Recent, &params, DEFAULT_HALF_LIFE));
        assert!(!global.contains(&loose));
        assert!(recent.contains(&loose));
        assert!(recent.contains(&c[3]));
    }
}
