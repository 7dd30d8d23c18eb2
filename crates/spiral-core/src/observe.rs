//! Debounced conflict-heat diagnostics.
//!
//! The observe gate turns the per-input [`ConflictAnalysis`] stream into
//! one `observe` event per distinct conflict state. It emits iff:
//!
//! 1. heat is non-zero,
//! 2. at least `cooldown` inputs were accepted since the last emission, and
//! 3. the signature differs from the last emitted one.
//!
//! Cold windows clear the stored signature, so the next warm window is
//! always treated as a change.
//!
//! [`evaluate`] is pure: it maps the prior [`ObserveState`] and the current
//! analysis to the next state plus an optional draft. The session owns the
//! state and applies the outcome.

use spiral_types::EventDraft;

use crate::heat::ConflictAnalysis;

/// Debounce state owned by the driver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObserveState {
    /// Signature of the last emission, cleared when heat drops to zero.
    pub last_signature: Option<String>,
    /// Inputs accepted since the last emission; `None` before the first.
    pub steps_since_emission: Option<u64>,
}

impl ObserveState {
    /// Count one accepted input.
    #[must_use]
    pub fn on_input(&self) -> Self {
        Self {
            last_signature: self.last_signature.clone(),
            steps_since_emission: self.steps_since_emission.map(|s| s.saturating_add(1)),
        }
    }

    /// Whether the cooldown has elapsed.
    pub fn cooled_down(&self, cooldown: u64) -> bool {
        self.steps_since_emission.is_none_or(|s| s >= cooldown)
    }
}

/// Result of one gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserveOutcome {
    /// State to carry into the next evaluation.
    pub next: ObserveState,
    /// The diagnostic to append, if the gate fired.
    pub emit: Option<EventDraft>,
}

/// Payload of a conflict-heat diagnostic.
pub fn observe_payload(analysis: &ConflictAnalysis) -> String {
    format!("observe=conflict_heat; {}", analysis.report())
}

/// Decide whether the current analysis warrants a diagnostic.
pub fn evaluate(state: &ObserveState, analysis: &ConflictAnalysis, cooldown: u64) -> ObserveOutcome {
    if analysis.total_heat == 0 {
        return ObserveOutcome {
            next: ObserveState {
                last_signature: None,
                steps_since_emission: state.steps_since_emission,
            },
            emit: None,
        };
    }

    let signature = analysis.signature();
    if !state.cooled_down(cooldown) || state.last_signature.as_deref() == Some(signature.as_str()) {
        return ObserveOutcome {
            next: state.clone(),
            emit: None,
        };
    }

    ObserveOutcome {
        next: ObserveState {
            last_signature: Some(signature),
            steps_since_emission: Some(0),
        },
        emit: Some(EventDraft::conflict_observe(
            analysis.pair.clone(),
            observe_payload(analysis),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heat::TopicReport;
    use spiral_types::{EventId, EventKind};

    fn analysis(heat: usize, dominant: &str, count: usize) -> ConflictAnalysis {
        ConflictAnalysis {
            window: 14,
            total_heat: heat,
            top: TopicReport {
                key: "topic".to_owned(),
                heat,
                dominant: dominant.to_owned(),
                count,
            },
            pair: vec![
                EventId::from_fingerprint(b"a"),
                EventId::from_fingerprint(b"b"),
            ],
            latest_topic: Some(dominant.to_owned()),
        }
    }

    #[test]
    fn cold_window_never_emits() {
        let out = evaluate(&ObserveState::default(), &analysis(0, "x", 3), 0);
        assert!(out.emit.is_none());
        assert!(out.next.last_signature.is_none());
    }

    #[test]
    fn first_warm_window_emits_with_pair_parents() {
        let a = analysis(1, "x", 2);
        let out = evaluate(&ObserveState::default(), &a, 0);
        let draft = out.emit;
        assert_eq!(draft.as_ref().map(|d| d.kind), Some(EventKind::Observe));
        assert_eq!(draft.as_ref().map(|d| d.parent_ids.clone()), Some(a.pair.clone()));
        assert_eq!(
            draft.map(|d| d.payload),
            Some("observe=conflict_heat; win=14; total_heat=1; top=topic:1:x:2".to_owned())
        );
        assert_eq!(out.next.last_signature, Some(a.signature()));
        assert_eq!(out.next.steps_since_emission, Some(0));
    }

    #[test]
    fn same_signature_is_debounced() {
        let first = evaluate(&ObserveState::default(), &analysis(2, "x", 3), 0);
        let state = first.next.on_input();
        // Count churn alone does not change the signature.
        let second = evaluate(&state, &analysis(2, "x", 4), 0);
        assert!(second.emit.is_none());
    }

    #[test]
    fn changed_signature_emits_again() {
        let first = evaluate(&ObserveState::default(), &analysis(2, "x", 3), 0);
        let second = evaluate(&first.next.on_input(), &analysis(3, "x", 3), 0);
        assert!(second.emit.is_some());
    }

    #[test]
    fn cooldown_holds_back_changes() {
        let first = evaluate(&ObserveState::default(), &analysis(1, "x", 2), 2);
        let one = first.next.on_input();
        let blocked = evaluate(&one, &analysis(2, "x", 2), 2);
        assert!(blocked.emit.is_none());
        assert_eq!(blocked.next, one);

        let two = blocked.next.on_input();
        let released = evaluate(&two, &analysis(2, "x", 2), 2);
        assert!(released.emit.is_some());
    }

    #[test]
    fn cooling_to_zero_rearms_same_signature() {
        let a = analysis(1, "x", 2);
        let first = evaluate(&ObserveState::default(), &a, 0);
        let cold = evaluate(&first.next.on_input(), &analysis(0, "x", 2), 0);
        assert!(cold.next.last_signature.is_none());
        let again = evaluate(&cold.next.on_input(), &a, 0);
        assert!(again.emit.is_some());
    }

    #[test]
    fn on_input_counts_only_after_first_emission() {
        let fresh = ObserveState::default().on_input();
        assert_eq!(fresh.steps_since_emission, None);
        assert!(fresh.cooled_down(u64::MAX));
    }
}
