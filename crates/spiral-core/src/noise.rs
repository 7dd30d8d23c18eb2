//! Conflict-driven synthetic events with strong binding.
//!
//! On sustained conflict (heat at or above the threshold) and once the
//! cooldown has elapsed, the injector appends a `noise` event. Its parents
//! are exactly the parents of the most recent `observe` event, cached when
//! that diagnostic was emitted. Only when no diagnostic has ever fired does
//! it fall back to the freshly computed evidentiary pair.

use sha2::{Digest, Sha256};
use spiral_types::{EventDraft, EventId, tags};

use crate::config::NoiseConfig;
use crate::heat::ConflictAnalysis;

/// Injector state owned by the driver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoiseState {
    /// Timestamp of the last noise emission.
    pub last_emission: Option<u64>,
    /// Parents of the most recent `observe` event.
    pub cached_pair: Option<Vec<EventId>>,
}

impl NoiseState {
    /// Cache the parents of a newly emitted `observe` event.
    #[must_use]
    pub fn bind(&self, observe_parents: &[EventId]) -> Self {
        Self {
            last_emission: self.last_emission,
            cached_pair: Some(observe_parents.to_vec()),
        }
    }

    /// Record a noise emission at `timestamp`.
    #[must_use]
    pub fn emitted_at(&self, timestamp: u64) -> Self {
        Self {
            last_emission: Some(timestamp),
            cached_pair: self.cached_pair.clone(),
        }
    }

    /// Whether at least `cooldown` ticks separate `now` from the last emission.
    pub fn cooled_down(&self, now: u64, cooldown: u64) -> bool {
        self.last_emission
            .is_none_or(|last| now.saturating_sub(last) >= cooldown)
    }
}

/// Result of one injector evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoiseOutcome {
    /// The synthetic event to append, if the injector fired.
    pub emit: Option<EventDraft>,
}

/// First 16 hex chars of a SHA-256 over the report and parents.
pub fn hash_fragment(report: &str, parents: &[EventId]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(report.as_bytes());
    for parent in parents {
        hasher.update(b"|");
        hasher.update(parent.0.as_bytes());
    }
    let digest = hex::encode(hasher.finalize());
    digest.chars().take(16).collect()
}

/// Payload of a conflict noise event.
pub fn noise_payload(analysis: &ConflictAnalysis, parents: &[EventId], threshold: usize) -> String {
    let topic = analysis
        .latest_topic
        .as_deref()
        .unwrap_or(tags::UNKNOWN_TOPIC);
    format!(
        "NOISE:{}:conflict({threshold}):top={}; topic={topic}",
        hash_fragment(&analysis.report(), parents),
        analysis.top_tuple(),
    )
}

/// Decide whether sustained conflict warrants a synthetic event.
///
/// `now` is the newest timestamp in the ledger.
pub fn evaluate(
    state: &NoiseState,
    analysis: &ConflictAnalysis,
    now: u64,
    config: &NoiseConfig,
) -> NoiseOutcome {
    if analysis.total_heat < config.threshold || !state.cooled_down(now, config.cooldown) {
        return NoiseOutcome { emit: None };
    }

    let parents = state
        .cached_pair
        .clone()
        .unwrap_or_else(|| analysis.pair.clone());
    let payload = noise_payload(analysis, &parents, config.threshold);
    NoiseOutcome {
        emit: Some(EventDraft::conflict_noise(parents, payload)),
    }
}
