//! Conflict-heat analysis over a sliding window of input events.
//!
//! Heat counts topic *transitions* in the last `window` inputs: the number
//! of adjacent positions whose topics differ. A window that keeps changing
//! topic is hot; a window that sits on one topic (or holds a single input)
//! is cold, however many distinct topics it has seen overall.
//!
//! The analysis also names the dominant topic and offers an evidentiary
//! pair of input ids: the two most recent inputs on the dominant topic,
//! padded from the newest unused inputs when fewer than two exist, and
//! finally ordered old to new.

use std::collections::BTreeMap;

use spiral_ledger::Ledger;
use spiral_types::{Event, EventId, EventKind, tags};

/// Key reported for topic-based conflict.
pub const TOPIC_KEY: &str = "topic";

/// The `(key, heat, dominant, count)` tuple describing the top conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicReport {
    /// What is being compared (always [`TOPIC_KEY`] today).
    pub key: String,
    /// Transition count attributed to this key.
    pub heat: usize,
    /// Most frequent topic in the window.
    pub dominant: String,
    /// Occurrences of the dominant topic in the window.
    pub count: usize,
}

/// Result of one conflict-heat pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictAnalysis {
    /// Configured window size.
    pub window: usize,
    /// Transitions across the whole window.
    pub total_heat: usize,
    /// The top conflict tuple.
    pub top: TopicReport,
    /// Up to two input ids, old to new.
    pub pair: Vec<EventId>,
    /// Topic of the newest input in the window.
    pub latest_topic: Option<String>,
}

impl ConflictAnalysis {
    /// Debounce key. Omits the dominant topic's count so that count churn
    /// alone never looks like a new conflict state.
    pub fn signature(&self) -> String {
        format!(
            "win={};total_heat={};top={}:{}:{}",
            self.window, self.total_heat, self.top.key, self.top.heat, self.top.dominant
        )
    }

    /// The `key:heat:dominant:count` tuple as reported in payloads.
    pub fn top_tuple(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.top.key, self.top.heat, self.top.dominant, self.top.count
        )
    }

    /// Human-readable report, including the dominant count.
    pub fn report(&self) -> String {
        format!(
            "win={}; total_heat={}; top={}",
            self.window,
            self.total_heat,
            self.top_tuple()
        )
    }
}

/// Topic of an input, or the unknown marker.
fn topic_of(event: &Event) -> String {
    event
        .topic()
        .unwrap_or_else(|| tags::UNKNOWN_TOPIC.to_owned())
}

/// Most frequent topic; ties go to the lexicographically smallest.
fn dominant(topics: &[String]) -> (String, usize) {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for topic in topics {
        let c = counts.entry(topic.as_str()).or_insert(0);
        *c = c.saturating_add(1);
    }

    let mut best: Option<(&str, usize)> = None;
    for (topic, count) in counts {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((topic, count));
        }
    }
    best.map_or_else(
        || (tags::UNKNOWN_TOPIC.to_owned(), 0),
        |(topic, count)| (topic.to_owned(), count),
    )
}

/// Analyze the last `window` input events of the ledger.
pub fn analyze(ledger: &Ledger, window: usize) -> ConflictAnalysis {
    let mut tail: Vec<&Event> = ledger.iter_kind(EventKind::Input).rev().take(window).collect();
    tail.reverse();

    let topics: Vec<String> = tail.iter().map(|e| topic_of(e)).collect();
    let total_heat = topics
        .windows(2)
        .filter(|w| matches!(w, [a, b] if a != b))
        .count();
    let (dom, count) = dominant(&topics);

    // Two most recent inputs on the dominant topic, newest first.
    let mut picked: Vec<&Event> = tail
        .iter()
        .zip(&topics)
        .rev()
        .filter(|(_, t)| **t == dom)
        .map(|(e, _)| *e)
        .take(2)
        .collect();

    // Pad from the newest inputs not already picked.
    for event in tail.iter().rev() {
        if picked.len() >= 2 {
            break;
        }
        if !picked.iter().any(|p| p.id == event.id) {
            picked.push(*event);
        }
    }

    picked.sort_by_key(|e| (e.timestamp, ledger.position(&e.id)));

    ConflictAnalysis {
        window,
        total_heat,
        top: TopicReport {
            key: TOPIC_KEY.to_owned(),
            heat: total_heat,
            dominant: dom,
            count,
        },
        pair: picked.iter().map(|e| e.id).collect(),
        latest_topic: topics.last().cloned(),
    }
}
