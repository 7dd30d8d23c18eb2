//! The immutable event record and its unstamped draft.
//!
//! Events are created exactly once, by the ledger, from an [`EventDraft`].
//! The ledger assigns the timestamp and derives the [`EventId`] from the
//! fingerprint `{parent_ids, ts, payload, kind, meta}`. After that the
//! event is only ever handed out by shared reference.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::EventId;
use crate::payload::parse_kv;

/// Well-known metadata keys and tag values.
pub mod tags {
    /// Metadata key holding an input event's topic.
    pub const TOPIC: &str = "topic";
    /// Metadata key holding a diagnostic event's observe tag.
    pub const OBSERVE: &str = "observe";
    /// Metadata key holding a synthetic event's noise tag.
    pub const NOISE_KIND: &str = "noise_kind";
    /// Observe tag for conflict-heat diagnostics.
    pub const CONFLICT_HEAT: &str = "conflict_heat";
    /// Noise tag for conflict-driven synthetic events.
    pub const CONFLICT: &str = "conflict";
    /// Topic reported when an input carries none.
    pub const UNKNOWN_TOPIC: &str = "?";
}

/// The category of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Supplied by an external caller through `accept`.
    Input,
    /// A debounced diagnostic emitted by the observe gate.
    Observe,
    /// A synthetic event emitted by the noise injector.
    Noise,
}

impl EventKind {
    /// Lowercase name, matching the serialized form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Observe => "observe",
            Self::Noise => "noise",
        }
    }
}

impl core::fmt::Display for EventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node in the causal graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Content-derived identifier.
    pub id: EventId,
    /// Ledger-scoped logical tick. Never decreases in append order.
    pub timestamp: u64,
    /// Ordered parent references. A parent may be dangling.
    pub parent_ids: Vec<EventId>,
    /// Opaque payload.
    pub payload: String,
    /// The category of event.
    pub kind: EventKind,
    /// Kind-specific tags (`topic`, `observe`, `noise_kind`, ...).
    pub meta: BTreeMap<String, String>,
}

impl Event {
    /// Look up a metadata tag.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }

    /// The event's topic: the `topic` tag if present, otherwise the
    /// `topic=` pair of the payload.
    pub fn topic(&self) -> Option<String> {
        self.tag(tags::TOPIC)
            .map(str::to_owned)
            .or_else(|| parse_kv(&self.payload).remove(tags::TOPIC))
    }

    /// Whether this is an input event.
    pub fn is_input(&self) -> bool {
        self.kind == EventKind::Input
    }

    /// Whether this is a conflict-heat diagnostic.
    pub fn is_conflict_observe(&self) -> bool {
        self.kind == EventKind::Observe && self.tag(tags::OBSERVE) == Some(tags::CONFLICT_HEAT)
    }

    /// Whether this is conflict-driven noise.
    pub fn is_conflict_noise(&self) -> bool {
        self.kind == EventKind::Noise && self.tag(tags::NOISE_KIND) == Some(tags::CONFLICT)
    }
}

/// An event before the ledger has stamped it with a timestamp and id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    /// Ordered parent references.
    pub parent_ids: Vec<EventId>,
    /// Opaque payload.
    pub payload: String,
    /// The category of event.
    pub kind: EventKind,
    /// Kind-specific tags.
    pub meta: BTreeMap<String, String>,
}

/// Serialized shape hashed into an [`EventId`].
#[derive(Serialize)]
struct Fingerprint<'a> {
    parent_ids: &'a [EventId],
    ts: u64,
    payload: &'a str,
    kind: EventKind,
    meta: &'a BTreeMap<String, String>,
}

impl EventDraft {
    /// Create a draft with no metadata.
    pub fn new(kind: EventKind, parent_ids: Vec<EventId>, payload: impl Into<String>) -> Self {
        Self {
            parent_ids,
            payload: payload.into(),
            kind,
            meta: BTreeMap::new(),
        }
    }

    /// Attach a metadata tag.
    #[must_use]
    pub fn with_tag(mut self, key: &str, value: impl Into<String>) -> Self {
        self.meta.insert(key.to_owned(), value.into());
        self
    }

    /// An external input. The payload is `"{label}; topic={topic}"`.
    pub fn input(parent_ids: Vec<EventId>, topic: &str, label: &str) -> Self {
        Self::new(EventKind::Input, parent_ids, format!("{label}; topic={topic}"))
            .with_tag(tags::TOPIC, topic)
    }

    /// A conflict-heat diagnostic.
    pub fn conflict_observe(parent_ids: Vec<EventId>, payload: impl Into<String>) -> Self {
        Self::new(EventKind::Observe, parent_ids, payload).with_tag(tags::OBSERVE, tags::CONFLICT_HEAT)
    }

    /// A conflict-driven synthetic event.
    pub fn conflict_noise(parent_ids: Vec<EventId>, payload: impl Into<String>) -> Self {
        Self::new(EventKind::Noise, parent_ids, payload).with_tag(tags::NOISE_KIND, tags::CONFLICT)
    }

    /// Canonical fingerprint bytes for the given timestamp.
    ///
    /// Metadata is a `BTreeMap`, so key order is stable and the encoding
    /// is deterministic.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if encoding fails.
    pub fn fingerprint(&self, timestamp: u64) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&Fingerprint {
            parent_ids: &self.parent_ids,
            ts: timestamp,
            payload: &self.payload,
            kind: self.kind,
            meta: &self.meta,
        })
    }

    /// Stamp the draft, deriving its id from the fingerprint.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if the fingerprint cannot be encoded.
    pub fn stamp(self, timestamp: u64) -> Result<Event, serde_json::Error> {
        let id = EventId::from_fingerprint(&self.fingerprint(timestamp)?);
        Ok(Event {
            id,
            timestamp,
            parent_ids: self.parent_ids,
            payload: self.payload,
            kind: self.kind,
            meta: self.meta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamping_is_deterministic() {
        let a = EventDraft::input(Vec::new(), "x", "evt0").stamp(5).ok();
        let b = EventDraft::input(Vec::new(), "x", "evt0").stamp(5).ok();
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[test]
    fn timestamp_changes_id() {
        let a = EventDraft::input(Vec::new(), "x", "evt0").stamp(5).ok();
        let b = EventDraft::input(Vec::new(), "x", "evt0").stamp(6).ok();
        assert_ne!(a.map(|e| e.id), b.map(|e| e.id));
    }

    #[test]
    fn metadata_changes_id() {
        let plain = EventDraft::new(EventKind::Input, Vec::new(), "p").stamp(1).ok();
        let tagged = EventDraft::new(EventKind::Input, Vec::new(), "p")
            .with_tag(tags::TOPIC, "x")
            .stamp(1)
            .ok();
        assert_ne!(plain.map(|e| e.id), tagged.map(|e| e.id));
    }

    #[test]
    fn topic_prefers_tag_then_payload() {
        let tagged = EventDraft::input(Vec::new(), "x", "evt0").stamp(1).ok();
        assert_eq!(tagged.and_then(|e| e.topic()).as_deref(), Some("x"));

        let untagged = EventDraft::new(EventKind::Input, Vec::new(), "repair; topic=z")
            .stamp(2)
            .ok();
        assert_eq!(untagged.and_then(|e| e.topic()).as_deref(), Some("z"));

        let bare = EventDraft::new(EventKind::Input, Vec::new(), "opaque").stamp(3).ok();
        assert_eq!(bare.and_then(|e| e.topic()), None);
    }

    #[test]
    fn conflict_tags_are_recognised() {
        let obs = EventDraft::conflict_observe(Vec::new(), "o").stamp(1).ok();
        let noise = EventDraft::conflict_noise(Vec::new(), "n").stamp(2).ok();
        assert!(obs.as_ref().is_some_and(Event::is_conflict_observe));
        assert!(noise.as_ref().is_some_and(Event::is_conflict_noise));
        assert!(!obs.as_ref().is_some_and(Event::is_conflict_noise));

        let other = EventDraft::new(EventKind::Observe, Vec::new(), "o")
            .with_tag(tags::OBSERVE, "depth")
            .stamp(3)
            .ok();
        assert!(!other.as_ref().is_some_and(Event::is_conflict_observe));
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&EventKind::Observe).ok();
        assert_eq!(json.as_deref(), Some("\"observe\""));
    }
}
