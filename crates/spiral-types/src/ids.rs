//! Content-derived event identifiers.
//!
//! An [`EventId`] is a name-based (v5) UUID computed over the canonical
//! fingerprint of an event. Two events with byte-identical fingerprints
//! receive the same id in any ledger, which is what makes ids
//! reproducible across runs fed the same inputs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace under which every event fingerprint is hashed.
const EVENT_NAMESPACE: Uuid = Uuid::from_u128(0x5b1f_7c2e_9a43_4d0e_8f61_2c7a_b3e9_d104);

/// Unique identifier for an event in a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
    /// Derive an identifier from raw fingerprint bytes.
    pub fn from_fingerprint(fingerprint: &[u8]) -> Self {
        Self(Uuid::new_v5(&EVENT_NAMESPACE, fingerprint))
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }

    /// The first eight hex characters, for compact reports and logs.
    pub fn short(&self) -> String {
        format!("{:08x}", self.0.as_fields().0)
    }
}

impl core::fmt::Display for EventId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl From<Uuid> for EventId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<EventId> for Uuid {
    fn from(id: EventId) -> Self {
        id.0
    }
}
