//! Shared type definitions for the Spiral causal ledger.
//!
//! This crate is the single source of truth for the event model used
//! across the workspace. Every other crate builds on these types.
//!
//! # Modules
//!
//! - [`ids`] -- Content-derived [`EventId`] wrapper around [`uuid::Uuid`]
//! - [`event`] -- The immutable [`Event`] record, its [`EventKind`], and
//!   the unstamped [`EventDraft`] handed to the ledger
//! - [`payload`] -- The `key=value; ...` sublanguage used for topic lookup

pub mod event;
pub mod ids;
pub mod payload;

// Re-export all public types at crate root for convenience.
pub use event::{Event, EventDraft, EventKind, tags};
pub use ids::EventId;
pub use payload::parse_kv;
