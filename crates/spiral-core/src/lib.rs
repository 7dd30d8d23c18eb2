//! Conflict signals, gates, and views for the Spiral engine.
//!
//! This crate turns a growing [`Ledger`] into structural signals and
//! reacts to them by appending more events. It never edits history.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `spiral-config.yaml` into
//!   strongly-typed structs.
//! - [`heat`] -- Topic-transition heat over a sliding window of inputs.
//! - [`observe`] -- Debounced conflict-heat diagnostics.
//! - [`noise`] -- Synthetic events strongly bound to the last diagnostic.
//! - [`frontier`] -- Bounded, trace-ranked subsets of the graph.
//! - [`view`] -- Read-only filter views.
//! - [`session`] -- [`Session`]: the single driver that owns a ledger and
//!   the gate state.
//!
//! [`Ledger`]: spiral_ledger::Ledger
//! [`Session`]: session::Session

pub mod config;
pub mod frontier;
pub mod heat;
pub mod noise;
pub mod observe;
pub mod session;
pub mod view;

pub use config::{ConfigError, SpiralConfig};
pub use frontier::{FrontierMode, FrontierParams};
pub use heat::ConflictAnalysis;
pub use session::{Session, SessionError, StepReport};
pub use view::View;
