//! The driver-owned facade over one ledger.
//!
//! A [`Session`] is the single logical writer: it owns the [`Ledger`], the
//! observe and noise gate state, and the most recent conflict analysis.
//! Callers feed inputs through [`Session::accept`] and then run
//! [`Session::maybe_observe`] and [`Session::maybe_inject_noise`], or do
//! all three at once with [`Session::step`].

use spiral_ledger::{BindingViolation, ClockError, Ledger, LedgerClock, LedgerError};
use spiral_types::{Event, EventDraft, EventId};
use tracing::{debug, info};

use crate::config::{ConfigError, SpiralConfig};
use crate::frontier::{self, FrontierMode, FrontierParams};
use crate::heat::{self, ConflictAnalysis};
use crate::noise::{self, NoiseState};
use crate::observe::{self, ObserveState};
use crate::view::View;

/// Errors raised by session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The ledger rejected an append.
    #[error("ledger error: {source}")]
    Ledger {
        /// The underlying ledger error.
        #[from]
        source: LedgerError,
    },

    /// The configuration failed validation.
    #[error("config error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },

    /// The ledger clock could not be built from the configuration.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// Ids of the events appended by one [`Session::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    /// The accepted input.
    pub input: EventId,
    /// The diagnostic, if the observe gate fired.
    pub observe: Option<EventId>,
    /// The synthetic event, if the noise injector fired.
    pub noise: Option<EventId>,
}

/// One ledger plus the gate state that drives it.
#[derive(Debug)]
pub struct Session {
    config: SpiralConfig,
    ledger: Ledger,
    observe: ObserveState,
    noise: NoiseState,
    analysis: Option<ConflictAnalysis>,
}

impl Session {
    /// Create a session with an empty ledger.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] if the configuration is invalid, or
    /// [`SessionError::Clock`] if the clock step is rejected.
    pub fn new(config: SpiralConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let clock = LedgerClock::new(config.clock.source, config.clock.step)?;
        Ok(Self {
            config,
            ledger: Ledger::with_clock(clock),
            observe: ObserveState::default(),
            noise: NoiseState::default(),
            analysis: None,
        })
    }

    /// Accept an external input chained onto the newest event.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Ledger`] if the append fails.
    pub fn accept(&mut self, topic: &str, label: &str) -> Result<&Event, SessionError> {
        let parents = self.ledger.last().map(|e| e.id).into_iter().collect();
        self.accept_with_parents(parents, topic, label)
    }

    /// Accept an external input with explicit parents.
    ///
    /// Parents are stored as given; they need not resolve.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Ledger`] if the append fails.
    pub fn accept_with_parents(
        &mut self,
        parents: Vec<EventId>,
        topic: &str,
        label: &str,
    ) -> Result<&Event, SessionError> {
        let id = self
            .ledger
            .append(EventDraft::input(parents, topic, label))?
            .id;

        self.observe = self.observe.on_input();
        let analysis = heat::analyze(&self.ledger, self.config.heat.window);
        debug!(
            input = %id.short(),
            total_heat = analysis.total_heat,
            dominant = %analysis.top.dominant,
            count = analysis.top.count,
            "conflict analysis"
        );
        self.analysis = Some(analysis);

        self.ledger
            .get(&id)
            .ok_or_else(|| LedgerError::InternalError("accepted input not found").into())
    }

    /// Run the observe gate against the latest analysis.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Ledger`] if the diagnostic cannot be
    /// appended; the gate state is left as it was.
    pub fn maybe_observe(&mut self) -> Result<Option<&Event>, SessionError> {
        let Some(analysis) = self.analysis.as_ref() else {
            return Ok(None);
        };
        let outcome = observe::evaluate(&self.observe, analysis, self.config.observe.cooldown);
        let Some(draft) = outcome.emit else {
            self.observe = outcome.next;
            return Ok(None);
        };

        let event = self.ledger.append(draft)?;
        self.observe = outcome.next;
        self.noise = self.noise.bind(&event.parent_ids);
        info!(
            id = %event.id.short(),
            timestamp = event.timestamp,
            payload = %event.payload,
            "observe emitted"
        );
        Ok(Some(event))
    }

    /// Run the noise injector against the latest analysis.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Ledger`] if the synthetic event cannot be
    /// appended; the injector state is left as it was.
    pub fn maybe_inject_noise(&mut self) -> Result<Option<&Event>, SessionError> {
        let Some(analysis) = self.analysis.as_ref() else {
            return Ok(None);
        };
        let now = self.ledger.latest_timestamp().unwrap_or_default();
        let outcome = noise::evaluate(&self.noise, analysis, now, &self.config.noise);
        let Some(draft) = outcome.emit else {
            return Ok(None);
        };

        let event = self.ledger.append(draft)?;
        self.noise = self.noise.emitted_at(event.timestamp);
        info!(
            id = %event.id.short(),
            timestamp = event.timestamp,
            parents = event.parent_ids.len(),
            "noise injected"
        );
        Ok(Some(event))
    }

    /// Accept an input and run both gates.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Ledger`] if any append fails.
    pub fn step(&mut self, topic: &str, label: &str) -> Result<StepReport, SessionError> {
        let input = self.accept(topic, label)?.id;
        let observe = self.maybe_observe()?.map(|e| e.id);
        let noise = self.maybe_inject_noise()?.map(|e| e.id);
        Ok(StepReport {
            input,
            observe,
            noise,
        })
    }

    /// Frontier with the configured parameters.
    pub fn frontier(&self, mode: FrontierMode) -> Vec<&Event> {
        self.frontier_with(mode, &self.config.frontier)
    }

    /// Frontier with explicit parameters.
    pub fn frontier_with(&self, mode: FrontierMode, params: &FrontierParams) -> Vec<&Event> {
        frontier::select(&self.ledger, mode, params, self.config.trace.half_life)
    }

    /// Apply a read-only view.
    pub fn view(&self, view: View) -> Vec<&Event> {
        view.select(&self.ledger, self.config.trace.half_life)
    }

    /// Audit the binding invariant. Empty means consistent.
    pub fn verify_invariants(&self) -> Vec<BindingViolation> {
        self.ledger.verify_bindings()
    }

    /// The underlying ledger.
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// The active configuration.
    pub const fn config(&self) -> &SpiralConfig {
        &self.config
    }

    /// The analysis computed for the most recent input.
    pub const fn analysis(&self) -> Option<&ConflictAnalysis> {
        self.analysis.as_ref()
    }

    /// Current observe gate state.
    pub const fn observe_state(&self) -> &ObserveState {
        &self.observe
    }

    /// Current noise injector state.
    pub const fn noise_state(&self) -> &NoiseState {
        &self.noise
    }
}
