//! Seeded input churn fed through a [`Session`].
//!
//! The driver is the external caller: it owns the random source, decides
//! topics and labels, and asks the session to run its gates after every
//! accepted input.

use rand::Rng;
use serde::Deserialize;
use spiral_core::Session;

use crate::error::EngineError;

/// Label of the periodic repair input.
pub const REPAIR_LABEL: &str = "repair: summarize";

/// The `driver` section of `spiral-config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DriverConfig {
    /// Seed for the driver's random source.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of synthetic inputs.
    #[serde(default = "default_inputs")]
    pub inputs: usize,

    /// Topics drawn uniformly for each input.
    #[serde(default = "default_topics")]
    pub topics: Vec<String>,

    /// A repair input follows every `repair_every`-th input. Zero disables it.
    #[serde(default = "default_repair_every")]
    pub repair_every: usize,

    /// Tail length for the recent frontier view.
    #[serde(default = "default_recent_k_view")]
    pub recent_k_view: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            inputs: default_inputs(),
            topics: default_topics(),
            repair_every: default_repair_every(),
            recent_k_view: default_recent_k_view(),
        }
    }
}

impl DriverConfig {
    /// Check that the driver can run.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Driver`] if no topics are configured.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.topics.is_empty() {
            return Err(EngineError::Driver {
                message: "driver.topics must not be empty".to_owned(),
            });
        }
        Ok(())
    }
}

const fn default_seed() -> u64 {
    7
}

const fn default_inputs() -> usize {
    28
}

fn default_topics() -> Vec<String> {
    ["x", "y", "z"].iter().map(|t| (*t).to_owned()).collect()
}

const fn default_repair_every() -> usize {
    9
}

const fn default_recent_k_view() -> usize {
    10
}

/// Counts of what one run appended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Inputs accepted, repairs included.
    pub inputs: usize,
    /// Diagnostics emitted.
    pub observes: usize,
    /// Synthetic events injected.
    pub noises: usize,
}

impl RunSummary {
    const fn record(&mut self, report: spiral_core::StepReport) {
        self.inputs = self.inputs.saturating_add(1);
        if report.observe.is_some() {
            self.observes = self.observes.saturating_add(1);
        }
        if report.noise.is_some() {
            self.noises = self.noises.saturating_add(1);
        }
    }
}

fn pick_topic<'a, R: Rng>(rng: &mut R, topics: &'a [String]) -> Result<&'a str, EngineError> {
    let index = rng.random_range(0..topics.len());
    topics
        .get(index)
        .map(String::as_str)
        .ok_or_else(|| EngineError::Driver {
            message: "driver.topics must not be empty".to_owned(),
        })
}

/// Feed `config.inputs` synthetic inputs into the session.
///
/// # Errors
///
/// Returns [`EngineError::Driver`] for an unusable config, or
/// [`EngineError::Session`] if an append fails.
pub fn run<R: Rng>(
    session: &mut Session,
    config: &DriverConfig,
    rng: &mut R,
) -> Result<RunSummary, EngineError> {
    config.validate()?;
    let mut summary = RunSummary::default();

    for i in 0..config.inputs {
        let topic = pick_topic(rng, &config.topics)?;
        let label = format!("evt{i}:{}", rng.random_range(1_000_000..10_000_000_u32));
        summary.record(session.step(topic, &label)?);

        if i > 0 && i.checked_rem(config.repair_every) == Some(0) {
            let topic = pick_topic(rng, &config.topics)?;
            summary.record(session.step(topic, REPAIR_LABEL)?);
        }
    }
    Ok(summary)
}
