//! Configuration loading and typed config structures for the Spiral engine.
//!
//! The canonical configuration lives in `spiral-config.yaml` at the
//! project root. Every field has a default, so an empty file (or no file)
//! yields a working configuration.

use std::path::Path;

use serde::Deserialize;
use spiral_ledger::{DEFAULT_HALF_LIFE, TimeSource};

use crate::frontier::FrontierParams;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is outside its allowed range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SpiralConfig {
    /// Ledger clock settings.
    #[serde(default)]
    pub clock: ClockConfig,

    /// Conflict-heat window.
    #[serde(default)]
    pub heat: HeatConfig,

    /// Observe gate debounce.
    #[serde(default)]
    pub observe: ObserveConfig,

    /// Noise injector thresholds.
    #[serde(default)]
    pub noise: NoiseConfig,

    /// Trace score decay.
    #[serde(default)]
    pub trace: TraceConfig,

    /// Default frontier parameters.
    #[serde(default)]
    pub frontier: FrontierParams,
}

impl SpiralConfig {
    /// Load and validate configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero heat window, a zero
    /// clock step, or a half-life that is not a positive finite number.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.heat.window == 0 {
            return Err(ConfigError::Invalid {
                reason: "heat.window must be at least 1".to_owned(),
            });
        }
        if self.clock.step == 0 {
            return Err(ConfigError::Invalid {
                reason: "clock.step must be at least 1".to_owned(),
            });
        }
        if !(self.trace.half_life.is_finite() && self.trace.half_life > 0.0) {
            return Err(ConfigError::Invalid {
                reason: format!("trace.half_life must be positive, got {}", self.trace.half_life),
            });
        }
        Ok(())
    }
}

/// Ledger clock configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClockConfig {
    /// Where observed time comes from.
    #[serde(default)]
    pub source: TimeSource,

    /// Minimum advance per appended event.
    #[serde(default = "default_clock_step")]
    pub step: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            source: TimeSource::default(),
            step: default_clock_step(),
        }
    }
}

/// Conflict-heat analyzer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HeatConfig {
    /// Number of most recent input events inspected.
    #[serde(default = "default_window")]
    pub window: usize,
}

impl Default for HeatConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
        }
    }
}

/// Observe gate configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ObserveConfig {
    /// Inputs that must be accepted after an emission before the next one.
    #[serde(default)]
    pub cooldown: u64,
}

/// Noise injector configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NoiseConfig {
    /// Ticks that must elapse after a noise emission before the next one.
    #[serde(default = "default_noise_cooldown")]
    pub cooldown: u64,

    /// Minimum heat that counts as sustained conflict.
    #[serde(default = "default_noise_threshold")]
    pub threshold: usize,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            cooldown: default_noise_cooldown(),
            threshold: default_noise_threshold(),
        }
    }
}

/// Trace score configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TraceConfig {
    /// Ticks after which an event's score halves.
    #[serde(default = "default_half_life")]
    pub half_life: f64,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            half_life: default_half_life(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_clock_step() -> u64 {
    1
}

const fn default_window() -> usize {
    14
}

const fn default_noise_cooldown() -> u64 {
    2
}

const fn default_noise_threshold() -> usize {
    2
}

const fn default_half_life() -> f64 {
    DEFAULT_HALF_LIFE
}
