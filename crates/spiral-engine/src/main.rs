//! Driver binary for the Spiral engine.
//!
//! Loads configuration, feeds a seeded stream of synthetic inputs through a
//! [`Session`], then logs the read-only views and the binding audit.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `$SPIRAL_CONFIG` (default `spiral-config.yaml`)
//! 3. Create the session and the seeded random source
//! 4. Run the driver loop
//! 5. Log the views and frontiers
//! 6. Audit the binding invariant

mod driver;
mod error;

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::SmallRng;
use spiral_core::view::DEFAULT_TRACE_DEPTH;
use spiral_core::{FrontierMode, FrontierParams, Session, SpiralConfig, View};
use spiral_ledger::{Ledger, trace_score};
use spiral_types::{Event, EventId};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::driver::DriverConfig;
use crate::error::EngineError;

/// Environment variable naming the configuration file.
const CONFIG_ENV: &str = "SPIRAL_CONFIG";

/// Configuration file used when [`CONFIG_ENV`] is unset.
const DEFAULT_CONFIG_PATH: &str = "spiral-config.yaml";

/// Events logged for the last-events view.
const LAST_VIEW_LEN: usize = 12;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded, an append fails, or
/// the final audit finds violations.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("spiral-engine starting");

    // 2. Load configuration.
    let path = config_path();
    let config = load_config(&path)?;
    let driver_config = load_driver_config(&path)?;
    info!(
        path = %path.display(),
        window = config.heat.window,
        observe_cooldown = config.observe.cooldown,
        noise_cooldown = config.noise.cooldown,
        noise_threshold = config.noise.threshold,
        seed = driver_config.seed,
        inputs = driver_config.inputs,
        "Configuration loaded"
    );

    // 3. Create the session.
    let mut session = Session::new(config)?;
    let mut rng = SmallRng::seed_from_u64(driver_config.seed);

    // 4. Run.
    let summary = driver::run(&mut session, &driver_config, &mut rng)?;
    info!(
        history_size = session.ledger().len(),
        inputs = summary.inputs,
        observes = summary.observes,
        noises = summary.noises,
        "Run complete (append-only)"
    );

    // 5. Views.
    log_view("last", &session, &session.view(View::Last(LAST_VIEW_LEN)));
    let recent = FrontierParams {
        recent_k: driver_config.recent_k_view,
        ..session.config().frontier.clone()
    };
    log_view(
        "frontier_recent",
        &session,
        &session.frontier_with(FrontierMode::Recent, &recent),
    );
    log_view(
        "frontier_global",
        &session,
        &session.frontier(FrontierMode::Global),
    );
    log_view("observe_only", &session, &session.view(View::ObserveOnly));
    log_view(
        "traceable_only",
        &session,
        &session.view(View::TraceableOnly {
            max_depth: DEFAULT_TRACE_DEPTH,
        }),
    );

    // 6. Audit.
    let violations = session.verify_invariants();
    if violations.is_empty() {
        info!("Binding audit passed: no deletions, no edits, only new events");
        Ok(())
    } else {
        for violation in &violations {
            warn!(%violation, "Binding violation");
        }
        Err(EngineError::Integrity {
            count: violations.len(),
        }
        .into())
    }
}

/// Resolve the configuration path from the environment.
fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV).map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load engine configuration. A missing file means defaults.
fn load_config(path: &Path) -> Result<SpiralConfig, EngineError> {
    if path.exists() {
        Ok(SpiralConfig::from_file(path)?)
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
        Ok(SpiralConfig::default())
    }
}

/// Load the `driver` section from the same YAML file.
fn load_driver_config(path: &Path) -> Result<DriverConfig, EngineError> {
    if !path.exists() {
        return Ok(DriverConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| EngineError::Driver {
        message: format!("failed to read config file: {e}"),
    })?;
    let raw: serde_yml::Value = serde_yml::from_str(&contents).map_err(|e| EngineError::Driver {
        message: format!("failed to parse config YAML: {e}"),
    })?;

    let config = match raw.get("driver") {
        Some(section) => {
            serde_yml::from_value(section.clone()).map_err(|e| EngineError::Driver {
                message: format!("failed to parse driver config: {e}"),
            })?
        }
        None => DriverConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

/// Log one view, one event per line.
fn log_view(name: &str, session: &Session, events: &[&Event]) {
    let ledger: &Ledger = session.ledger();
    let half_life = session.config().trace.half_life;
    info!(view = name, count = events.len(), "View");
    for event in events {
        let parents: Vec<String> = event.parent_ids.iter().map(EventId::short).collect();
        info!(
            view = name,
            timestamp = event.timestamp,
            id = %event.id.short(),
            kind = %event.kind,
            score = trace_score(event, ledger, half_life),
            parents = ?parents,
            payload = %event.payload,
            "Event"
        );
    }
}
