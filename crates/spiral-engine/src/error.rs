//! Error types for the Spiral driver binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup and the driver run.

/// Top-level error for the driver binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: spiral_core::ConfigError,
    },

    /// The session rejected an operation.
    #[error("session error: {source}")]
    Session {
        /// The underlying session error.
        #[from]
        source: spiral_core::SessionError,
    },

    /// The `driver` section is unusable.
    #[error("driver config error: {message}")]
    Driver {
        /// Description of the problem.
        message: String,
    },

    /// The binding audit found violations at the end of the run.
    #[error("ledger integrity check failed with {count} violation(s)")]
    Integrity {
        /// Number of violated clauses.
        count: usize,
    },
}
