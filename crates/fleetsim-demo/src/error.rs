//! Error types for the scenario demo binary.
//!
//! [`DemoError`] is the top-level error type that wraps all possible
//! failure modes during demo startup and execution.

/// Top-level error for the scenario demo binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: fleetsim_core::config::ConfigError,
    },

    /// The scenario script has an invalid phase layout.
    #[error("timeline error: {source}")]
    Timeline {
        /// The underlying timeline error.
        #[from]
        source: fleetsim_core::timeline::TimelineError,
    },

    /// The engine runner stopped with an error.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: fleetsim_core::runner::RunnerError,
    },

    /// The audit trail rejected an event or failed verification.
    #[error("audit error: {source}")]
    Audit {
        /// The underlying audit error.
        #[from]
        source: fleetsim_audit::AuditError,
    },

    /// A background task panicked or was cancelled.
    #[error("task error: {message}")]
    Task {
        /// Description of the task failure.
        message: String,
    },

    /// The engine stopped accepting intents or publishing snapshots.
    #[error("channel closed: {message}")]
    ChannelClosed {
        /// Which channel closed.
        message: String,
    },
}
