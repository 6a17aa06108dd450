//! Configuration loading and typed config structures for the scenario demo.
//!
//! The canonical configuration lives in `fleetsim-config.yaml` at the
//! project root. Every field has a serde default, so an empty file (or a
//! missing section) yields the stock scenario timing.

use std::path::Path;

use serde::Deserialize;
use tracing::warn;

/// Environment variable that overrides `engine.seed`.
pub const SEED_ENV_VAR: &str = "FLEETSIM_SEED";

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

    /// A value parsed but is unusable.
    #[error("invalid config value `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: &'static str,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level scenario configuration.
///
/// Mirrors the structure of `fleetsim-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScenarioConfig {
    /// Engine timing and randomness.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Approval workflow settings.
    #[serde(default)]
    pub approval: ApprovalConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Scripted operator used by the headless demo.
    #[serde(default)]
    pub operator: OperatorConfig,
}

impl ScenarioConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `FLEETSIM_SEED` overrides `engine.seed` when set to a valid integer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value fails validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_seed_override(std::env::var(SEED_ENV_VAR).ok().as_deref());
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string without env overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML or
    /// [`ConfigError::Invalid`] if a value fails validation.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply a seed override value, ignoring (with a warning) anything that
    /// is not an unsigned integer.
    pub fn apply_seed_override(&mut self, value: Option<&str>) {
        let Some(raw) = value else {
            return;
        };
        match raw.trim().parse::<u64>() {
            Ok(seed) => self.engine.seed = seed,
            Err(_) => warn!(value = raw, "ignoring non-numeric {SEED_ENV_VAR}"),
        }
    }

    /// Reject values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for zero intervals, a non-positive
    /// tick scale, or an empty approval phrase.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.clock_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "engine.clock_interval_ms",
                reason: "must be greater than zero",
            });
        }
        if self.engine.sample_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "engine.sample_interval_ms",
                reason: "must be greater than zero",
            });
        }
        if !(self.engine.tick_scale.is_finite() && self.engine.tick_scale > 0.0) {
            return Err(ConfigError::Invalid {
                field: "engine.tick_scale",
                reason: "must be a positive number",
            });
        }
        if self.approval.phrase.is_empty() {
            return Err(ConfigError::Invalid {
                field: "approval.phrase",
                reason: "must not be empty",
            });
        }
        if self.approval.action_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "approval.action_interval_ms",
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }
}

/// Engine timing and randomness.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Random seed for telemetry sampling.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Milliseconds per simulated second.
    #[serde(default = "default_clock_interval_ms")]
    pub clock_interval_ms: u64,

    /// Milliseconds between kinematics/telemetry samples.
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,

    /// Velocity multiplier per sample.
    #[serde(default = "default_tick_scale")]
    pub tick_scale: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            clock_interval_ms: default_clock_interval_ms(),
            sample_interval_ms: default_sample_interval_ms(),
            tick_scale: default_tick_scale(),
        }
    }
}

/// Approval workflow settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApprovalConfig {
    /// Exact phrase the operator must type to approve a playbook.
    #[serde(default = "default_phrase")]
    pub phrase: String,

    /// Delay between execution log lines.
    #[serde(default = "default_action_interval_ms")]
    pub action_interval_ms: u64,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            phrase: default_phrase(),
            action_interval_ms: default_action_interval_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Scripted operator for the headless demo.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OperatorConfig {
    /// Name recorded with approvals.
    #[serde(default = "default_operator_name")]
    pub name: String,

    /// Whether proposed playbooks are approved automatically.
    #[serde(default = "default_auto_approve")]
    pub auto_approve: bool,

    /// Wall-clock delay between a proposal and its approval.
    #[serde(default = "default_approve_delay_ms")]
    pub approve_delay_ms: u64,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            name: default_operator_name(),
            auto_approve: default_auto_approve(),
            approve_delay_ms: default_approve_delay_ms(),
        }
    }
}

// ----- Default value functions -----

const fn default_seed() -> u64 {
    42
}

const fn default_clock_interval_ms() -> u64 {
    1000
}

const fn default_sample_interval_ms() -> u64 {
    300
}

const fn default_tick_scale() -> f64 {
    0.3
}

fn default_phrase() -> String {
    "Action Approve".to_owned()
}

const fn default_action_interval_ms() -> u64 {
    600
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_operator_name() -> String {
    "operator".to_owned()
}

const fn default_auto_approve() -> bool {
    true
}

const fn default_approve_delay_ms() -> u64 {
    1500
}
