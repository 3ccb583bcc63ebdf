//! Configuration loading and typed config structures for a Parley run.
//!
//! The canonical configuration lives in `parley-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads and validates the file.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use parley_comms::{CommsError, DecisionConfig, PipelineGate, TimeMode, VerbProfile, VerbTable};
use parley_types::{AckPolicy, OrderVerb};

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

    /// The YAML parsed but describes an unusable pipeline.
    #[error("invalid configuration: {source}")]
    Invalid {
        /// The validation failure.
        #[from]
        source: CommsError,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level run configuration.
///
/// Mirrors the structure of `parley-config.yaml`. Every field has a default,
/// so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// World-level settings (name, seed, timing).
    #[serde(default)]
    pub world: WorldConfig,

    /// Pipeline feature flag and time mode.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Default decision thresholds for every entity.
    #[serde(default)]
    pub decision: DecisionConfig,

    /// Per-verb risk and doctrine overrides on top of the built-in table.
    #[serde(default)]
    pub verbs: BTreeMap<OrderVerb, VerbProfile>,

    /// Demo population parameters.
    #[serde(default)]
    pub population: PopulationConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Simulation boundary parameters.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `PARLEY_LOG` overrides `logging.level`
    /// - `PARLEY_MAX_TICKS` overrides `simulation.max_ticks`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if the decision thresholds are out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if the decision thresholds are out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Override selected values with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("PARLEY_LOG") {
            self.logging.level = val;
        }
        if let Some(max_ticks) = std::env::var("PARLEY_MAX_TICKS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
        {
            self.simulation.max_ticks = max_ticks;
        }
    }

    /// Check the decision thresholds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.decision.validate()?;
        Ok(())
    }

    /// The built-in verb table with this configuration's overrides applied.
    pub fn verb_table(&self) -> VerbTable {
        VerbTable::with_overrides(&self.verbs)
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable run name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for the demo population and scripted traffic.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Real-time milliseconds per tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

/// Pipeline gating configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PipelineConfig {
    /// Whether the message pipeline runs at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Time mode at startup (`record`, `replay`, `catch_up`).
    #[serde(default)]
    pub mode: TimeMode,
}

impl PipelineConfig {
    /// The gate a run starts with.
    pub const fn gate(self) -> PipelineGate {
        PipelineGate {
            enabled: self.enabled,
            paused: false,
            mode: self.mode,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: TimeMode::Record,
        }
    }
}

/// Demo population configuration.
///
/// The engine spawns `squads` squads of `squad_size` members each. The first
/// member of each squad is its commander.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PopulationConfig {
    /// Number of squads.
    #[serde(default = "default_squads")]
    pub squads: u32,

    /// Members per squad, commander included.
    #[serde(default = "default_squad_size")]
    pub squad_size: u32,

    /// Distinct languages spread across the population.
    #[serde(default = "default_languages")]
    pub languages: u16,

    /// Ticks between orders from each commander.
    #[serde(default = "default_order_every_ticks")]
    pub order_every_ticks: u64,

    /// Acknowledgement policy commanders attach to their orders.
    #[serde(default = "default_ack_policy")]
    pub ack_policy: AckPolicy,

    /// Upper bound on each endpoint's noise floor.
    #[serde(default = "default_max_noise_floor")]
    pub max_noise_floor: f32,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            squads: default_squads(),
            squad_size: default_squad_size(),
            languages: default_languages(),
            order_every_ticks: default_order_every_ticks(),
            ack_policy: default_ack_policy(),
            max_noise_floor: default_max_noise_floor(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
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

/// Simulation boundary configuration.
///
/// A value of 0 for either `max_ticks` or `max_real_time_seconds` means
/// unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Maximum number of ticks before the run ends (0 = unlimited).
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// Maximum wall-clock seconds before the run ends (0 = unlimited).
    #[serde(default)]
    pub max_real_time_seconds: u64,
}

impl Default for SimulationBoundsConfig {
    fn default() -> Self {
        Self {
            max_ticks: default_max_ticks(),
            max_real_time_seconds: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    "Parley Drill".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_tick_interval_ms() -> u64 {
    250
}

const fn default_squads() -> u32 {
    3
}

const fn default_squad_size() -> u32 {
    4
}

const fn default_languages() -> u16 {
    2
}

const fn default_order_every_ticks() -> u64 {
    3
}

const fn default_ack_policy() -> AckPolicy {
    AckPolicy::OnHighRisk
}

const fn default_max_noise_floor() -> f32 {
    0.1
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_max_ticks() -> u64 {
    50
}

const fn default_true() -> bool {
    true
}
