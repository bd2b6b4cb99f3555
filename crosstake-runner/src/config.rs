//! TOML simulation configuration.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. CLI flags override file values.

use crosstake_core::domain::DEFAULT_COMMISSION_RATE;
use crosstake_core::engine::{SizingPolicy, StrategyConfig};
use crosstake_core::indicators::CrossoverWindows;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::simulation::Valuation;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Where bars come from on a cache miss.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    Yahoo,
    Csv,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSection {
    pub commission_rate: f64,
    pub take_profit_percent: f64,
    pub sizing: SizingPolicy,
    pub valuation: Valuation,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            commission_rate: DEFAULT_COMMISSION_RATE,
            take_profit_percent: 20.0,
            sizing: SizingPolicy::default(),
            valuation: Valuation::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    pub cache_dir: PathBuf,
    pub source: SourceKind,
    pub csv_dir: PathBuf,
    pub timeout_secs: u64,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("cache"),
            source: SourceKind::default(),
            csv_dir: PathBuf::from("data"),
            timeout_secs: crosstake_core::data::DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub simulation: SimulationSection,
    pub windows: CrossoverWindows,
    pub data: DataSection,
}

impl SimulationConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.strategy()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.data.timeout_secs == 0 {
            return Err(ConfigError::Invalid("data.timeout_secs must be > 0".into()));
        }
        Ok(())
    }

    /// Strategy parameters as the engine consumes them.
    pub fn strategy(&self) -> StrategyConfig {
        StrategyConfig {
            windows: self.windows,
            take_profit_percent: self.simulation.take_profit_percent,
            commission_rate: self.simulation.commission_rate,
            sizing: self.simulation.sizing,
        }
    }

    /// Serialize the config to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
