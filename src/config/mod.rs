//! Application configuration loading and validation.
//!
//! Configuration is loaded from a TOML file with environment variable
//! overrides for per-venue API credentials.

mod logging;
mod risk;
mod venue;

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

pub use logging::LoggingConfig;
pub use risk::RiskConfig;
pub use venue::{RateLimitPolicyConfig, VenueConfig, WebSocketConfig};

use crate::detectors::{SpatialDetectorConfig, StatisticalDetectorConfig, TriangularDetectorConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Backtest,
    #[default]
    Paper,
    Live,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemConfig {
    #[serde(default)]
    pub execution_mode: ExecutionMode,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetectorConfig {
    #[serde(default)]
    pub spatial: SpatialDetectorConfig,
    #[serde(default)]
    pub triangular: TriangularDetectorConfig,
    #[serde(default)]
    pub statistical: StatisticalDetectorConfig,
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub symbols: Vec<String>,
    #[serde(default)]
    pub detectors: DetectorConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub venues: HashMap<String, VenueConfig>,
    #[serde(default)]
    pub initial_balances: HashMap<String, HashMap<String, f64>>,
}

impl Config {
    /// Load configuration from a TOML file, overlay per-venue API
    /// credentials from the environment (`<PREFIX>_<VENUE>_API_KEY`,
    /// `..._API_SECRET`, `..._API_PASSPHRASE`), then validate.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P, env_prefix: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let mut config: Self = toml::from_str(&content).map_err(ConfigError::Parse)?;

        for (name, venue) in &mut config.venues {
            let upper = name.to_uppercase();
            venue.api_key = std::env::var(format!("{env_prefix}_{upper}_API_KEY")).ok();
            venue.api_secret = std::env::var(format!("{env_prefix}_{upper}_API_SECRET")).ok();
            venue.api_passphrase =
                std::env::var(format!("{env_prefix}_{upper}_API_PASSPHRASE")).ok();
        }

        config.validate()?;
        Ok(config)
    }

    /// Override `system.execution_mode` from a CLI flag, if provided.
    pub fn apply_mode_override(&mut self, mode: Option<ExecutionMode>) {
        if let Some(mode) = mode {
            self.system.execution_mode = mode;
        }
    }

    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<(), ConfigError> {
        if self.system.execution_mode != ExecutionMode::Backtest && self.venues.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "venues",
                reason: "at least one venue is required outside backtest mode".to_string(),
            });
        }

        self.risk.validate()?;

        if self.detectors.spatial.min_spread_pct < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "detectors.spatial.min_spread_pct",
                reason: "must be >= 0".to_string(),
            });
        }
        if self.detectors.spatial.min_depth_usd < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "detectors.spatial.min_depth_usd",
                reason: "must be >= 0".to_string(),
            });
        }
        if self.detectors.triangular.min_profit_pct < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "detectors.triangular.min_profit_pct",
                reason: "must be >= 0".to_string(),
            });
        }
        if self.detectors.statistical.entry_zscore <= self.detectors.statistical.exit_zscore {
            return Err(ConfigError::InvalidValue {
                field: "detectors.statistical.entry_zscore",
                reason: "must be greater than exit_zscore".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.detectors.statistical.p_value_threshold) {
            return Err(ConfigError::InvalidValue {
                field: "detectors.statistical.p_value_threshold",
                reason: "must be between 0 and 1".to_string(),
            });
        }

        for (name, venue) in &self.venues {
            venue.validate(name)?;
        }

        Ok(())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
