//! Serializable toolbox configuration.
//!
//! One explicit struct threaded into every entry point; there is no global
//! settings object. Every section has defaults, so an empty TOML file is a
//! valid configuration.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use humbl_core::channel::ChannelConfig;
use humbl_core::compass::CompassConfig;
use humbl_core::window::{WindowSpec, WindowUnit};

/// Unique identifier for a configuration (content-addressable hash).
pub type ConfigId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Regime backtest parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Rolling volatility window, resolved in trading days.
    pub vol_window: WindowSpec,
    /// Annual risk-free rate as a fraction.
    pub risk_free_rate: f64,
    /// Regimes whose instances average fewer days are left out of the summary.
    pub min_regime_days: u32,
    /// Starting value of every regime's investment simulation.
    pub initial_investment: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            vol_window: WindowSpec::new(1, WindowUnit::Month),
            risk_free_rate: 0.03,
            min_regime_days: 21,
            initial_investment: 100_000.0,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_investment.is_finite() && self.initial_investment > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "initial_investment must be positive, got {}",
                self.initial_investment
            )));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(ConfigError::Invalid("risk_free_rate must be finite".into()));
        }
        if self.vol_window.trading_days() < 2 {
            return Err(ConfigError::Invalid(format!(
                "vol_window {} is shorter than two trading days",
                self.vol_window
            )));
        }
        Ok(())
    }
}

/// Configuration for every toolbox entry point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolboxConfig {
    pub channel: ChannelConfig,
    pub compass: CompassConfig,
    pub backtest: BacktestConfig,
}

impl ToolboxConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to load config {}", path.display()))
    }

    /// Checks that do not need input data. Channel input columns are checked
    /// again when a computation starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ch = &self.channel;
        let in_unit = |q: f64| q > 0.0 && q < 1.0;
        if !(in_unit(ch.lo_quantile) && in_unit(ch.hi_quantile) && ch.lo_quantile < ch.hi_quantile) {
            return Err(ConfigError::Invalid(format!(
                "quantiles must satisfy 0 < lo < hi < 1, got lo={} hi={}",
                ch.lo_quantile, ch.hi_quantile
            )));
        }
        if ch.max_workers == Some(0) {
            return Err(ConfigError::Invalid("max_workers must be at least 1".into()));
        }
        ch.window
            .months("channel windows")
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.backtest.validate()
    }

    /// Deterministic hash of the configuration, for tagging results.
    pub fn config_id(&self) -> ConfigId {
        // serialization of plain data cannot fail; fall back to the debug form
        let json = serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"));
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
