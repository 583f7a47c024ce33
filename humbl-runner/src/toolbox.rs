//! Toolbox facade: the three analyses over pluggable data providers.
//!
//! `compute_channel`, `classify_regime` and `run_backtest` fetch their
//! inputs from the providers and hand them to the pure engines with the
//! configured parameters.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use humbl_core::channel::{calc_humbl_channel, calc_humbl_channel_historical, ChannelResult};
use humbl_core::compass::{self, RegimeLabel};
use humbl_core::data::{MacroIndicator, MacroProvider, PriceProvider, QuoteProvider};
use humbl_core::momentum::{calc_momentum, signal_index, MomentumPoint};

use crate::backtest::{self, BacktestOutput};
use crate::config::{ConfigError, ConfigId, ToolboxConfig};
use crate::error::ToolboxError;

/// Channel rows plus, for point-in-time runs with momentum enabled, the
/// equity rows annotated with momentum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelOutput {
    pub channel: Vec<ChannelResult>,
    pub equity: Option<Vec<MomentumPoint>>,
}

/// Entry point bundling configuration and data sources.
#[derive(Clone)]
pub struct Toolbox {
    config: ToolboxConfig,
    prices: Arc<dyn PriceProvider>,
    macro_series: Arc<dyn MacroProvider>,
    quotes: Option<Arc<dyn QuoteProvider>>,
}

impl std::fmt::Debug for Toolbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolbox")
            .field("config", &self.config)
            .field("prices", &self.prices.name())
            .field("quotes", &self.quotes.is_some())
            .finish()
    }
}

impl Toolbox {
    /// Validates `config` up front.
    pub fn new(
        config: ToolboxConfig,
        prices: Arc<dyn PriceProvider>,
        macro_series: Arc<dyn MacroProvider>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            prices,
            macro_series,
            quotes: None,
        })
    }

    pub fn with_quotes(mut self, quotes: Arc<dyn QuoteProvider>) -> Self {
        self.quotes = Some(quotes);
        self
    }

    pub fn config(&self) -> &ToolboxConfig {
        &self.config
    }

    pub fn config_id(&self) -> ConfigId {
        self.config.config_id()
    }

    /// humblCHANNEL for `symbols` over `[start, end]`.
    pub fn compute_channel(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ChannelOutput, ToolboxError> {
        let cfg = &self.config.channel;
        let bars = self.prices.get_price_series(symbols, start, end)?;
        info!(
            provider = self.prices.name(),
            symbols = symbols.len(),
            bars = bars.len(),
            "fetched prices for channel"
        );

        let mut channel = if cfg.historical {
            calc_humbl_channel_historical(&bars, cfg)?
        } else {
            let quotes = if cfg.live_price {
                let provider = self.quotes.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("live_price requires a quote provider".into())
                })?;
                Some(provider.get_latest_quote(symbols)?)
            } else {
                None
            };
            calc_humbl_channel(&bars, cfg, quotes.as_ref())?
        };

        let Some(method) = cfg.momentum else {
            return Ok(ChannelOutput {
                channel,
                equity: None,
            });
        };
        let points = calc_momentum(&bars, &cfg.window, method)?;
        let signals = signal_index(&points);
        for row in &mut channel {
            match signals.get(&(row.symbol.as_str(), row.date)) {
                Some(signal) => row.momentum_signal = *signal,
                None => warn!(symbol = %row.symbol, date = %row.date, "no momentum row for channel date"),
            }
        }
        let equity = (!cfg.historical).then_some(points);
        Ok(ChannelOutput { channel, equity })
    }

    /// humblCOMPASS labels for `country` over `[start, end]`.
    pub fn classify_regime(
        &self,
        country: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RegimeLabel>, ToolboxError> {
        let cli = self
            .macro_series
            .get_macro_series(MacroIndicator::Cli, country, start, end)?;
        let cpi = self
            .macro_series
            .get_macro_series(MacroIndicator::Cpi, country, start, end)?;
        Ok(compass::classify_regime(&cli, &cpi, &self.config.compass)?)
    }

    /// Regime backtest of `symbols` against `country`'s regimes.
    pub fn run_backtest(
        &self,
        symbols: &[String],
        country: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BacktestOutput, ToolboxError> {
        let labels = self.classify_regime(country, start, end)?;
        let bars = self.prices.get_price_series(symbols, start, end)?;
        backtest::run_backtest(&bars, &labels, &self.config.backtest)
    }
}
