//! Data provider traits and structured error types.
//!
//! The computation core never fetches anything itself. Price series, macro
//! series and live quotes arrive through these synchronous traits so that
//! network clients, file importers and test fixtures are interchangeable.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::domain::{MacroObservation, PriceBar};

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no {indicator} series for country '{country}'")]
    SeriesNotFound {
        indicator: MacroIndicator,
        country: String,
    },

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Macro indicators consumed by the regime classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MacroIndicator {
    /// Composite leading indicator.
    Cli,
    /// Consumer price index.
    Cpi,
}

impl fmt::Display for MacroIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MacroIndicator::Cli => "CLI",
            MacroIndicator::Cpi => "CPI",
        })
    }
}

/// Source of daily price series.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Bars for every symbol over `[start, end]`, in no particular order.
    fn get_price_series(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, DataError>;
}

/// Source of monthly or quarterly macro series.
pub trait MacroProvider: Send + Sync {
    fn get_macro_series(
        &self,
        indicator: MacroIndicator,
        country: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MacroObservation>, DataError>;
}

/// Source of the latest traded price per symbol.
pub trait QuoteProvider: Send + Sync {
    fn get_latest_quote(&self, symbols: &[String]) -> Result<HashMap<String, f64>, DataError>;
}

/// Provider over data held in memory, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    bars: Vec<PriceBar>,
    macro_series: HashMap<MacroIndicator, Vec<MacroObservation>>,
    quotes: HashMap<String, f64>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(mut self, bars: impl IntoIterator<Item = PriceBar>) -> Self {
        self.bars.extend(bars);
        self
    }

    pub fn with_macro(
        mut self,
        indicator: MacroIndicator,
        observations: impl IntoIterator<Item = MacroObservation>,
    ) -> Self {
        self.macro_series
            .entry(indicator)
            .or_default()
            .extend(observations);
        self
    }

    pub fn with_quote(mut self, symbol: impl Into<String>, price: f64) -> Self {
        self.quotes.insert(symbol.into(), price);
        self
    }
}

impl PriceProvider for InMemoryProvider {
    fn name(&self) -> &str {
        "in-memory"
    }

    fn get_price_series(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, DataError> {
        if start > end {
            return Err(DataError::ValidationError(format!(
                "start {start} is after end {end}"
            )));
        }
        let mut out = Vec::new();
        for symbol in symbols {
            let before = out.len();
            out.extend(
                self.bars
                    .iter()
                    .filter(|b| &b.symbol == symbol && b.date >= start && b.date <= end)
                    .cloned(),
            );
            if out.len() == before {
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.clone(),
                });
            }
        }
        Ok(out)
    }
}

impl MacroProvider for InMemoryProvider {
    fn get_macro_series(
        &self,
        indicator: MacroIndicator,
        country: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MacroObservation>, DataError> {
        let out: Vec<MacroObservation> = self
            .macro_series
            .get(&indicator)
            .into_iter()
            .flatten()
            .filter(|o| o.country == country && o.date >= start && o.date <= end)
            .cloned()
            .collect();
        if out.is_empty() {
            return Err(DataError::SeriesNotFound {
                indicator,
                country: country.to_string(),
            });
        }
        Ok(out)
    }
}

impl QuoteProvider for InMemoryProvider {
    fn get_latest_quote(&self, symbols: &[String]) -> Result<HashMap<String, f64>, DataError> {
        Ok(symbols
            .iter()
            .filter_map(|s| self.quotes.get(s).map(|p| (s.clone(), *p)))
            .collect())
    }
}
