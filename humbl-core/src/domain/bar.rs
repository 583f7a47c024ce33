//! PriceBar — one (symbol, date) observation of a price series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily price observation for a single symbol.
///
/// Only `close` is mandatory. Range-based volatility estimators additionally
/// need `open`, `high` and `low`; series that lack them can still feed the
/// close-to-close estimators and the channel itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
}

impl PriceBar {
    /// Close-only bar.
    pub fn close_only(symbol: impl Into<String>, date: NaiveDate, close: f64) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            open: None,
            high: None,
            low: None,
            close,
        }
    }

    /// Full OHLC bar.
    pub fn ohlc(
        symbol: impl Into<String>,
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close,
        }
    }

    /// True when open, high and low are all present.
    pub fn has_ohlc(&self) -> bool {
        self.open.is_some() && self.high.is_some() && self.low.is_some()
    }

    /// A usable close: finite and strictly positive (log returns need it).
    pub fn has_valid_close(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn close_only_bar_has_no_ohlc() {
        let bar = PriceBar::close_only("AAPL", d(2024, 1, 2), 100.0);
        assert!(!bar.has_ohlc());
        assert!(bar.has_valid_close());
    }

    #[test]
    fn ohlc_bar_reports_ohlc() {
        let bar = PriceBar::ohlc("AAPL", d(2024, 1, 2), 99.0, 101.0, 98.0, 100.0);
        assert!(bar.has_ohlc());
    }

    #[test]
    fn non_positive_close_is_invalid() {
        assert!(!PriceBar::close_only("X", d(2024, 1, 2), 0.0).has_valid_close());
        assert!(!PriceBar::close_only("X", d(2024, 1, 2), f64::NAN).has_valid_close());
    }

    #[test]
    fn serde_roundtrip() {
        let bar = PriceBar::ohlc("SPY", d(2024, 3, 1), 1.0, 2.0, 0.5, 1.5);
        let json = serde_json::to_string(&bar).unwrap();
        let back: PriceBar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar, back);
    }
}
