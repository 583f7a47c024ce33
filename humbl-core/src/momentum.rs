//! Momentum: rate of change over a calendar lookback and a binary signal.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::data::canonicalize;
use crate::domain::PriceBar;
use crate::error::HumblError;
use crate::volatility::symbol_runs;
use crate::window::WindowSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MomentumMethod {
    /// `ln(c) - ln(c[t-w])`
    Log,
    /// `(c - c[t-w]) / c[t-w]`
    Simple,
    /// Direction against the close `w` rows back.
    Shift,
}

impl fmt::Display for MomentumMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MomentumMethod::Log => "log",
            MomentumMethod::Simple => "simple",
            MomentumMethod::Shift => "shift",
        })
    }
}

impl FromStr for MomentumMethod {
    type Err = HumblError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "log" => Ok(MomentumMethod::Log),
            "simple" => Ok(MomentumMethod::Simple),
            "shift" => Ok(MomentumMethod::Shift),
            other => Err(HumblError::InvalidMethod {
                kind: "momentum method",
                value: other.to_string(),
                expected: "log, simple, shift",
            }),
        }
    }
}

/// Momentum for one (symbol, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumPoint {
    pub symbol: String,
    pub date: NaiveDate,
    pub close: f64,
    pub momentum: Option<f64>,
    /// The close `w` rows back; only reported by [`MomentumMethod::Shift`].
    pub shifted: Option<f64>,
    /// 1 when momentum is positive, 0 otherwise, null during the lookback.
    pub momentum_signal: Option<i8>,
}

/// Momentum of `bars` in any order. The lookback is the window's calendar-day
/// length, applied as a row shift within each symbol.
///
/// Bars are canonicalized first, the same way the channel does it: sorted by
/// (symbol, date), duplicates dropped, non-positive closes dropped.
pub fn calc_momentum(
    bars: &[PriceBar],
    window: &WindowSpec,
    method: MomentumMethod,
) -> Result<Vec<MomentumPoint>, HumblError> {
    let bars = canonicalize(bars.to_vec());
    let Some(anchor) = bars.iter().map(|b| b.date).max() else {
        return Ok(Vec::new());
    };
    let lookback = window.days(anchor, false);

    let mut out = Vec::with_capacity(bars.len());
    for run in symbol_runs(&bars) {
        let series = &bars[run];
        for (i, bar) in series.iter().enumerate() {
            let prev = i.checked_sub(lookback).map(|j| series[j].close);
            let momentum = prev.map(|p| match method {
                MomentumMethod::Log => bar.close.ln() - p.ln(),
                MomentumMethod::Simple => (bar.close - p) / p,
                MomentumMethod::Shift => bar.close - p,
            });
            out.push(MomentumPoint {
                symbol: bar.symbol.clone(),
                date: bar.date,
                close: bar.close,
                momentum,
                shifted: if method == MomentumMethod::Shift { prev } else { None },
                momentum_signal: momentum.map(|m| i8::from(m > 0.0)),
            });
        }
    }
    debug!(%method, lookback, rows = out.len(), "momentum computed");
    Ok(out)
}

/// Left-join lookup of momentum signals by (symbol, date).
pub fn signal_index(points: &[MomentumPoint]) -> HashMap<(&str, NaiveDate), Option<i8>> {
    points
        .iter()
        .map(|p| ((p.symbol.as_str(), p.date), p.momentum_signal))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars(closes: &[f64]) -> Vec<PriceBar> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar::close_only("M", base + chrono::Duration::days(i as i64), c))
            .collect()
    }

    #[test]
    fn log_and_simple_momentum() {
        let b = bars(&[100.0, 105.0, 110.0, 99.0]);
        let w = WindowSpec::parse("2d").unwrap();

        let log = calc_momentum(&b, &w, MomentumMethod::Log).unwrap();
        assert_eq!(log[1].momentum, None);
        assert_eq!(log[1].momentum_signal, None);
        assert!((log[2].momentum.unwrap() - (1.1f64).ln()).abs() < 1e-12);
        assert_eq!(log[2].momentum_signal, Some(1));
        assert_eq!(log[3].momentum_signal, Some(0));

        let simple = calc_momentum(&b, &w, MomentumMethod::Simple).unwrap();
        assert!((simple[2].momentum.unwrap() - 0.1).abs() < 1e-12);
        assert!(simple[2].shifted.is_none());
    }

    #[test]
    fn shift_reports_shifted_close() {
        let b = bars(&[100.0, 105.0, 100.0]);
        let out = calc_momentum(&b, &WindowSpec::parse("2d").unwrap(), MomentumMethod::Shift).unwrap();
        assert_eq!(out[2].shifted, Some(100.0));
        // equal close is not positive momentum
        assert_eq!(out[2].momentum_signal, Some(0));
    }

    #[test]
    fn lookback_restarts_per_symbol() {
        let mut b = bars(&[1.0, 2.0, 3.0]);
        b.extend(bars(&[3.0, 2.0, 1.0]).into_iter().map(|mut bar| {
            bar.symbol = "N".into();
            bar
        }));
        let out = calc_momentum(&b, &WindowSpec::parse("1d").unwrap(), MomentumMethod::Log).unwrap();
        assert_eq!(out[3].momentum, None);
        assert_eq!(out[4].momentum_signal, Some(0));
        assert_eq!(out[2].momentum_signal, Some(1));
    }

    #[test]
    fn unsorted_input_never_looks_ahead() {
        let sorted = bars(&[100.0, 105.0, 110.0, 99.0]);
        let mut reversed = sorted.clone();
        reversed.reverse();
        let w = WindowSpec::parse("2d").unwrap();

        let expected = calc_momentum(&sorted, &w, MomentumMethod::Shift).unwrap();
        let out = calc_momentum(&reversed, &w, MomentumMethod::Shift).unwrap();
        assert_eq!(out, expected);
        assert_eq!(out[0].date, sorted[0].date);
        assert_eq!(out[0].momentum, None);
        assert_eq!(out[3].shifted, Some(105.0));
    }

    #[test]
    fn non_positive_closes_are_dropped() {
        let b = bars(&[100.0, 0.0, 110.0, 120.0]);
        let out = calc_momentum(&b, &WindowSpec::parse("1d").unwrap(), MomentumMethod::Log).unwrap();
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|p| p.close > 0.0));
        // the row after the gap compares against the last valid close
        assert!((out[1].momentum.unwrap() - (1.1f64).ln()).abs() < 1e-12);
    }

    #[test]
    fn unknown_method_is_rejected() {
        assert!("velocity".parse::<MomentumMethod>().is_err());
        assert_eq!("shift".parse::<MomentumMethod>().unwrap(), MomentumMethod::Shift);
    }

    #[test]
    fn signal_index_joins_by_symbol_and_date() {
        let b = bars(&[1.0, 2.0]);
        let out = calc_momentum(&b, &WindowSpec::parse("1d").unwrap(), MomentumMethod::Simple).unwrap();
        let idx = signal_index(&out);
        assert_eq!(idx[&("M", b[1].date)], Some(1));
        assert_eq!(idx[&("M", b[0].date)], None);
    }
}
