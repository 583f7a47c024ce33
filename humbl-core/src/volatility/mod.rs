//! Realized volatility: estimator selection, column naming and dispatch.

pub mod estimators;
pub mod rolling;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use tracing::debug;

use crate::domain::PriceBar;
use crate::error::HumblError;
use crate::window::{WindowSpec, WindowUnit};

/// Trading periods per year used for annualization.
pub const TRADING_PERIODS: f64 = 252.0;

/// Extra windows averaged in when a grouped-mean volatility is requested.
pub const GROUPED_MEAN_WINDOWS: [WindowSpec; 3] = [
    WindowSpec::new(5, WindowUnit::Day),
    WindowSpec::new(10, WindowUnit::Day),
    WindowSpec::new(21, WindowUnit::Day),
];

/// Realized-volatility estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Estimator {
    Std,
    Parkinson,
    #[serde(alias = "gk")]
    GarmanKlass,
    #[serde(alias = "ht")]
    HodgesTompkins,
    #[serde(alias = "rs")]
    RogersSatchell,
    #[serde(alias = "yz")]
    YangZhang,
    #[serde(alias = "sq")]
    SquaredReturns,
}

impl Estimator {
    pub const ALL: [Estimator; 7] = [
        Estimator::Std,
        Estimator::Parkinson,
        Estimator::GarmanKlass,
        Estimator::HodgesTompkins,
        Estimator::RogersSatchell,
        Estimator::YangZhang,
        Estimator::SquaredReturns,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Estimator::Std => "std",
            Estimator::Parkinson => "parkinson",
            Estimator::GarmanKlass => "garman_klass",
            Estimator::HodgesTompkins => "hodges_tompkins",
            Estimator::RogersSatchell => "rogers_satchell",
            Estimator::YangZhang => "yang_zhang",
            Estimator::SquaredReturns => "squared_returns",
        }
    }

    /// Prefix of the output column name.
    pub fn prefix(&self) -> &'static str {
        match self {
            Estimator::Std => "std",
            Estimator::Parkinson => "parkinson",
            Estimator::GarmanKlass => "gk",
            Estimator::HodgesTompkins => "ht",
            Estimator::RogersSatchell => "rs",
            Estimator::YangZhang => "yz",
            Estimator::SquaredReturns => "sq",
        }
    }

    /// Input columns beyond `date` and `close`.
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            Estimator::Std | Estimator::HodgesTompkins | Estimator::SquaredReturns => &[],
            Estimator::Parkinson => &["high", "low"],
            Estimator::GarmanKlass | Estimator::RogersSatchell | Estimator::YangZhang => {
                &["open", "high", "low"]
            }
        }
    }

    /// `{prefix}_volatility_pct_{days}D`
    pub fn column_name(&self, days: usize) -> String {
        format!("{}_volatility_pct_{days}D", self.prefix())
    }

    /// Fails with every required column that some bar lacks.
    pub fn check_inputs(&self, bars: &[PriceBar]) -> Result<(), HumblError> {
        let missing: Vec<&str> = self
            .required_columns()
            .iter()
            .copied()
            .filter(|col| {
                bars.iter().any(|b| match *col {
                    "open" => b.open.is_none(),
                    "high" => b.high.is_none(),
                    "low" => b.low.is_none(),
                    _ => false,
                })
            })
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(HumblError::missing(self.name(), missing))
        }
    }

    fn compute(&self, bars: &[PriceBar], days: usize, periods: f64) -> Vec<Option<f64>> {
        match self {
            Estimator::Std => estimators::std(bars, days, periods),
            Estimator::Parkinson => estimators::parkinson(bars, days, periods),
            Estimator::GarmanKlass => estimators::garman_klass(bars, days, periods),
            Estimator::HodgesTompkins => estimators::hodges_tompkins(bars, days, periods),
            Estimator::RogersSatchell => estimators::rogers_satchell(bars, days, periods),
            Estimator::YangZhang => estimators::yang_zhang(bars, days, periods),
            Estimator::SquaredReturns => estimators::squared_returns(bars, days),
        }
    }
}

impl fmt::Display for Estimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Estimator {
    type Err = HumblError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "std" => Ok(Estimator::Std),
            "parkinson" => Ok(Estimator::Parkinson),
            "garman_klass" | "gk" => Ok(Estimator::GarmanKlass),
            "hodges_tompkins" | "ht" => Ok(Estimator::HodgesTompkins),
            "rogers_satchell" | "rs" => Ok(Estimator::RogersSatchell),
            "yang_zhang" | "yz" => Ok(Estimator::YangZhang),
            "squared_returns" | "sq" => Ok(Estimator::SquaredReturns),
            other => Err(HumblError::InvalidMethod {
                kind: "rv_method",
                value: other.to_string(),
                expected: "std, parkinson, garman_klass|gk, hodges_tompkins|ht, \
                           rogers_satchell|rs, yang_zhang|yz, squared_returns|sq",
            }),
        }
    }
}

/// How window strings become day counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolatilityOptions {
    /// Resolve windows to approximate trading days instead of calendar days.
    pub trading_days: bool,
    pub trading_periods: f64,
}

impl Default for VolatilityOptions {
    fn default() -> Self {
        Self {
            trading_days: false,
            trading_periods: TRADING_PERIODS,
        }
    }
}

/// A named volatility column aligned with the input bars.
#[derive(Debug, Clone, PartialEq)]
pub struct VolatilitySeries {
    pub column: String,
    pub values: Vec<Option<f64>>,
}

impl VolatilitySeries {
    /// Indices of rows with a value, the rows kept when nulls are dropped.
    pub fn present_rows(&self) -> Vec<usize> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|_| i))
            .collect()
    }
}

/// Contiguous per-symbol ranges of bars sorted by (symbol, date).
pub fn symbol_runs(bars: &[PriceBar]) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start = 0;
    for i in 1..=bars.len() {
        if i == bars.len() || bars[i].symbol != bars[start].symbol {
            if start < i {
                runs.push(start..i);
            }
            start = i;
        }
    }
    runs
}

/// Realized volatility of `bars` (sorted by symbol, date) over `window`.
///
/// Leading rows of every symbol are null until the window has filled.
pub fn realized_volatility(
    bars: &[PriceBar],
    window: &WindowSpec,
    estimator: Estimator,
    opts: &VolatilityOptions,
) -> Result<VolatilitySeries, HumblError> {
    estimator.check_inputs(bars)?;
    let days = bars
        .iter()
        .map(|b| b.date)
        .max()
        .map_or(window.trading_days(), |anchor| window.days(anchor, opts.trading_days));

    let mut values = Vec::with_capacity(bars.len());
    for run in symbol_runs(bars) {
        values.extend(estimator.compute(&bars[run], days, opts.trading_periods));
    }
    debug!(
        estimator = estimator.name(),
        days,
        rows = bars.len(),
        valid = values.iter().filter(|v| v.is_some()).count(),
        "realized volatility computed"
    );
    Ok(VolatilitySeries {
        column: estimator.column_name(days),
        values,
    })
}

/// Row-wise mean of the estimator evaluated over `window` and each of
/// [`GROUPED_MEAN_WINDOWS`]. A row is null when any component is null.
pub fn grouped_mean_volatility(
    bars: &[PriceBar],
    window: &WindowSpec,
    estimator: Estimator,
    opts: &VolatilityOptions,
) -> Result<VolatilitySeries, HumblError> {
    let base = realized_volatility(bars, window, estimator, opts)?;
    let mut components = vec![base.values];
    for w in &GROUPED_MEAN_WINDOWS {
        components.push(realized_volatility(bars, w, estimator, opts)?.values);
    }
    let values = (0..bars.len())
        .map(|i| {
            let row: Option<Vec<f64>> = components.iter().map(|c| c[i]).collect();
            row.map(|r| r.iter().sum::<f64>() / r.len() as f64)
        })
        .collect();
    Ok(VolatilitySeries {
        column: format!("{}_grouped_mean", base.column),
        values,
    })
}
