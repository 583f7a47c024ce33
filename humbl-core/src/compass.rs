//! humblCOMPASS: macro regime classification from CLI and CPI deltas.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::domain::{MacroObservation, Regime};
use crate::error::HumblError;
use crate::volatility::rolling::{rolling_mean, rolling_std};
use crate::window::WindowSpec;

/// Average gap, in days, at or above which a series is treated as quarterly.
pub const QUARTERLY_GAP_DAYS: f64 = 85.0;

/// Shortest z-score window, in months.
pub const MIN_Z_SCORE_MONTHS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompassConfig {
    /// Rolling z-score window; `None` skips z-scores.
    pub z_score_window: Option<WindowSpec>,
    /// Whether the caller's access tier permits z-scores.
    pub allow_z_score: bool,
}

/// One classified (country, month).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeLabel {
    pub date_month_start: NaiveDate,
    pub country: String,
    pub cpi: f64,
    pub cli: f64,
    pub cpi_3m_delta: Option<f64>,
    pub cli_3m_delta: Option<f64>,
    pub humbl_regime: Option<Regime>,
    pub cpi_zscore: Option<f64>,
    pub cli_zscore: Option<f64>,
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Delta lag in periods: 1 for quarterly data, 3 for monthly.
pub fn detect_lag(dates: &[NaiveDate]) -> usize {
    if dates.len() < 2 {
        return 3;
    }
    let span = (dates[dates.len() - 1] - dates[0]).num_days() as f64;
    let avg_gap = span / (dates.len() - 1) as f64;
    if avg_gap >= QUARTERLY_GAP_DAYS {
        1
    } else {
        3
    }
}

fn by_month(series: &[MacroObservation]) -> BTreeMap<(String, NaiveDate), f64> {
    let mut out = BTreeMap::new();
    for obs in series {
        out.entry((obs.country.clone(), month_start(obs.date)))
            .or_insert(obs.value);
    }
    out
}

fn z_scores(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let opt: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
    let means = rolling_mean(&opt, window);
    let stds = rolling_std(&opt, window);
    values
        .iter()
        .zip(means.iter().zip(&stds))
        .map(|(v, (m, s))| match (m, s) {
            (Some(m), Some(s)) if *s > 0.0 => Some((v - m) / s),
            _ => None,
        })
        .collect()
}

/// Resolved z-score window in months, honoring the capability flag.
fn z_score_months(cfg: &CompassConfig) -> Result<Option<u32>, HumblError> {
    let Some(window) = cfg.z_score_window else {
        return Ok(None);
    };
    if !cfg.allow_z_score {
        warn!(window = %window, "z-scores requested without permission, skipping");
        return Ok(None);
    }
    let months = window.months("z-score windows")?;
    if months < MIN_Z_SCORE_MONTHS {
        warn!(months, "z-score window below {MIN_Z_SCORE_MONTHS} months, clamping up");
        return Ok(Some(MIN_Z_SCORE_MONTHS));
    }
    Ok(Some(months))
}

/// Join CLI and CPI on (month start, country) and label every row.
///
/// Rows are sorted by (country, month). The first `lag` rows of each country
/// have no delta and stay unclassified.
pub fn classify_regime(
    cli: &[MacroObservation],
    cpi: &[MacroObservation],
    cfg: &CompassConfig,
) -> Result<Vec<RegimeLabel>, HumblError> {
    let z_months = z_score_months(cfg)?;
    let cli = by_month(cli);
    let cpi = by_month(cpi);

    let mut joined: BTreeMap<String, Vec<(NaiveDate, f64, f64)>> = BTreeMap::new();
    for ((country, month), cpi_value) in &cpi {
        if let Some(cli_value) = cli.get(&(country.clone(), *month)) {
            joined
                .entry(country.clone())
                .or_default()
                .push((*month, *cpi_value, *cli_value));
        }
    }

    let mut out = Vec::new();
    for (country, rows) in joined {
        let months: Vec<NaiveDate> = rows.iter().map(|r| r.0).collect();
        let lag = detect_lag(&months);
        let cpi_values: Vec<f64> = rows.iter().map(|r| r.1).collect();
        let cli_values: Vec<f64> = rows.iter().map(|r| r.2).collect();

        let (cpi_z, cli_z) = match z_months {
            Some(m) => {
                let window = if lag == 1 { ((m + 2) / 3).max(2) } else { m } as usize;
                (z_scores(&cpi_values, window), z_scores(&cli_values, window))
            }
            None => (vec![None; rows.len()], vec![None; rows.len()]),
        };

        for (i, &(month, cpi_value, cli_value)) in rows.iter().enumerate() {
            let delta = |values: &[f64]| i.checked_sub(lag).map(|j| values[i] - values[j]);
            let cpi_delta = delta(&cpi_values);
            let cli_delta = delta(&cli_values);
            out.push(RegimeLabel {
                date_month_start: month,
                country: country.clone(),
                cpi: cpi_value,
                cli: cli_value,
                cpi_3m_delta: cpi_delta,
                cli_3m_delta: cli_delta,
                humbl_regime: Regime::from_deltas(cpi_delta, cli_delta),
                cpi_zscore: cpi_z[i],
                cli_zscore: cli_z[i],
            });
        }
    }
    info!(
        rows = out.len(),
        classified = out.iter().filter(|r| r.humbl_regime.is_some()).count(),
        "humbl compass classified"
    );
    Ok(out)
}
