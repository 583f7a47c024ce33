//! The seven realized-volatility estimators, each over one symbol's bars
//! sorted by date. Outputs are annualized percentages aligned with the bars.
//!
//! Range-based estimators (Parkinson, Garman-Klass, Rogers-Satchell,
//! Yang-Zhang) expect `open/high/low` to be present; the caller checks this
//! before dispatching here.

use std::f64::consts::LN_2;

use super::rolling::{rolling_mean, rolling_std_by_date, rolling_sum};
use crate::domain::PriceBar;

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

fn log_ratio(num: Option<f64>, den: Option<f64>) -> Option<f64> {
    finite(Some((num? / den?).ln()))
}

/// One-step close-to-close log returns; the first bar has none.
pub fn close_log_returns(bars: &[PriceBar]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(bars.len());
    out.push(None);
    for pair in bars.windows(2) {
        out.push(log_ratio(Some(pair[1].close), Some(pair[0].close)));
    }
    out.truncate(bars.len());
    out
}

/// `sqrt(periods * mean(x)) * 100` over a rolling row window.
fn annualized_rolling(values: &[Option<f64>], window: usize, periods: f64) -> Vec<Option<f64>> {
    rolling_mean(values, window)
        .into_iter()
        .map(|m| finite(m.map(|m| (periods * m).sqrt() * 100.0)))
        .collect()
}

/// Close-to-close: rolling std of log returns over a calendar window.
pub fn std(bars: &[PriceBar], days: usize, periods: f64) -> Vec<Option<f64>> {
    let dates: Vec<_> = bars.iter().map(|b| b.date).collect();
    rolling_std_by_date(&dates, &close_log_returns(bars), days as i64, 2)
        .into_iter()
        .map(|s| finite(s.map(|s| s * periods.sqrt() * 100.0)))
        .collect()
}

/// Parkinson: high/low range, `(1 / 4ln2) * ln(h/l)^2`.
pub fn parkinson(bars: &[PriceBar], days: usize, periods: f64) -> Vec<Option<f64>> {
    let terms: Vec<Option<f64>> = bars
        .iter()
        .map(|b| log_ratio(b.high, b.low).map(|hl| hl.powi(2) / (4.0 * LN_2)))
        .collect();
    annualized_rolling(&terms, days, periods)
}

/// Garman-Klass: `0.5 ln(h/l)^2 - (2ln2 - 1) ln(c/o)^2`.
pub fn garman_klass(bars: &[PriceBar], days: usize, periods: f64) -> Vec<Option<f64>> {
    let terms: Vec<Option<f64>> = bars
        .iter()
        .map(|b| {
            let hl = log_ratio(b.high, b.low)?;
            let co = log_ratio(Some(b.close), b.open)?;
            Some(0.5 * hl.powi(2) - (2.0 * LN_2 - 1.0) * co.powi(2))
        })
        .collect();
    annualized_rolling(&terms, days, periods)
}

/// Hodges-Tompkins: close-to-close std scaled by the small-sample bias
/// correction `1 / (1 - h/n + (h^2 - 1) / (3n^2))`, n = count - h + 1.
pub fn hodges_tompkins(bars: &[PriceBar], days: usize, periods: f64) -> Vec<Option<f64>> {
    let h = days as f64;
    let n = bars.len() as f64 - h + 1.0;
    let adj = if n >= 1.0 {
        finite(Some(1.0 / (1.0 - h / n + (h * h - 1.0) / (3.0 * n * n))))
    } else {
        None
    };
    std(bars, days, periods)
        .into_iter()
        .map(|v| finite(Some(v? * adj?)))
        .collect()
}

fn rogers_satchell_term(bar: &PriceBar) -> Option<f64> {
    let ho = log_ratio(bar.high, bar.open)?;
    let lo = log_ratio(bar.low, bar.open)?;
    let co = log_ratio(Some(bar.close), bar.open)?;
    Some(ho * (ho - co) + lo * (lo - co))
}

/// Rogers-Satchell: drift-robust `ln(h/o)(ln(h/o) - ln(c/o)) + ln(l/o)(ln(l/o) - ln(c/o))`.
pub fn rogers_satchell(bars: &[PriceBar], days: usize, periods: f64) -> Vec<Option<f64>> {
    let terms: Vec<Option<f64>> = bars.iter().map(rogers_satchell_term).collect();
    annualized_rolling(&terms, days, periods)
}

/// Yang-Zhang: overnight variance plus a `k`-weighted blend of close-to-close
/// and Rogers-Satchell variance, `k = 0.34 / (1.34 + (w+1)/(w-1))`.
pub fn yang_zhang(bars: &[PriceBar], days: usize, periods: f64) -> Vec<Option<f64>> {
    if days < 2 {
        return vec![None; bars.len()];
    }
    let w = days as f64;
    let k = 0.34 / (1.34 + (w + 1.0) / (w - 1.0));

    let mut overnight_sq = vec![None; bars.len()];
    let mut close_sq = vec![None; bars.len()];
    for i in 1..bars.len() {
        let prev = Some(bars[i - 1].close);
        overnight_sq[i] = log_ratio(bars[i].open, prev).map(|x| x * x);
        close_sq[i] = log_ratio(Some(bars[i].close), prev).map(|x| x * x);
    }
    let rs: Vec<Option<f64>> = bars.iter().map(rogers_satchell_term).collect();

    let scale = 1.0 / (w - 1.0);
    let open_vol = rolling_sum(&overnight_sq, days);
    let close_vol = rolling_sum(&close_sq, days);
    let window_rs = rolling_sum(&rs, days);

    (0..bars.len())
        .map(|i| {
            let var = scale * (open_vol[i]? + k * close_vol[i]? + (1.0 - k) * window_rs[i]?);
            finite(Some(var.sqrt() * periods.sqrt() * 100.0))
        })
        .collect()
}

/// Squared returns: rolling mean of squared percentage log returns.
pub fn squared_returns(bars: &[PriceBar], days: usize) -> Vec<Option<f64>> {
    let sq: Vec<Option<f64>> = close_log_returns(bars)
        .into_iter()
        .map(|r| r.map(|r| (r * 100.0).powi(2)))
        .collect();
    rolling_mean(&sq, days)
}
