//! Performance metrics over price paths.
//!
//! Every metric is a pure function: prices or returns in, value out. Ratios
//! with a zero, non-finite or vanishing denominator return `None` rather
//! than NaN or infinity.

use humbl_core::volatility::rolling::rolling_std;

/// Trading days per year for annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Denominators below this are treated as zero.
pub const MIN_DENOMINATOR: f64 = 1e-12;

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return in percent: `(end / start - 1) * 100`.
pub fn total_return_pct(start: f64, end: f64) -> Option<f64> {
    if start.abs() < MIN_DENOMINATOR {
        return None;
    }
    finite((end / start - 1.0) * 100.0)
}

/// Annualized return in percent: `((end / start)^(252 / days) - 1) * 100`.
pub fn annualized_return_pct(start: f64, end: f64, days: usize) -> Option<f64> {
    if days == 0 || start <= 0.0 || end < 0.0 {
        return None;
    }
    finite(((end / start).powf(TRADING_DAYS_PER_YEAR / days as f64) - 1.0) * 100.0)
}

/// Percentage of present returns that are strictly positive.
pub fn win_rate_pct(returns: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = returns.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    let wins = present.iter().filter(|r| **r > 0.0).count();
    Some(wins as f64 / present.len() as f64 * 100.0)
}

/// Sharpe ratio from annualized percentages: `(ann/100 - rf) / (vol/100)`.
pub fn sharpe_ratio(ann_return_pct: f64, risk_free_rate: f64, volatility_pct: f64) -> Option<f64> {
    if !(volatility_pct.abs() > MIN_DENOMINATOR) {
        return None;
    }
    finite((ann_return_pct / 100.0 - risk_free_rate) / (volatility_pct / 100.0))
}

/// Drawdown from the running peak in percent (zero or negative), per row.
pub fn drawdown_pct(closes: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    closes
        .iter()
        .map(|&c| {
            peak = peak.max(c);
            if peak > 0.0 {
                (c / peak - 1.0) * 100.0
            } else {
                0.0
            }
        })
        .collect()
}

// ─── Per-day series ─────────────────────────────────────────────────

/// Simple returns; the first row has none.
pub fn daily_returns(closes: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(closes.len());
    out.extend(closes.first().map(|_| None));
    out.extend(
        closes
            .windows(2)
            .map(|w| (w[0].abs() > MIN_DENOMINATOR).then(|| w[1] / w[0] - 1.0)),
    );
    out
}

/// Log returns; the first row has none.
pub fn log_returns(closes: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(closes.len());
    out.extend(closes.first().map(|_| None));
    out.extend(
        closes
            .windows(2)
            .map(|w| finite((w[1] / w[0]).ln())),
    );
    out
}

/// Rolling std of log returns over `window` rows, annualized, in percent.
pub fn rolling_volatility_pct(log_returns: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling_std(log_returns, window)
        .into_iter()
        .map(|s| s.map(|s| s * TRADING_DAYS_PER_YEAR.sqrt() * 100.0))
        .collect()
}

// ─── Helpers ────────────────────────────────────────────────────────

pub fn mean_f64(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Mean of the present values.
pub fn mean_present(values: impl IntoIterator<Item = Option<f64>>) -> Option<f64> {
    let present: Vec<f64> = values.into_iter().flatten().collect();
    mean_f64(&present)
}
