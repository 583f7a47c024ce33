//! Regime instances: maximal runs of consecutive days with one regime.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::ops::Range;

use humbl_core::Regime;

use super::drawdown::{drawdown_stats, DrawdownStats};
use super::DailyRegime;
use crate::config::BacktestConfig;
use crate::metrics::{annualized_return_pct, mean_present, sharpe_ratio, total_return_pct, win_rate_pct};

/// Number every row with its per-symbol instance id.
///
/// Rows must be sorted by (symbol, date). Ids start at 1 for each symbol and
/// step up whenever the regime differs from the previous row, transitions
/// to or from an unclassified day included.
pub fn label_instances(daily: &mut [DailyRegime]) {
    let mut id = 0u32;
    for i in 0..daily.len() {
        let same_symbol = i > 0 && daily[i - 1].symbol == daily[i].symbol;
        if !same_symbol {
            id = 1;
        } else if daily[i - 1].humbl_regime != daily[i].humbl_regime {
            id += 1;
        }
        daily[i].regime_instance_id = id;
    }
}

/// Aggregates of one regime instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeInstance {
    pub symbol: String,
    pub humbl_regime: Option<Regime>,
    pub regime_instance_id: u32,
    /// Rows of the daily table covered by this instance.
    pub rows: Range<usize>,
    pub days: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_price: f64,
    pub end_price: f64,
    /// Date of the symbol's next trading row after the instance. This skips
    /// weekends and gaps, so it is not the next calendar day.
    pub next_date: Option<NaiveDate>,
    /// Close on `next_date`.
    pub next_price: Option<f64>,
    pub total_return_pct: Option<f64>,
    pub ann_return_pct: Option<f64>,
    pub volatility_pct: Option<f64>,
    pub win_rate_pct: Option<f64>,
    pub sharpe_ratio: Option<f64>,
    pub win_days: usize,
    pub loss_days: usize,
    pub drawdown: DrawdownStats,
}

impl RegimeInstance {
    fn from_rows(daily: &[DailyRegime], rows: Range<usize>, cfg: &BacktestConfig) -> Self {
        let run = &daily[rows.clone()];
        let first = &run[0];
        let last = &run[run.len() - 1];
        let next = daily
            .get(rows.end)
            .filter(|row| row.symbol == first.symbol);

        let returns: Vec<Option<f64>> = run.iter().map(|r| r.daily_return).collect();
        let dates: Vec<NaiveDate> = run.iter().map(|r| r.date).collect();
        let closes: Vec<f64> = run.iter().map(|r| r.close).collect();

        let total_return_pct = total_return_pct(first.close, last.close);
        let ann_return_pct = annualized_return_pct(first.close, last.close, run.len());
        let volatility_pct = mean_present(run.iter().map(|r| r.volatility_pct));
        let sharpe = match (ann_return_pct, volatility_pct) {
            (Some(ann), Some(vol)) => sharpe_ratio(ann, cfg.risk_free_rate, vol),
            _ => None,
        };

        Self {
            symbol: first.symbol.clone(),
            humbl_regime: first.humbl_regime,
            regime_instance_id: first.regime_instance_id,
            days: run.len(),
            start_date: first.date,
            end_date: last.date,
            start_price: first.close,
            end_price: last.close,
            next_date: next.map(|r| r.date),
            next_price: next.map(|r| r.close),
            total_return_pct,
            ann_return_pct,
            volatility_pct,
            win_rate_pct: win_rate_pct(&returns),
            sharpe_ratio: sharpe,
            win_days: returns.iter().flatten().filter(|r| **r > 0.0).count(),
            loss_days: returns.iter().flatten().filter(|r| **r < 0.0).count(),
            drawdown: drawdown_stats(&dates, &closes),
            rows,
        }
    }
}

/// Split labelled daily rows into instances, in row order.
///
/// The instances partition the rows: every row belongs to exactly one.
pub fn detect_instances(daily: &[DailyRegime], cfg: &BacktestConfig) -> Vec<RegimeInstance> {
    let mut out = Vec::new();
    let mut start = 0;
    for i in 1..=daily.len() {
        let boundary = i == daily.len()
            || daily[i].symbol != daily[start].symbol
            || daily[i].regime_instance_id != daily[start].regime_instance_id;
        if boundary && start < i {
            out.push(RegimeInstance::from_rows(daily, start..i, cfg));
            start = i;
        }
    }
    out
}
