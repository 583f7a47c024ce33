//! Per (symbol, regime) summary of instance metrics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use humbl_core::Regime;

use super::growth::InvestmentGrowth;
use super::RegimeInstance;
use crate::config::BacktestConfig;
use crate::metrics::{mean_f64, mean_present};

/// One summary row. Averages are taken over instances, not days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub symbol: String,
    pub humbl_regime: Regime,
    pub avg_total_return_pct: Option<f64>,
    pub avg_ann_return_pct: Option<f64>,
    pub avg_win_rate_pct: Option<f64>,
    pub avg_volatility: Option<f64>,
    pub avg_sharpe_ratio: Option<f64>,
    pub avg_days_in_regime: f64,
    pub instance_count: usize,
    pub cumulative_investment_growth: f64,
    pub investment_growth_pct: f64,
    pub total_ending_investment_value: f64,
    pub total_win_count: usize,
    pub total_loss_count: usize,
    pub avg_win_count_per_instance: f64,
    pub avg_loss_count_per_instance: f64,
    pub min_return_pct: Option<f64>,
    pub max_return_pct: Option<f64>,
    pub max_win_days: usize,
    pub min_win_days: usize,
    pub max_loss_days: usize,
    pub min_loss_days: usize,
    /// Worst drawdown over all instances (zero or negative).
    pub max_drawdown_pct: f64,
    /// Mean of the episode troughs; zero when no episode occurred.
    pub avg_drawdown_pct: f64,
    pub avg_recovery_days: Option<f64>,
    pub max_recovery_days: Option<i64>,
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

fn summarize_group(
    symbol: String,
    regime: Regime,
    runs: &[&RegimeInstance],
    growth: Option<&InvestmentGrowth>,
    initial: f64,
) -> BacktestSummary {
    let n = runs.len() as f64;
    let returns = min_max(runs.iter().filter_map(|r| r.total_return_pct));
    let win_days = runs.iter().map(|r| r.win_days);
    let loss_days = runs.iter().map(|r| r.loss_days);
    let total_win_count: usize = win_days.clone().sum();
    let total_loss_count: usize = loss_days.clone().sum();

    let troughs: Vec<f64> = runs
        .iter()
        .flat_map(|r| r.drawdown.episodes.iter().map(|e| e.max_drawdown_pct))
        .collect();
    let recoveries: Vec<i64> = runs
        .iter()
        .flat_map(|r| r.drawdown.episodes.iter().filter_map(|e| e.recovery_days))
        .collect();
    let recovery_f64: Vec<f64> = recoveries.iter().map(|d| *d as f64).collect();

    let growth = growth.copied().unwrap_or(InvestmentGrowth {
        final_value: initial,
        growth: 0.0,
        growth_pct: 0.0,
    });

    BacktestSummary {
        symbol,
        humbl_regime: regime,
        avg_total_return_pct: mean_present(runs.iter().map(|r| r.total_return_pct)),
        avg_ann_return_pct: mean_present(runs.iter().map(|r| r.ann_return_pct)),
        avg_win_rate_pct: mean_present(runs.iter().map(|r| r.win_rate_pct)),
        avg_volatility: mean_present(runs.iter().map(|r| r.volatility_pct)),
        avg_sharpe_ratio: mean_present(runs.iter().map(|r| r.sharpe_ratio)),
        avg_days_in_regime: runs.iter().map(|r| r.days).sum::<usize>() as f64 / n,
        instance_count: runs.len(),
        cumulative_investment_growth: growth.growth,
        investment_growth_pct: growth.growth_pct,
        total_ending_investment_value: growth.final_value,
        total_win_count,
        total_loss_count,
        avg_win_count_per_instance: total_win_count as f64 / n,
        avg_loss_count_per_instance: total_loss_count as f64 / n,
        min_return_pct: returns.map(|(lo, _)| lo),
        max_return_pct: returns.map(|(_, hi)| hi),
        max_win_days: win_days.clone().max().unwrap_or(0),
        min_win_days: win_days.min().unwrap_or(0),
        max_loss_days: loss_days.clone().max().unwrap_or(0),
        min_loss_days: loss_days.min().unwrap_or(0),
        max_drawdown_pct: runs
            .iter()
            .map(|r| r.drawdown.max_drawdown_pct)
            .fold(0.0, f64::min),
        avg_drawdown_pct: mean_f64(&troughs).unwrap_or(0.0),
        avg_recovery_days: mean_f64(&recovery_f64),
        max_recovery_days: recoveries.iter().copied().max(),
    }
}

/// Summaries sorted by symbol, then regime display order.
///
/// Unclassified instances are left out. A regime whose instances average
/// fewer than `min_regime_days` days is dropped entirely.
pub fn summarize(
    instances: &[RegimeInstance],
    growth: &BTreeMap<(String, Regime), InvestmentGrowth>,
    cfg: &BacktestConfig,
) -> Vec<BacktestSummary> {
    let mut groups: BTreeMap<(String, Regime), Vec<&RegimeInstance>> = BTreeMap::new();
    for inst in instances {
        if let Some(regime) = inst.humbl_regime {
            groups
                .entry((inst.symbol.clone(), regime))
                .or_default()
                .push(inst);
        }
    }

    groups
        .into_iter()
        .map(|((symbol, regime), runs)| {
            let g = growth.get(&(symbol.clone(), regime));
            summarize_group(symbol, regime, &runs, g, cfg.initial_investment)
        })
        .filter(|s| s.avg_days_in_regime >= f64::from(cfg.min_regime_days))
        .collect()
}
