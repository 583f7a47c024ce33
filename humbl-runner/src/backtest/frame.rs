//! Backtest results as polars frames.

use polars::prelude::*;

use humbl_core::data::date_column;
use humbl_core::HumblError;

use super::{BacktestSummary, DailyRegime, RegimeDateRange};

fn f64_column(rows: &[BacktestSummary], name: &str, get: impl Fn(&BacktestSummary) -> f64) -> Column {
    Column::new(name.into(), rows.iter().map(get).collect::<Vec<_>>())
}

fn opt_column(
    rows: &[BacktestSummary],
    name: &str,
    get: impl Fn(&BacktestSummary) -> Option<f64>,
) -> Column {
    Column::new(name.into(), rows.iter().map(get).collect::<Vec<_>>())
}

fn count_column(rows: &[BacktestSummary], name: &str, get: impl Fn(&BacktestSummary) -> usize) -> Column {
    Column::new(
        name.into(),
        rows.iter().map(|r| get(r) as u64).collect::<Vec<_>>(),
    )
}

/// One row per (symbol, regime) with every summary statistic.
pub fn summary_to_frame(rows: &[BacktestSummary]) -> Result<DataFrame, HumblError> {
    Ok(DataFrame::new(vec![
        Column::new(
            "symbol".into(),
            rows.iter().map(|r| r.symbol.as_str()).collect::<Vec<_>>(),
        ),
        Column::new(
            "humbl_regime".into(),
            rows.iter().map(|r| r.humbl_regime.label()).collect::<Vec<_>>(),
        ),
        opt_column(rows, "avg_total_return_pct", |r| r.avg_total_return_pct),
        opt_column(rows, "avg_ann_return_pct", |r| r.avg_ann_return_pct),
        opt_column(rows, "avg_win_rate_pct", |r| r.avg_win_rate_pct),
        opt_column(rows, "avg_volatility", |r| r.avg_volatility),
        opt_column(rows, "avg_sharpe_ratio", |r| r.avg_sharpe_ratio),
        f64_column(rows, "avg_days_in_regime", |r| r.avg_days_in_regime),
        count_column(rows, "instance_count", |r| r.instance_count),
        f64_column(rows, "cumulative_investment_growth", |r| r.cumulative_investment_growth),
        f64_column(rows, "investment_growth_pct", |r| r.investment_growth_pct),
        f64_column(rows, "total_ending_investment_value", |r| r.total_ending_investment_value),
        count_column(rows, "total_win_count", |r| r.total_win_count),
        count_column(rows, "total_loss_count", |r| r.total_loss_count),
        f64_column(rows, "avg_win_count_per_instance", |r| r.avg_win_count_per_instance),
        f64_column(rows, "avg_loss_count_per_instance", |r| r.avg_loss_count_per_instance),
        opt_column(rows, "min_return_pct", |r| r.min_return_pct),
        opt_column(rows, "max_return_pct", |r| r.max_return_pct),
        count_column(rows, "max_win_days", |r| r.max_win_days),
        count_column(rows, "min_win_days", |r| r.min_win_days),
        count_column(rows, "max_loss_days", |r| r.max_loss_days),
        count_column(rows, "min_loss_days", |r| r.min_loss_days),
        f64_column(rows, "max_drawdown_pct", |r| r.max_drawdown_pct),
        f64_column(rows, "avg_drawdown_pct", |r| r.avg_drawdown_pct),
        opt_column(rows, "avg_recovery_days", |r| r.avg_recovery_days),
        Column::new(
            "max_recovery_days".into(),
            rows.iter().map(|r| r.max_recovery_days).collect::<Vec<_>>(),
        ),
    ])?)
}

pub fn date_ranges_to_frame(rows: &[RegimeDateRange]) -> Result<DataFrame, HumblError> {
    Ok(DataFrame::new(vec![
        Column::new(
            "symbol".into(),
            rows.iter().map(|r| r.symbol.as_str()).collect::<Vec<_>>(),
        ),
        Column::new(
            "humbl_regime".into(),
            rows.iter().map(|r| r.humbl_regime.label()).collect::<Vec<_>>(),
        ),
        Column::new(
            "regime_instance_id".into(),
            rows.iter().map(|r| r.regime_instance_id).collect::<Vec<_>>(),
        ),
        date_column("start_date", rows.iter().map(|r| r.start_date))?,
        date_column("end_date", rows.iter().map(|r| r.end_date))?,
    ])?)
}

/// The daily assignment table; unclassified days have a null regime.
pub fn daily_regimes_to_frame(rows: &[DailyRegime]) -> Result<DataFrame, HumblError> {
    Ok(DataFrame::new(vec![
        date_column("date", rows.iter().map(|r| r.date))?,
        Column::new(
            "symbol".into(),
            rows.iter().map(|r| r.symbol.as_str()).collect::<Vec<_>>(),
        ),
        Column::new("close".into(), rows.iter().map(|r| r.close).collect::<Vec<_>>()),
        Column::new(
            "humbl_regime".into(),
            rows.iter()
                .map(|r| r.humbl_regime.map(|g| g.label()))
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "regime_instance_id".into(),
            rows.iter().map(|r| r.regime_instance_id).collect::<Vec<_>>(),
        ),
        Column::new(
            "daily_return".into(),
            rows.iter().map(|r| r.daily_return).collect::<Vec<_>>(),
        ),
        Column::new(
            "log_return".into(),
            rows.iter().map(|r| r.log_return).collect::<Vec<_>>(),
        ),
        Column::new(
            "volatility_pct".into(),
            rows.iter().map(|r| r.volatility_pct).collect::<Vec<_>>(),
        ),
    ])?)
}
