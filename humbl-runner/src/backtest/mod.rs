//! Regime backtest: how each symbol performed while each macro regime held.
//!
//! Monthly regime labels are forward-filled onto daily closes, consecutive
//! days sharing a regime form an instance, and instance metrics are rolled
//! up per (symbol, regime).

pub mod assign;
pub mod drawdown;
pub mod frame;
pub mod growth;
pub mod instances;
pub mod summary;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use humbl_core::compass::RegimeLabel;
use humbl_core::data::canonicalize;
use humbl_core::volatility::symbol_runs;
use humbl_core::{HumblError, PriceBar, Regime};

use crate::config::BacktestConfig;
use crate::error::ToolboxError;
use crate::metrics::{daily_returns, log_returns, rolling_volatility_pct};

pub use assign::{assign_daily, RegimeCalendar};
pub use drawdown::{drawdown_stats, DrawdownEpisode, DrawdownStats};
pub use frame::{daily_regimes_to_frame, date_ranges_to_frame, summary_to_frame};
pub use growth::{compound, regime_growth, InvestmentGrowth};
pub use instances::{detect_instances, label_instances, RegimeInstance};
pub use summary::{summarize, BacktestSummary};

/// One trading day of one symbol with its regime and per-day metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRegime {
    pub symbol: String,
    pub date: NaiveDate,
    pub close: f64,
    /// `None` before the first labelled month or for unclassified months.
    pub humbl_regime: Option<Regime>,
    pub regime_instance_id: u32,
    pub daily_return: Option<f64>,
    pub log_return: Option<f64>,
    /// Annualized rolling volatility of log returns, in percent.
    pub volatility_pct: Option<f64>,
}

/// Date span of one classified instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeDateRange {
    pub symbol: String,
    pub humbl_regime: Regime,
    pub regime_instance_id: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestOutput {
    pub summary: Vec<BacktestSummary>,
    pub date_ranges: Vec<RegimeDateRange>,
    pub daily: Vec<DailyRegime>,
    pub instances: Vec<RegimeInstance>,
}

/// Fill per-day returns and rolling volatility, one symbol at a time.
fn fill_daily_metrics(daily: &mut [DailyRegime], bars: &[PriceBar], vol_days: usize) {
    for run in symbol_runs(bars) {
        let closes: Vec<f64> = daily[run.clone()].iter().map(|r| r.close).collect();
        let simple = daily_returns(&closes);
        let log = log_returns(&closes);
        let vol = rolling_volatility_pct(&log, vol_days);
        for (k, row) in daily[run].iter_mut().enumerate() {
            row.daily_return = simple[k];
            row.log_return = log[k];
            row.volatility_pct = vol[k];
        }
    }
}

/// Run the regime backtest of `prices` against one country's `regimes`.
pub fn run_backtest(
    prices: &[PriceBar],
    regimes: &[RegimeLabel],
    cfg: &BacktestConfig,
) -> Result<BacktestOutput, ToolboxError> {
    cfg.validate()?;
    let bars = canonicalize(prices.to_vec());
    let calendar = RegimeCalendar::from_labels(regimes)?;
    if bars.is_empty() || calendar.is_empty() {
        return Err(HumblError::InsufficientData(format!(
            "backtest needs prices and regime labels, got {} bars and {} labels",
            bars.len(),
            regimes.len()
        ))
        .into());
    }
    info!(
        bars = bars.len(),
        labels = regimes.len(),
        vol_window = %cfg.vol_window,
        "running regime backtest"
    );

    let mut daily = assign_daily(&bars, &calendar);
    label_instances(&mut daily);
    fill_daily_metrics(&mut daily, &bars, cfg.vol_window.trading_days());

    let instances = detect_instances(&daily, cfg);
    debug!(instances = instances.len(), "regime instances detected");

    let growth = regime_growth(&instances, cfg.initial_investment);
    let summary = summarize(&instances, &growth, cfg);
    let date_ranges = instances
        .iter()
        .filter_map(|inst| {
            inst.humbl_regime.map(|regime| RegimeDateRange {
                symbol: inst.symbol.clone(),
                humbl_regime: regime,
                regime_instance_id: inst.regime_instance_id,
                start_date: inst.start_date,
                end_date: inst.end_date,
            })
        })
        .collect();
    debug!(summary_rows = summary.len(), "backtest summary built");

    Ok(BacktestOutput {
        summary,
        date_ranges,
        daily,
        instances,
    })
}
