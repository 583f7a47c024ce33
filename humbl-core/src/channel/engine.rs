//! Point-in-time channel computation.

use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

use super::{ChannelConfig, ChannelResult, RsMethod};
use crate::bucket::{vol_buckets, vol_filter};
use crate::data::canonicalize;
use crate::domain::PriceBar;
use crate::error::HumblError;
use crate::transforms::{self, Extent, GroupKeys, Keyed};
use crate::volatility::{grouped_mean_volatility, realized_volatility, symbol_runs};
use crate::window::assign_window_index;

/// Below this the cumulative deviate has no spread and R/S is undefined.
const MIN_STD: f64 = 1e-12;

/// A bar positioned in its window, carrying the per-row pipeline columns.
#[derive(Debug, Clone)]
struct WindowedRow<'a> {
    bar: &'a PriceBar,
    /// Position in the input bars.
    pos: usize,
    window_index: u32,
}

impl Keyed for WindowedRow<'_> {
    fn symbol(&self) -> &str {
        &self.bar.symbol
    }

    fn window_index(&self) -> u32 {
        self.window_index
    }
}

/// Per-row statistics of the cumulative deviate series.
struct Deviates {
    detrended: Vec<f64>,
    extent: Vec<Extent>,
    rs: Vec<Option<f64>>,
}

/// Compute the channel for each symbol in `bars`, one row per symbol.
///
/// `quotes` supplies live prices by symbol when `cfg.live_price` is set;
/// symbols without a quote are dropped.
pub fn calc_humbl_channel(
    bars: &[PriceBar],
    cfg: &ChannelConfig,
    quotes: Option<&HashMap<String, f64>>,
) -> Result<Vec<ChannelResult>, HumblError> {
    cfg.validate(bars)?;
    let bars = canonicalize(bars.to_vec());
    info!(
        rows = bars.len(),
        window = %cfg.window,
        rv_method = %cfg.rv_method,
        rs_method = %cfg.rs_method,
        rv_adjustment = cfg.rv_adjustment,
        "computing humbl channel"
    );
    channel_sorted(&bars, cfg, quotes.filter(|_| cfg.live_price))
}

/// Channel over bars already canonical (sorted by symbol, date, positive closes).
pub(crate) fn channel_sorted(
    bars: &[PriceBar],
    cfg: &ChannelConfig,
    quotes: Option<&HashMap<String, f64>>,
) -> Result<Vec<ChannelResult>, HumblError> {
    if bars.is_empty() {
        return Ok(Vec::new());
    }

    // Steps 1-2: window index, log returns; the first bar of each symbol has no return.
    let windows = assign_window_index(bars, &cfg.window)?;
    let indexed: Vec<WindowedRow> = bars
        .iter()
        .zip(&windows)
        .enumerate()
        .map(|(pos, (bar, &window_index))| WindowedRow {
            bar,
            pos,
            window_index,
        })
        .collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let returns_all = transforms::log_returns(&indexed, &closes, GroupKeys::SYMBOL)?;

    let (rows, returns): (Vec<WindowedRow>, Vec<f64>) = indexed
        .into_iter()
        .zip(returns_all)
        .filter_map(|(row, r)| r.map(|r| (row, r)))
        .unzip();
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    debug!(rows = rows.len(), windows = windows.iter().max().map_or(0, |w| w + 1), "windowed returns");

    // Steps 3-6: detrend per window and describe the cumulative deviate.
    let deviates = deviates(&rows, &returns)?;

    // Step 7: keep rows in today's volatility bucket.
    let kept: Vec<usize> = if cfg.rv_adjustment {
        volatility_filter(bars, &rows, cfg)?
    } else {
        (0..rows.len()).collect()
    };
    debug!(kept = kept.len(), of = rows.len(), "rows retained for R/S");

    // Steps 8-10 per symbol.
    let kept_rows: Vec<WindowedRow> = kept.iter().map(|&i| rows[i].clone()).collect();
    let mut out = Vec::new();
    for group in GroupKeys::SYMBOL.partition(&kept_rows) {
        let members: Vec<usize> = group.iter().map(|&g| kept[g]).collect();
        let Some(&last) = members.last() else {
            continue;
        };
        let symbol = rows[last].bar.symbol.as_str();

        let Some(recent_price) = recent_price(bars, symbol, cfg, quotes) else {
            continue;
        };

        let std_detrended = detrended_std(&rows, &deviates.detrended, &members, cfg.rv_adjustment);
        let rs = select_rs(&rows, &deviates.rs, &members, cfg.rs_method);
        let price_range = match (rs, std_detrended) {
            (Some(rs), Some(std)) => Some(rs * std * recent_price),
            _ => None,
        };

        let extent = deviates.extent[last];
        let span = extent.range();
        let (top_modifier, bottom_modifier) = if span != 0.0 {
            (extent.max / span, extent.min / span)
        } else {
            (1.0, 1.0)
        };

        out.push(ChannelResult {
            date: rows[last].bar.date,
            symbol: symbol.to_string(),
            bottom_price: price_range.map(|r| round4(recent_price + r * bottom_modifier)),
            recent_price,
            top_price: price_range.map(|r| round4(recent_price + r * top_modifier)),
            momentum_signal: None,
        });
    }
    out.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    Ok(out)
}

fn deviates(rows: &[WindowedRow], returns: &[f64]) -> Result<Deviates, HumblError> {
    let keys = GroupKeys::SYMBOL_WINDOW;
    let window_mean = transforms::mean(rows, returns, keys)?;
    let detrended = transforms::detrend(returns, &window_mean)?;
    let cum = transforms::cum_sum(rows, &detrended, keys)?;
    transforms::check_cum_sum_closes(rows, &cum, keys)?;
    let extent = transforms::range(rows, &cum, keys)?;
    let std = transforms::std_dev(rows, &cum, keys)?;
    let rs = extent
        .iter()
        .zip(&std)
        .map(|(e, s)| match s {
            Some(s) if *s > MIN_STD => Some(e.range() / s),
            _ => None,
        })
        .collect();
    Ok(Deviates {
        detrended,
        extent,
        rs,
    })
}

/// Indices into `rows` whose realized volatility falls in the symbol's
/// current bucket. Rows still warming up are dropped.
fn volatility_filter(
    bars: &[PriceBar],
    rows: &[WindowedRow],
    cfg: &ChannelConfig,
) -> Result<Vec<usize>, HumblError> {
    let series = if cfg.rv_grouped_mean {
        grouped_mean_volatility(bars, &cfg.window, cfg.rv_method, &cfg.volatility)?
    } else {
        realized_volatility(bars, &cfg.window, cfg.rv_method, &cfg.volatility)?
    };

    let (present, vol): (Vec<usize>, Vec<f64>) = rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| series.values[row.pos].map(|v| (i, v)))
        .unzip();
    let present_rows: Vec<WindowedRow> = present.iter().map(|&i| rows[i].clone()).collect();
    let buckets = vol_buckets(&present_rows, &vol, cfg.lo_quantile, cfg.hi_quantile)?;
    debug!(column = %series.column, rows = present.len(), "volatility buckets assigned");
    Ok(vol_filter(&present_rows, &buckets)
        .into_iter()
        .map(|i| present[i])
        .collect())
}

fn recent_price(
    bars: &[PriceBar],
    symbol: &str,
    cfg: &ChannelConfig,
    quotes: Option<&HashMap<String, f64>>,
) -> Option<f64> {
    if let Some(quotes) = quotes {
        let quote = quotes.get(symbol).copied();
        if quote.is_none() {
            warn!(symbol, "no live quote, symbol dropped from channel");
        }
        return quote;
    }
    let run = symbol_runs(bars)
        .into_iter()
        .find(|r| bars[r.start].symbol == symbol)?;
    let series = &bars[run];
    if cfg.yesterday_close && series.len() >= 2 {
        Some(series[series.len() - 2].close)
    } else {
        series.last().map(|b| b.close)
    }
}

/// Std of detrended returns: over every retained row when volatility
/// adjusted, otherwise over the most recent window only.
fn detrended_std(
    rows: &[WindowedRow],
    detrended: &[f64],
    members: &[usize],
    rv_adjustment: bool,
) -> Option<f64> {
    let sample: Vec<f64> = if rv_adjustment {
        members.iter().map(|&i| detrended[i]).collect()
    } else {
        let latest = members.iter().map(|&i| rows[i].window_index).min()?;
        members
            .iter()
            .filter(|&&i| rows[i].window_index == latest)
            .map(|&i| detrended[i])
            .collect()
    };
    transforms::sample_std(&sample)
}

/// The R/S statistic chosen by `method`. Mean, max and min take one value
/// per retained window.
fn select_rs(
    rows: &[WindowedRow],
    rs: &[Option<f64>],
    members: &[usize],
    method: RsMethod,
) -> Option<f64> {
    if method == RsMethod::Rs {
        return rs[*members.last()?];
    }
    let per_window: BTreeMap<u32, f64> = members
        .iter()
        .filter_map(|&i| rs[i].map(|v| (rows[i].window_index, v)))
        .collect();
    let values: Vec<f64> = per_window.into_values().collect();
    rs_statistic(&values, method)
}

/// Aggregate per-window R/S values.
pub fn rs_statistic(values: &[f64], method: RsMethod) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    match method {
        RsMethod::Rs => values.last().copied(),
        RsMethod::RsMean => Some(values.iter().sum::<f64>() / values.len() as f64),
        RsMethod::RsMax => values.iter().copied().reduce(f64::max),
        RsMethod::RsMin => values.iter().copied().reduce(f64::min),
    }
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}
