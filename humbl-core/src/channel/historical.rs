//! Historical channel: the full pipeline recomputed as of every trailing
//! date, using only data up to and including that date.

use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::BTreeSet;
use tracing::{debug, info};

use super::engine::channel_sorted;
use super::{ChannelConfig, ChannelResult};
use crate::data::canonicalize;
use crate::domain::PriceBar;
use crate::error::HumblError;

/// One channel row per (symbol, date) for every date at least one window
/// after the first observation, sorted by (symbol, date).
///
/// Each as-of date is an independent task over an immutable view of the
/// input. `cfg.max_workers` caps the worker pool.
pub fn calc_humbl_channel_historical(
    bars: &[PriceBar],
    cfg: &ChannelConfig,
) -> Result<Vec<ChannelResult>, HumblError> {
    cfg.validate(bars)?;
    let bars = canonicalize(bars.to_vec());
    let (Some(first), Some(last)) = (
        bars.iter().map(|b| b.date).min(),
        bars.iter().map(|b| b.date).max(),
    ) else {
        return Err(HumblError::InsufficientData(
            "historical channel needs at least one observation".into(),
        ));
    };

    let start = cfg.window.end_after(first);
    if start > last {
        return Err(HumblError::InsufficientData(format!(
            "historical channel needs at least one {} window of data: \
             first date + window is {start} but the data ends {last}",
            cfg.window
        )));
    }

    let as_of: Vec<NaiveDate> = bars
        .iter()
        .map(|b| b.date)
        .filter(|d| *d >= start)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    info!(
        dates = as_of.len(),
        from = %start,
        to = %last,
        workers = ?cfg.max_workers,
        "computing historical humbl channel"
    );

    let compute = |date: &NaiveDate| -> Result<Vec<ChannelResult>, HumblError> {
        let visible: Vec<PriceBar> = bars.iter().filter(|b| b.date <= *date).cloned().collect();
        channel_sorted(&visible, cfg, None)
    };

    let per_date: Vec<Vec<ChannelResult>> = match cfg.max_workers {
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| HumblError::WorkerPool(e.to_string()))?;
            pool.install(|| as_of.par_iter().map(compute).collect::<Result<_, _>>())?
        }
        None => as_of.par_iter().map(compute).collect::<Result<_, _>>()?,
    };

    let mut out: Vec<ChannelResult> = per_date.into_iter().flatten().collect();
    out.sort_by(|a, b| a.symbol.cmp(&b.symbol).then(a.date.cmp(&b.date)));
    // A symbol whose series ends early repeats its last row on later dates.
    out.dedup_by(|a, b| a.symbol == b.symbol && a.date == b.date);
    debug!(rows = out.len(), "historical channel assembled");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::calc_humbl_channel;
    use crate::data::generate_synthetic_bars;
    use crate::window::WindowSpec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn cfg() -> ChannelConfig {
        ChannelConfig {
            rv_adjustment: false,
            max_workers: Some(2),
            ..ChannelConfig::default()
        }
    }

    #[test]
    fn one_row_per_trailing_date() {
        let bars = generate_synthetic_bars("SPY", d(2024, 1, 1), d(2024, 3, 29));
        let out = calc_humbl_channel_historical(&bars, &cfg()).unwrap();
        let expected = bars.iter().filter(|b| b.date >= d(2024, 2, 1)).count();
        assert_eq!(out.len(), expected);
        assert!(out.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn last_row_matches_point_in_time_channel() {
        let bars = generate_synthetic_bars("QQQ", d(2024, 1, 1), d(2024, 4, 30));
        let hist = calc_humbl_channel_historical(&bars, &cfg()).unwrap();
        let now = calc_humbl_channel(&bars, &cfg(), None).unwrap();
        assert_eq!(hist.last().unwrap(), &now[0]);
    }

    #[test]
    fn rows_do_not_look_ahead() {
        let bars = generate_synthetic_bars("IWM", d(2024, 1, 1), d(2024, 4, 30));
        let hist = calc_humbl_channel_historical(&bars, &cfg()).unwrap();
        let cut = d(2024, 3, 15);
        let truncated: Vec<PriceBar> = bars.iter().filter(|b| b.date <= cut).cloned().collect();
        let point = calc_humbl_channel(&truncated, &cfg(), None).unwrap();
        let row = hist.iter().find(|r| r.date == point[0].date).unwrap();
        assert_eq!(row, &point[0]);
    }

    #[test]
    fn short_span_is_rejected() {
        let bars = generate_synthetic_bars("SPY", d(2024, 1, 1), d(2024, 1, 20));
        assert!(matches!(
            calc_humbl_channel_historical(&bars, &cfg()),
            Err(HumblError::InsufficientData(_))
        ));
    }

    #[test]
    fn exactly_one_window_of_data_gives_one_row() {
        let bars = generate_synthetic_bars("SPY", d(2023, 1, 2), d(2023, 2, 2));
        let cfg = ChannelConfig {
            window: WindowSpec::parse("1mo").unwrap(),
            ..cfg()
        };
        let out = calc_humbl_channel_historical(&bars, &cfg).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].date, d(2023, 2, 2));
    }

    #[test]
    fn multi_symbol_output_is_sorted_and_unique() {
        let mut bars = generate_synthetic_bars("B", d(2024, 1, 1), d(2024, 3, 29));
        bars.extend(generate_synthetic_bars("A", d(2024, 1, 1), d(2024, 3, 15)));
        let cfg = ChannelConfig {
            window: WindowSpec::parse("1mo").unwrap(),
            max_workers: None,
            ..cfg()
        };
        let out = calc_humbl_channel_historical(&bars, &cfg).unwrap();
        assert!(out
            .windows(2)
            .all(|w| (w[0].symbol.as_str(), w[0].date) < (w[1].symbol.as_str(), w[1].date)));
        assert_eq!(out.iter().filter(|r| r.symbol == "A").last().unwrap().date, d(2024, 3, 15));
    }

    #[test]
    fn zero_workers_is_rejected() {
        let bars = generate_synthetic_bars("SPY", d(2024, 1, 1), d(2024, 3, 29));
        let cfg = ChannelConfig {
            max_workers: Some(0),
            ..cfg()
        };
        assert!(matches!(
            calc_humbl_channel_historical(&bars, &cfg),
            Err(HumblError::InvalidParameter(_))
        ));
    }
}
