use polars::prelude::*;
use tracing::warn;

use crate::domain::PriceBar;

/// Sort bars by (symbol, date), keep the first row of each duplicate
/// (symbol, date) and drop rows whose close is not finite and positive.
pub fn canonicalize(mut bars: Vec<PriceBar>) -> Vec<PriceBar> {
    bars.sort_by(|a, b| a.symbol.cmp(&b.symbol).then(a.date.cmp(&b.date)));
    bars.dedup_by(|later, first| later.symbol == first.symbol && later.date == first.date);

    let before = bars.len();
    bars.retain(PriceBar::has_valid_close);
    let dropped = before - bars.len();
    if dropped > 0 {
        warn!(dropped, "dropped bars with non-positive or non-finite close");
    }
    bars
}

/// Lazy counterpart of [`canonicalize`] for frames with `symbol`, `date`
/// and `close` columns. Non-finite closes are left to the typed pass.
pub fn canonicalize_frame(df: LazyFrame) -> LazyFrame {
    df.sort(
        ["symbol", "date"],
        SortMultipleOptions::default()
            .with_order_descending_multi([false, false])
            .with_maintain_order(true),
    )
    .unique_stable(
        Some(vec!["symbol".into(), "date".into()]),
        UniqueKeepStrategy::First,
    )
    .filter(col("close").gt(lit(0.0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn sorts_dedupes_and_drops_bad_closes() {
        let bars = vec![
            PriceBar::close_only("B", d(2), 10.0),
            PriceBar::close_only("A", d(3), 3.0),
            PriceBar::close_only("A", d(1), 1.0),
            PriceBar::close_only("A", d(3), 99.0),
            PriceBar::close_only("A", d(4), 0.0),
            PriceBar::close_only("B", d(1), f64::NAN),
        ];
        let out = canonicalize(bars);
        let keys: Vec<(&str, u32, f64)> = out
            .iter()
            .map(|b| (b.symbol.as_str(), chrono::Datelike::day(&b.date), b.close))
            .collect();
        assert_eq!(keys, vec![("A", 1, 1.0), ("A", 3, 3.0), ("B", 2, 10.0)]);
    }

    #[test]
    fn frame_canonicalize_sorts_and_dedupes() {
        let df = df!(
            "symbol" => &["SPY", "SPY", "SPY", "SPY"],
            "date" => &[3i32, 1, 2, 1],
            "close" => &[103.0, 101.0, 102.0, 999.0],
        )
        .unwrap();
        let out = canonicalize_frame(df.lazy()).collect().unwrap();
        assert_eq!(out.height(), 3);
        let close = out.column("close").unwrap().f64().unwrap();
        assert_eq!(close.get(0), Some(101.0));
        assert_eq!(close.get(2), Some(103.0));
    }

    #[test]
    fn frame_canonicalize_drops_non_positive_close() {
        let df = df!(
            "symbol" => &["SPY", "SPY"],
            "date" => &[1i32, 2],
            "close" => &[-1.0, 5.0],
        )
        .unwrap();
        let out = canonicalize_frame(df.lazy()).collect().unwrap();
        assert_eq!(out.height(), 1);
    }
}
