//! Conversion between typed rows and polars frames.
//!
//! Typed rows are what the engines compute on; frames are the exchange format
//! with callers. Dates are stored as polars `Date` (days since 1970-01-01).

use chrono::NaiveDate;
use polars::prelude::*;

use super::canonicalize_frame;
use crate::channel::ChannelResult;
use crate::compass::RegimeLabel;
use crate::domain::{MacroObservation, PriceBar};
use crate::error::HumblError;
use crate::momentum::MomentumPoint;

/// Symbol given to frames that carry a single unnamed series.
pub const DUMMY_SYMBOL: &str = "dummy";

fn epoch() -> NaiveDate {
    // 1970-01-01
    NaiveDate::default()
}

pub fn days_from_date(date: NaiveDate) -> i32 {
    (date - epoch()).num_days() as i32
}

pub fn date_from_days(days: i32) -> NaiveDate {
    epoch() + chrono::Duration::days(days as i64)
}

/// A polars `Date` column.
pub fn date_column(name: &str, dates: impl IntoIterator<Item = NaiveDate>) -> PolarsResult<Column> {
    let days: Vec<i32> = dates.into_iter().map(days_from_date).collect();
    Column::new(name.into(), days).cast(&DataType::Date)
}

fn require(df: &DataFrame, context: &str, columns: &[&str]) -> Result<(), HumblError> {
    let missing: Vec<&str> = columns
        .iter()
        .copied()
        .filter(|c| df.column(c).is_err())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(HumblError::missing(context, missing))
    }
}

fn read_dates(df: &DataFrame, name: &str) -> Result<Vec<NaiveDate>, HumblError> {
    let column = df.column(name)?.cast(&DataType::Date)?;
    let ca = column.date()?;
    (0..df.height())
        .map(|i| {
            ca.get(i)
                .map(date_from_days)
                .ok_or_else(|| HumblError::InvalidParameter(format!("null {name} at row {i}")))
        })
        .collect()
}

fn read_f64(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, HumblError> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().collect())
}

fn read_optional_f64(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, HumblError> {
    if df.column(name).is_err() {
        return Ok(vec![None; df.height()]);
    }
    read_f64(df, name)
}

fn read_strings(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, HumblError> {
    let column = df.column(name)?.cast(&DataType::String)?;
    Ok(column
        .str()?
        .into_iter()
        .map(|s| s.map(str::to_string))
        .collect())
}

/// Price bars from a frame with `date` and `close`, and optionally `symbol`,
/// `open`, `high`, `low`.
///
/// The result is in canonical order. Rows with a null or non-positive close
/// are dropped.
pub fn bars_from_frame(df: &DataFrame) -> Result<Vec<PriceBar>, HumblError> {
    require(df, "price frame", &["date", "close"])?;
    let mut lazy = df.clone().lazy();
    if df.column("symbol").is_err() {
        lazy = lazy.with_column(lit(DUMMY_SYMBOL).alias("symbol"));
    }
    let df = canonicalize_frame(lazy).collect()?;

    let symbols = read_strings(&df, "symbol")?;
    let dates = read_dates(&df, "date")?;
    let closes = read_f64(&df, "close")?;
    let opens = read_optional_f64(&df, "open")?;
    let highs = read_optional_f64(&df, "high")?;
    let lows = read_optional_f64(&df, "low")?;

    let mut bars = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let close = closes[i]
            .ok_or_else(|| HumblError::InvalidParameter(format!("null close at row {i}")))?;
        bars.push(PriceBar {
            symbol: symbols[i].clone().unwrap_or_else(|| DUMMY_SYMBOL.to_string()),
            date: dates[i],
            open: opens[i],
            high: highs[i],
            low: lows[i],
            close,
        });
    }
    Ok(bars)
}

pub fn bars_to_frame(bars: &[PriceBar]) -> Result<DataFrame, HumblError> {
    Ok(DataFrame::new(vec![
        date_column("date", bars.iter().map(|b| b.date))?,
        Column::new(
            "symbol".into(),
            bars.iter().map(|b| b.symbol.as_str()).collect::<Vec<_>>(),
        ),
        Column::new("open".into(), bars.iter().map(|b| b.open).collect::<Vec<_>>()),
        Column::new("high".into(), bars.iter().map(|b| b.high).collect::<Vec<_>>()),
        Column::new("low".into(), bars.iter().map(|b| b.low).collect::<Vec<_>>()),
        Column::new("close".into(), bars.iter().map(|b| b.close).collect::<Vec<_>>()),
    ])?)
}

/// Macro observations from a frame with `date` and `value`, and optionally
/// `country` (absent → `default_country`). Null values are skipped.
pub fn macro_from_frame(
    df: &DataFrame,
    default_country: &str,
) -> Result<Vec<MacroObservation>, HumblError> {
    require(df, "macro frame", &["date", "value"])?;
    let dates = read_dates(df, "date")?;
    let values = read_f64(df, "value")?;
    let countries = if df.column("country").is_ok() {
        read_strings(df, "country")?
    } else {
        vec![None; df.height()]
    };

    Ok(dates
        .into_iter()
        .zip(values)
        .zip(countries)
        .filter_map(|((date, value), country)| {
            let country = country.unwrap_or_else(|| default_country.to_string());
            value.map(|v| MacroObservation::new(date, country, v))
        })
        .collect())
}

/// `date, symbol, bottom_price, recent_price, top_price, momentum_signal`.
pub fn channel_to_frame(rows: &[ChannelResult]) -> Result<DataFrame, HumblError> {
    Ok(DataFrame::new(vec![
        date_column("date", rows.iter().map(|r| r.date))?,
        Column::new(
            "symbol".into(),
            rows.iter().map(|r| r.symbol.as_str()).collect::<Vec<_>>(),
        ),
        Column::new(
            "bottom_price".into(),
            rows.iter().map(|r| r.bottom_price).collect::<Vec<_>>(),
        ),
        Column::new(
            "recent_price".into(),
            rows.iter().map(|r| r.recent_price).collect::<Vec<_>>(),
        ),
        Column::new(
            "top_price".into(),
            rows.iter().map(|r| r.top_price).collect::<Vec<_>>(),
        ),
        Column::new(
            "momentum_signal".into(),
            rows.iter()
                .map(|r| r.momentum_signal.map(i32::from))
                .collect::<Vec<_>>(),
        ),
    ])?)
}

/// `date, symbol, close, momentum, shifted, momentum_signal`.
pub fn momentum_to_frame(points: &[MomentumPoint]) -> Result<DataFrame, HumblError> {
    Ok(DataFrame::new(vec![
        date_column("date", points.iter().map(|p| p.date))?,
        Column::new(
            "symbol".into(),
            points.iter().map(|p| p.symbol.as_str()).collect::<Vec<_>>(),
        ),
        Column::new("close".into(), points.iter().map(|p| p.close).collect::<Vec<_>>()),
        Column::new(
            "momentum".into(),
            points.iter().map(|p| p.momentum).collect::<Vec<_>>(),
        ),
        Column::new(
            "shifted".into(),
            points.iter().map(|p| p.shifted).collect::<Vec<_>>(),
        ),
        Column::new(
            "momentum_signal".into(),
            points
                .iter()
                .map(|p| p.momentum_signal.map(i32::from))
                .collect::<Vec<_>>(),
        ),
    ])?)
}

/// Compass output; the regime column holds display labels such as `humblBOOM`.
pub fn regime_labels_to_frame(rows: &[RegimeLabel]) -> Result<DataFrame, HumblError> {
    Ok(DataFrame::new(vec![
        date_column("date_month_start", rows.iter().map(|r| r.date_month_start))?,
        Column::new(
            "country".into(),
            rows.iter().map(|r| r.country.as_str()).collect::<Vec<_>>(),
        ),
        Column::new("cpi".into(), rows.iter().map(|r| r.cpi).collect::<Vec<_>>()),
        Column::new("cli".into(), rows.iter().map(|r| r.cli).collect::<Vec<_>>()),
        Column::new(
            "cpi_3m_delta".into(),
            rows.iter().map(|r| r.cpi_3m_delta).collect::<Vec<_>>(),
        ),
        Column::new(
            "cli_3m_delta".into(),
            rows.iter().map(|r| r.cli_3m_delta).collect::<Vec<_>>(),
        ),
        Column::new(
            "humbl_regime".into(),
            rows.iter()
                .map(|r| r.humbl_regime.map(|g| g.label()))
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "cpi_zscore".into(),
            rows.iter().map(|r| r.cpi_zscore).collect::<Vec<_>>(),
        ),
        Column::new(
            "cli_zscore".into(),
            rows.iter().map(|r| r.cli_zscore).collect::<Vec<_>>(),
        ),
    ])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Regime;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    #[test]
    fn epoch_day_conversion() {
        assert_eq!(days_from_date(NaiveDate::from_ymd_opt(1970, 1, 2).unwrap()), 1);
        assert_eq!(date_from_days(days_from_date(d(3, 15))), d(3, 15));
    }

    #[test]
    fn bars_without_symbol_get_dummy_and_are_sorted() {
        let df = DataFrame::new(vec![
            date_column("date", [d(1, 3), d(1, 2)]).unwrap(),
            Column::new("close".into(), vec![11.0, 10.0]),
        ])
        .unwrap();
        let bars = bars_from_frame(&df).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].symbol, DUMMY_SYMBOL);
        assert_eq!(bars[0].date, d(1, 2));
        assert_eq!(bars[0].close, 10.0);
        assert!(!bars[0].has_ohlc());
    }

    #[test]
    fn bars_frame_keeps_ohlc() {
        let bars = vec![
            PriceBar::ohlc("SPY", d(1, 2), 1.0, 2.0, 0.5, 1.5),
            PriceBar::close_only("QQQ", d(1, 2), 3.0),
        ];
        let df = bars_to_frame(&bars).unwrap();
        let back = bars_from_frame(&df).unwrap();
        assert_eq!(back.len(), 2);
        // canonical order puts QQQ first
        assert_eq!(back[0], bars[1]);
        assert_eq!(back[1], bars[0]);
    }

    #[test]
    fn missing_price_columns_are_listed() {
        let df = DataFrame::new(vec![Column::new("open".into(), vec![1.0])]).unwrap();
        match bars_from_frame(&df) {
            Err(HumblError::MissingColumns { missing, .. }) => {
                assert_eq!(missing, vec!["date".to_string(), "close".to_string()]);
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn macro_frame_defaults_country() {
        let df = DataFrame::new(vec![
            date_column("date", [d(1, 1), d(2, 1), d(3, 1)]).unwrap(),
            Column::new("value".into(), vec![Some(1.0), None, Some(3.0)]),
        ])
        .unwrap();
        let obs = macro_from_frame(&df, "US").unwrap();
        assert_eq!(obs.len(), 2);
        assert!(obs.iter().all(|o| o.country == "US"));
        assert_eq!(obs[1].value, 3.0);
    }

    #[test]
    fn channel_frame_columns() {
        let rows = vec![ChannelResult {
            date: d(5, 1),
            symbol: "SPY".into(),
            bottom_price: Some(95.0),
            recent_price: 100.0,
            top_price: None,
            momentum_signal: Some(1),
        }];
        let df = channel_to_frame(&rows).unwrap();
        assert_eq!(
            df.get_column_names_str(),
            vec![
                "date",
                "symbol",
                "bottom_price",
                "recent_price",
                "top_price",
                "momentum_signal"
            ]
        );
        assert_eq!(df.column("top_price").unwrap().null_count(), 1);
        assert_eq!(
            df.column("momentum_signal").unwrap().i32().unwrap().get(0),
            Some(1)
        );
    }

    #[test]
    fn regime_frame_uses_display_labels() {
        let rows = vec![RegimeLabel {
            date_month_start: d(4, 1),
            country: "US".into(),
            cpi: 3.0,
            cli: 100.0,
            cpi_3m_delta: Some(-0.1),
            cli_3m_delta: Some(0.2),
            humbl_regime: Some(Regime::Boom),
            cpi_zscore: None,
            cli_zscore: None,
        }];
        let df = regime_labels_to_frame(&rows).unwrap();
        let regime = df.column("humbl_regime").unwrap().str().unwrap().get(0);
        assert_eq!(regime, Some("humblBOOM"));
    }
}
