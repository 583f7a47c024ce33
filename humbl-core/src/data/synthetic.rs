//! Deterministic synthetic series for tests and benchmarks.

use chrono::{Datelike, Months, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{MacroObservation, PriceBar};

fn seeded_rng(key: &str) -> StdRng {
    let seed: [u8; 32] = *blake3::hash(key.as_bytes()).as_bytes();
    StdRng::from_seed(seed)
}

/// Random-walk OHLC bars on weekdays in `[start, end]`, starting at 100.0.
///
/// The walk is seeded from the symbol name, so the same symbol always
/// yields the same series.
pub fn generate_synthetic_bars(symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<PriceBar> {
    let mut rng = seeded_rng(symbol);
    let mut bars = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current <= end {
        if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        bars.push(PriceBar::ohlc(symbol, current, open, high, low, close));

        price = close;
        current += chrono::Duration::days(1);
    }

    bars
}

/// Monthly macro observations on the first of each month, starting at
/// `start`'s month, as a random walk around 100.0 seeded by
/// `(series, country)`.
pub fn generate_synthetic_macro(
    series: &str,
    country: &str,
    start: NaiveDate,
    months: u32,
) -> Vec<MacroObservation> {
    let mut rng = seeded_rng(&format!("{series}/{country}"));
    let first = start.with_day(1).unwrap_or(start);
    let mut value = 100.0_f64;
    (0..months)
        .filter_map(|i| first.checked_add_months(Months::new(i)))
        .map(|date| {
            value += rng.gen_range(-1.0..1.0);
            MacroObservation::new(date, country, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn bars_are_deterministic_per_symbol() {
        let a = generate_synthetic_bars("SPY", d(2024, 1, 1), d(2024, 2, 1));
        let b = generate_synthetic_bars("SPY", d(2024, 1, 1), d(2024, 2, 1));
        let c = generate_synthetic_bars("QQQ", d(2024, 1, 1), d(2024, 2, 1));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn bars_skip_weekends_and_are_consistent() {
        let bars = generate_synthetic_bars("SPY", d(2024, 1, 1), d(2024, 1, 31));
        assert_eq!(bars.len(), 23);
        for bar in &bars {
            assert!(!matches!(bar.date.weekday(), Weekday::Sat | Weekday::Sun));
            let (o, h, l) = (bar.open.unwrap(), bar.high.unwrap(), bar.low.unwrap());
            assert!(h >= o.max(bar.close));
            assert!(l <= o.min(bar.close));
            assert!(l > 0.0);
        }
    }

    #[test]
    fn macro_series_is_monthly() {
        let obs = generate_synthetic_macro("CPI", "US", d(2020, 3, 17), 14);
        assert_eq!(obs.len(), 14);
        assert_eq!(obs[0].date, d(2020, 3, 1));
        assert_eq!(obs[13].date, d(2021, 4, 1));
        assert!(obs.iter().all(|o| o.country == "US"));
        assert_ne!(obs, generate_synthetic_macro("CLI", "US", d(2020, 3, 17), 14));
    }
}
