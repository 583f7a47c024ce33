//! Window strings ("1mo", "3mo", "1y", "2 weeks") and the window indexer.
//!
//! A window resolves three ways:
//! - calendar months, for the backward-anchored window indexer (month,
//!   quarter and year only)
//! - calendar days relative to an anchor date, for time-based rolling windows
//! - approximate trading days (d=1, w=5, mo=21, q=63, y=252)

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::PriceBar;
use crate::error::HumblError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowUnit {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl WindowUnit {
    fn from_letter(c: char) -> Option<Self> {
        match c {
            'd' => Some(WindowUnit::Day),
            'w' => Some(WindowUnit::Week),
            'm' => Some(WindowUnit::Month),
            'q' => Some(WindowUnit::Quarter),
            'y' => Some(WindowUnit::Year),
            _ => None,
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            WindowUnit::Day => "d",
            WindowUnit::Week => "w",
            WindowUnit::Month => "mo",
            WindowUnit::Quarter => "q",
            WindowUnit::Year => "y",
        }
    }

    fn trading_days(&self) -> usize {
        match self {
            WindowUnit::Day => 1,
            WindowUnit::Week => 5,
            WindowUnit::Month => 21,
            WindowUnit::Quarter => 63,
            WindowUnit::Year => 252,
        }
    }

    fn months(&self) -> Option<u32> {
        match self {
            WindowUnit::Day | WindowUnit::Week => None,
            WindowUnit::Month => Some(1),
            WindowUnit::Quarter => Some(3),
            WindowUnit::Year => Some(12),
        }
    }
}

/// A parsed window: a positive count of a calendar unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WindowSpec {
    count: u32,
    unit: WindowUnit,
}

impl WindowSpec {
    pub const fn new(count: u32, unit: WindowUnit) -> Self {
        Self { count, unit }
    }

    /// Parse a window string. The count is the leading number; the unit is
    /// the first letter that follows it, so "1mo", "1 month" and "1m" agree.
    pub fn parse(window: &str) -> Result<Self, HumblError> {
        let invalid = |reason: &str| HumblError::InvalidWindow {
            window: window.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = window.trim();
        let digits: String = trimmed.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return Err(invalid("expected a leading number"));
        }
        let count: u32 = digits
            .parse()
            .map_err(|_| invalid("window count out of range"))?;
        if count == 0 {
            return Err(invalid("window count must be positive"));
        }

        let unit = trimmed[digits.len()..]
            .chars()
            .find(|c| c.is_alphabetic())
            .and_then(|c| WindowUnit::from_letter(c.to_ascii_lowercase()))
            .ok_or_else(|| invalid("unit must be one of d, w, mo, q, y"))?;

        Ok(Self { count, unit })
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn unit(&self) -> WindowUnit {
        self.unit
    }

    /// Window length in calendar months. Day and week windows are rejected.
    pub fn months(&self, context: &'static str) -> Result<u32, HumblError> {
        self.unit
            .months()
            .map(|m| m * self.count)
            .ok_or_else(|| HumblError::UnsupportedWindowUnit {
                unit: self.unit.suffix().to_string(),
                context,
            })
    }

    /// Approximate trading-day length.
    pub fn trading_days(&self) -> usize {
        self.unit.trading_days() * self.count as usize
    }

    /// The date one window before `anchor`. Month arithmetic clamps to the
    /// last day of the target month (Mar 31 minus 1mo is Feb 29 in 2024).
    pub fn start_before(&self, anchor: NaiveDate) -> NaiveDate {
        match self.unit.months() {
            Some(m) => anchor
                .checked_sub_months(Months::new(m * self.count))
                .unwrap_or(NaiveDate::MIN),
            None => anchor
                .checked_sub_signed(self.fixed_duration())
                .unwrap_or(NaiveDate::MIN),
        }
    }

    /// The date one window after `start`.
    pub fn end_after(&self, start: NaiveDate) -> NaiveDate {
        match self.unit.months() {
            Some(m) => start
                .checked_add_months(Months::new(m * self.count))
                .unwrap_or(NaiveDate::MAX),
            None => start
                .checked_add_signed(self.fixed_duration())
                .unwrap_or(NaiveDate::MAX),
        }
    }

    /// Calendar-day length of the window ending at `anchor`.
    pub fn calendar_days(&self, anchor: NaiveDate) -> i64 {
        (anchor - self.start_before(anchor)).num_days()
    }

    /// Window length in days: trading days when `trading_days` is set,
    /// otherwise calendar days ending at `anchor`.
    pub fn days(&self, anchor: NaiveDate, trading_days: bool) -> usize {
        if trading_days {
            self.trading_days()
        } else {
            self.calendar_days(anchor).max(1) as usize
        }
    }

    fn fixed_duration(&self) -> Duration {
        let per_unit = match self.unit {
            WindowUnit::Week => 7,
            _ => 1,
        };
        Duration::days(per_unit * self.count as i64)
    }
}

impl fmt::Display for WindowSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.unit.suffix())
    }
}

impl FromStr for WindowSpec {
    type Err = HumblError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WindowSpec::parse(s)
    }
}

impl TryFrom<String> for WindowSpec {
    type Error = HumblError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        WindowSpec::parse(&value)
    }
}

impl From<WindowSpec> for String {
    fn from(value: WindowSpec) -> Self {
        value.to_string()
    }
}

// ── Window indexer ──────────────────────────────────────────────────

/// Whole months elapsed from `date` back from `last`. A day-of-month past
/// `last`'s day-of-month has not completed its month yet.
pub fn elapsed_months(date: NaiveDate, last: NaiveDate) -> i32 {
    let months = 12 * (last.year() - date.year()) + (last.month() as i32 - date.month() as i32);
    if date.day() > last.day() {
        months - 1
    } else {
        months
    }
}

/// Assign each bar its `window_index`, anchored at the last date of its
/// symbol: index 0 is the most recent window, counting up into the past.
pub fn assign_window_index(bars: &[PriceBar], window: &WindowSpec) -> Result<Vec<u32>, HumblError> {
    let k = window.months("window indexing")? as i32;

    let mut last_dates: HashMap<&str, NaiveDate> = HashMap::new();
    for bar in bars {
        last_dates
            .entry(bar.symbol.as_str())
            .and_modify(|d| *d = (*d).max(bar.date))
            .or_insert(bar.date);
    }

    Ok(bars
        .iter()
        .map(|bar| {
            let last = last_dates[bar.symbol.as_str()];
            (elapsed_months(bar.date, last).max(0) / k) as u32
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    // ── Parsing ──

    #[test]
    fn parses_short_and_long_forms() {
        assert_eq!(WindowSpec::parse("1mo").unwrap(), WindowSpec::new(1, WindowUnit::Month));
        assert_eq!(WindowSpec::parse("1m").unwrap(), WindowSpec::new(1, WindowUnit::Month));
        assert_eq!(WindowSpec::parse("3 months").unwrap(), WindowSpec::new(3, WindowUnit::Month));
        assert_eq!(WindowSpec::parse("2 weeks").unwrap(), WindowSpec::new(2, WindowUnit::Week));
        assert_eq!(WindowSpec::parse("1Y").unwrap(), WindowSpec::new(1, WindowUnit::Year));
        assert_eq!(WindowSpec::parse("2q").unwrap(), WindowSpec::new(2, WindowUnit::Quarter));
        assert_eq!(WindowSpec::parse("10d").unwrap(), WindowSpec::new(10, WindowUnit::Day));
    }

    #[test]
    fn rejects_bad_windows() {
        assert!(matches!(WindowSpec::parse("mo"), Err(HumblError::InvalidWindow { .. })));
        assert!(matches!(WindowSpec::parse("0mo"), Err(HumblError::InvalidWindow { .. })));
        assert!(matches!(WindowSpec::parse("5x"), Err(HumblError::InvalidWindow { .. })));
        assert!(matches!(WindowSpec::parse("5"), Err(HumblError::InvalidWindow { .. })));
    }

    #[test]
    fn display_is_canonical() {
        assert_eq!(WindowSpec::parse("3 months").unwrap().to_string(), "3mo");
        assert_eq!(WindowSpec::parse("1 year").unwrap().to_string(), "1y");
    }

    #[test]
    fn serde_as_string() {
        let w: WindowSpec = serde_json::from_str("\"1mo\"").unwrap();
        assert_eq!(w, WindowSpec::new(1, WindowUnit::Month));
        assert_eq!(serde_json::to_string(&w).unwrap(), "\"1mo\"");
        assert!(serde_json::from_str::<WindowSpec>("\"1x\"").is_err());
    }

    // ── Resolution ──

    #[test]
    fn month_end_anchor_clamps() {
        let bars: Vec<PriceBar> = [d(2024, 1, 29), d(2024, 1, 30), d(2024, 1, 31), d(2024, 2, 29)]
            .into_iter()
            .map(|date| PriceBar::close_only("P", date, 1.0))
            .collect();
        let idx = assign_window_index(&bars, &WindowSpec::parse("1mo").unwrap()).unwrap();
        // Feb 29 minus one month is Jan 29
        assert_eq!(idx, vec![1, 0, 0, 0]);
        assert_eq!(elapsed_months(d(2024, 3, 31), d(2024, 4, 30)), 0);
        assert_eq!(elapsed_months(d(2024, 2, 29), d(2024, 3, 31)), 1);
    }

    #[test]
    fn months_rejects_day_and_week() {
        assert_eq!(WindowSpec::parse("1y").unwrap().months("t").unwrap(), 12);
        assert_eq!(WindowSpec::parse("2q").unwrap().months("t").unwrap(), 6);
        assert!(matches!(
            WindowSpec::parse("1w").unwrap().months("t"),
            Err(HumblError::UnsupportedWindowUnit { .. })
        ));
        assert!(WindowSpec::parse("5d").unwrap().months("t").is_err());
    }

    #[test]
    fn trading_days_table() {
        assert_eq!(WindowSpec::parse("1d").unwrap().trading_days(), 1);
        assert_eq!(WindowSpec::parse("2w").unwrap().trading_days(), 10);
        assert_eq!(WindowSpec::parse("1mo").unwrap().trading_days(), 21);
        assert_eq!(WindowSpec::parse("1q").unwrap().trading_days(), 63);
        assert_eq!(WindowSpec::parse("1y").unwrap().trading_days(), 252);
    }

    #[test]
    fn calendar_days_follow_anchor() {
        let w = WindowSpec::parse("1mo").unwrap();
        assert_eq!(w.calendar_days(d(2024, 3, 15)), 29);
        assert_eq!(w.calendar_days(d(2023, 3, 15)), 28);
        assert_eq!(w.calendar_days(d(2024, 5, 15)), 30);
        assert_eq!(WindowSpec::parse("2w").unwrap().calendar_days(d(2024, 5, 15)), 14);
        assert_eq!(w.start_before(d(2024, 3, 31)), d(2024, 2, 29));
        assert_eq!(w.end_after(d(2024, 1, 31)), d(2024, 2, 29));
    }

    // ── Window index ──

    #[test]
    fn elapsed_months_with_day_overflow() {
        let last = d(2024, 6, 15);
        assert_eq!(elapsed_months(d(2024, 6, 15), last), 0);
        assert_eq!(elapsed_months(d(2024, 6, 1), last), 0);
        assert_eq!(elapsed_months(d(2024, 5, 16), last), 0);
        assert_eq!(elapsed_months(d(2024, 5, 15), last), 1);
        assert_eq!(elapsed_months(d(2023, 6, 15), last), 12);
    }

    #[test]
    fn index_is_anchored_per_symbol() {
        let bars = vec![
            PriceBar::close_only("A", d(2024, 4, 20), 1.0),
            PriceBar::close_only("A", d(2024, 5, 20), 1.0),
            PriceBar::close_only("A", d(2024, 6, 15), 1.0),
            PriceBar::close_only("B", d(2024, 4, 20), 1.0),
            PriceBar::close_only("B", d(2024, 5, 20), 1.0),
        ];
        let idx = assign_window_index(&bars, &WindowSpec::parse("1mo").unwrap()).unwrap();
        assert_eq!(idx, vec![1, 0, 0, 1, 0]);
    }

    #[test]
    fn multi_month_window_divides() {
        let bars: Vec<PriceBar> = (1..=12)
            .map(|m| PriceBar::close_only("A", d(2024, m, 10), 1.0))
            .collect();
        let idx = assign_window_index(&bars, &WindowSpec::parse("3mo").unwrap()).unwrap();
        assert_eq!(idx, vec![3, 3, 3, 2, 2, 2, 1, 1, 1, 0, 0, 0]);
    }

    #[test]
    fn index_rejects_week_window() {
        let bars = vec![PriceBar::close_only("A", d(2024, 1, 1), 1.0)];
        assert!(assign_window_index(&bars, &WindowSpec::parse("1w").unwrap()).is_err());
    }
}
