//! Rolling-window helpers over optional values.
//!
//! Row-count windows only emit once the window is full and every value in
//! it is present. The date-based window covers (t - days, t].

use chrono::NaiveDate;

use crate::transforms::sample_std;

fn window_values(values: &[Option<f64>], end: usize, window: usize) -> Option<Vec<f64>> {
    if window == 0 || end + 1 < window {
        return None;
    }
    values[end + 1 - window..=end].iter().copied().collect()
}

/// Rolling sum over `window` rows.
pub fn rolling_sum(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| window_values(values, i, window).map(|w| w.iter().sum()))
        .collect()
}

/// Rolling mean over `window` rows.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| window_values(values, i, window).map(|w| w.iter().sum::<f64>() / w.len() as f64))
        .collect()
}

/// Rolling sample standard deviation over `window` rows.
pub fn rolling_std(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| window_values(values, i, window).and_then(|w| sample_std(&w)))
        .collect()
}

/// Rolling sample standard deviation over a calendar window of `days`
/// ending at each row's date.
///
/// A row emits once its date is at least `days` past the first date and at
/// least `min_periods` present values fall inside its window.
pub fn rolling_std_by_date(
    dates: &[NaiveDate],
    values: &[Option<f64>],
    days: i64,
    min_periods: usize,
) -> Vec<Option<f64>> {
    let Some(&first) = dates.first() else {
        return Vec::new();
    };
    let mut out = vec![None; values.len()];
    let mut start = 0;
    for i in 0..values.len() {
        let t = dates[i];
        while (t - dates[start]).num_days() >= days {
            start += 1;
        }
        if (t - first).num_days() < days {
            continue;
        }
        let sample: Vec<f64> = values[start..=i].iter().flatten().copied().collect();
        if sample.len() >= min_periods.max(2) {
            out[i] = sample_std(&sample);
        }
    }
    out
}
