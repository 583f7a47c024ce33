//! Quantile volatility buckets and the current-bucket filter.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::HumblError;
use crate::transforms::{GroupKeys, Keyed};

/// Default cut points used by the channel.
pub const DEFAULT_LO_QUANTILE: f64 = 0.3;
pub const DEFAULT_HI_QUANTILE: f64 = 0.65;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolBucket {
    Low,
    Mid,
    High,
}

impl fmt::Display for VolBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VolBucket::Low => "low",
            VolBucket::Mid => "mid",
            VolBucket::High => "high",
        })
    }
}

/// Linearly interpolated quantile of an ascending slice.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Right-closed bins: `(-inf, lo]`, `(lo, hi]`, `(hi, inf)`.
fn classify(v: f64, lo: f64, hi: f64) -> VolBucket {
    if v <= lo {
        VolBucket::Low
    } else if v <= hi {
        VolBucket::Mid
    } else {
        VolBucket::High
    }
}

/// Bucket each row's volatility against the quantiles of its own symbol.
pub fn vol_buckets<R: Keyed>(
    rows: &[R],
    volatility: &[f64],
    lo_quantile: f64,
    hi_quantile: f64,
) -> Result<Vec<VolBucket>, HumblError> {
    if !(0.0 < lo_quantile && lo_quantile < hi_quantile && hi_quantile < 1.0) {
        return Err(HumblError::InvalidParameter(format!(
            "bucket quantiles must satisfy 0 < lo < hi < 1, got {lo_quantile} and {hi_quantile}"
        )));
    }
    if rows.len() != volatility.len() {
        return Err(HumblError::LengthMismatch {
            left: rows.len(),
            right: volatility.len(),
        });
    }

    let mut out = vec![VolBucket::Mid; rows.len()];
    for group in GroupKeys::SYMBOL.partition(rows) {
        let mut sorted: Vec<f64> = group.iter().map(|&i| volatility[i]).collect();
        sorted.sort_by(f64::total_cmp);
        let (Some(lo), Some(hi)) = (quantile(&sorted, lo_quantile), quantile(&sorted, hi_quantile))
        else {
            continue;
        };
        for &i in &group {
            out[i] = classify(volatility[i], lo, hi);
        }
    }
    Ok(out)
}

/// Indices of rows whose bucket matches their symbol's last bucket.
pub fn vol_filter<R: Keyed>(rows: &[R], buckets: &[VolBucket]) -> Vec<usize> {
    let mut keep = Vec::new();
    for group in GroupKeys::SYMBOL.partition(rows) {
        let Some(&last) = group.last() else {
            continue;
        };
        let current = buckets[last];
        keep.extend(group.into_iter().filter(|&i| buckets[i] == current));
    }
    keep.sort_unstable();
    keep
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row(&'static str);

    impl Keyed for Row {
        fn symbol(&self) -> &str {
            self.0
        }
        fn window_index(&self) -> u32 {
            0
        }
    }

    #[test]
    fn quantile_interpolates() {
        let v = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(quantile(&v, 0.0), Some(1.0));
        assert_eq!(quantile(&v, 0.5), Some(3.0));
        assert_eq!(quantile(&v, 1.0), Some(5.0));
        assert!((quantile(&v, 0.3).unwrap() - 2.2).abs() < 1e-12);
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn boundaries_fall_into_lower_bucket() {
        assert_eq!(classify(2.0, 2.0, 4.0), VolBucket::Low);
        assert_eq!(classify(4.0, 2.0, 4.0), VolBucket::Mid);
        assert_eq!(classify(4.1, 2.0, 4.0), VolBucket::High);
    }

    #[test]
    fn buckets_are_per_symbol() {
        let rows: Vec<Row> = (0..10).map(|i| Row(if i < 5 { "A" } else { "B" })).collect();
        let vol = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0, 200.0, 300.0, 400.0, 500.0];
        let b = vol_buckets(&rows, &vol, 0.3, 0.65).unwrap();
        assert_eq!(
            b,
            vec![
                VolBucket::Low,
                VolBucket::Low,
                VolBucket::Mid,
                VolBucket::High,
                VolBucket::High,
                VolBucket::Low,
                VolBucket::Low,
                VolBucket::Mid,
                VolBucket::High,
                VolBucket::High,
            ]
        );
    }

    #[test]
    fn filter_keeps_current_bucket() {
        let rows: Vec<Row> = (0..6).map(|i| Row(if i < 4 { "A" } else { "B" })).collect();
        let buckets = [
            VolBucket::High,
            VolBucket::Low,
            VolBucket::High,
            VolBucket::High,
            VolBucket::Mid,
            VolBucket::Low,
        ];
        assert_eq!(vol_filter(&rows, &buckets), vec![0, 2, 3, 5]);
    }

    #[test]
    fn rejects_bad_quantiles() {
        let rows = vec![Row("A")];
        assert!(vol_buckets(&rows, &[1.0], 0.7, 0.3).is_err());
        assert!(vol_buckets(&rows, &[1.0], 0.0, 0.5).is_err());
        assert!(vol_buckets(&rows, &[1.0, 2.0], 0.3, 0.6).is_err());
    }
}
