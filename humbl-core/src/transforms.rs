//! Grouped return/trend algebra: log returns, mean, detrend, cumulative sum,
//! range and standard deviation.
//!
//! Every function takes the rows it groups over plus an aligned value column,
//! and returns a column aligned with the rows. Grouping is chosen explicitly
//! through [`GroupKeys`]; rows must already be sorted by (symbol, date).

use std::collections::HashMap;

use crate::error::HumblError;

/// Tolerance for the cumulative-deviate closing check.
pub const CUM_SUM_TOLERANCE: f64 = 1e-6;

/// A row that can be grouped by symbol and window.
pub trait Keyed {
    fn symbol(&self) -> &str;
    fn window_index(&self) -> u32;
}

/// Which keys participate in grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupKeys {
    pub symbol: bool,
    pub window: bool,
}

impl GroupKeys {
    pub const NONE: GroupKeys = GroupKeys {
        symbol: false,
        window: false,
    };
    pub const SYMBOL: GroupKeys = GroupKeys {
        symbol: true,
        window: false,
    };
    pub const SYMBOL_WINDOW: GroupKeys = GroupKeys {
        symbol: true,
        window: true,
    };

    fn key<'a, R: Keyed>(&self, row: &'a R) -> (Option<&'a str>, Option<u32>) {
        (
            self.symbol.then(|| row.symbol()),
            self.window.then(|| row.window_index()),
        )
    }

    /// Row indices per group, groups in order of first appearance.
    pub fn partition<R: Keyed>(&self, rows: &[R]) -> Vec<Vec<usize>> {
        let mut slots: HashMap<(Option<&str>, Option<u32>), usize> = HashMap::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            let slot = *slots.entry(self.key(row)).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(i);
        }
        groups
    }
}

/// Minimum and maximum of a group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
}

impl Extent {
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

fn check_len(rows: usize, values: usize) -> Result<(), HumblError> {
    if rows != values {
        return Err(HumblError::LengthMismatch {
            left: rows,
            right: values,
        });
    }
    Ok(())
}

/// One-step log difference of `prices` within each group. The first row of
/// every group has no predecessor and yields `None`.
pub fn log_returns<R: Keyed>(
    rows: &[R],
    prices: &[f64],
    keys: GroupKeys,
) -> Result<Vec<Option<f64>>, HumblError> {
    check_len(rows.len(), prices.len())?;
    let mut out = vec![None; rows.len()];
    for group in keys.partition(rows) {
        for pair in group.windows(2) {
            let r = prices[pair[1]].ln() - prices[pair[0]].ln();
            out[pair[1]] = r.is_finite().then_some(r);
        }
    }
    Ok(out)
}

/// Group mean of `values`, broadcast back onto every row.
pub fn mean<R: Keyed>(rows: &[R], values: &[f64], keys: GroupKeys) -> Result<Vec<f64>, HumblError> {
    check_len(rows.len(), values.len())?;
    let mut out = vec![0.0; rows.len()];
    for group in keys.partition(rows) {
        let m = group.iter().map(|&i| values[i]).sum::<f64>() / group.len() as f64;
        for &i in &group {
            out[i] = m;
        }
    }
    Ok(out)
}

/// Row-wise `target - reference`.
pub fn detrend(target: &[f64], reference: &[f64]) -> Result<Vec<f64>, HumblError> {
    check_len(target.len(), reference.len())?;
    Ok(target.iter().zip(reference).map(|(t, r)| t - r).collect())
}

/// Running sum of `values` within each group.
pub fn cum_sum<R: Keyed>(rows: &[R], values: &[f64], keys: GroupKeys) -> Result<Vec<f64>, HumblError> {
    check_len(rows.len(), values.len())?;
    let mut out = vec![0.0; rows.len()];
    for group in keys.partition(rows) {
        let mut acc = 0.0;
        for &i in &group {
            acc += values[i];
            out[i] = acc;
        }
    }
    Ok(out)
}

/// Fails unless the last cumulative value of every group is within
/// [`CUM_SUM_TOLERANCE`] of zero. Holds whenever the cumulated series was
/// detrended by its own group mean.
pub fn check_cum_sum_closes<R: Keyed>(
    rows: &[R],
    cum: &[f64],
    keys: GroupKeys,
) -> Result<(), HumblError> {
    check_len(rows.len(), cum.len())?;
    for group in keys.partition(rows) {
        if let Some(&last) = group.last() {
            if !(cum[last].abs() <= CUM_SUM_TOLERANCE) {
                return Err(HumblError::InvariantViolation(format!(
                    "cumulative deviate for symbol '{}' window {} ends at {:e}, expected ~0",
                    rows[last].symbol(),
                    rows[last].window_index(),
                    cum[last]
                )));
            }
        }
    }
    Ok(())
}

/// Group minimum and maximum, broadcast back onto every row.
pub fn range<R: Keyed>(rows: &[R], values: &[f64], keys: GroupKeys) -> Result<Vec<Extent>, HumblError> {
    check_len(rows.len(), values.len())?;
    let mut out = vec![Extent { min: 0.0, max: 0.0 }; rows.len()];
    for group in keys.partition(rows) {
        let extent = group.iter().fold(
            Extent {
                min: f64::INFINITY,
                max: f64::NEG_INFINITY,
            },
            |e, &i| Extent {
                min: e.min.min(values[i]),
                max: e.max.max(values[i]),
            },
        );
        for &i in &group {
            out[i] = extent;
        }
    }
    Ok(out)
}

/// Sample standard deviation (ddof = 1) per group, broadcast back onto every
/// row. Groups with fewer than two rows have no deviation.
pub fn std_dev<R: Keyed>(
    rows: &[R],
    values: &[f64],
    keys: GroupKeys,
) -> Result<Vec<Option<f64>>, HumblError> {
    check_len(rows.len(), values.len())?;
    let mut out = vec![None; rows.len()];
    for group in keys.partition(rows) {
        let sample: Vec<f64> = group.iter().map(|&i| values[i]).collect();
        let s = sample_std(&sample);
        for &i in &group {
            out[i] = s;
        }
    }
    Ok(out)
}

/// Sample standard deviation with ddof = 1.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let m = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1.0);
    Some(var.sqrt())
}
