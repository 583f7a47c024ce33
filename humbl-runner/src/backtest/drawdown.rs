//! Drawdown episodes within a regime instance.
//!
//! An episode starts on the first close below the running peak and ends on
//! the next close at or above that peak. Drawdowns are negative percentages.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::metrics::{drawdown_pct, mean_f64};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawdownEpisode {
    pub start_date: NaiveDate,
    /// Deepest drawdown of the episode.
    pub max_drawdown_pct: f64,
    /// Mean drawdown over the episode's days.
    pub avg_drawdown_pct: f64,
    /// Calendar days from the episode start to the recovering close; `None`
    /// while still under water at the end of the instance.
    pub recovery_days: Option<i64>,
}

/// Drawdown summary of one instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawdownStats {
    /// Worst drawdown of the instance; 0 when the price never fell below its peak.
    pub max_drawdown_pct: f64,
    pub episodes: Vec<DrawdownEpisode>,
}

struct Open {
    start_date: NaiveDate,
    depths: Vec<f64>,
}

impl Open {
    fn close(self, recovered_on: Option<NaiveDate>) -> DrawdownEpisode {
        DrawdownEpisode {
            start_date: self.start_date,
            max_drawdown_pct: self.depths.iter().copied().fold(0.0, f64::min),
            avg_drawdown_pct: mean_f64(&self.depths).unwrap_or(0.0),
            recovery_days: recovered_on.map(|d| (d - self.start_date).num_days()),
        }
    }
}

/// Episodes of a price path with the running peak reset at its first close.
pub fn drawdown_stats(dates: &[NaiveDate], closes: &[f64]) -> DrawdownStats {
    let dd = drawdown_pct(closes);
    let mut episodes = Vec::new();
    let mut open: Option<Open> = None;

    for (&date, &depth) in dates.iter().zip(&dd) {
        if depth >= 0.0 {
            if let Some(ep) = open.take() {
                episodes.push(ep.close(Some(date)));
            }
            continue;
        }
        open.get_or_insert_with(|| Open {
            start_date: date,
            depths: Vec::new(),
        })
        .depths
        .push(depth);
    }
    if let Some(ep) = open {
        episodes.push(ep.close(None));
    }

    DrawdownStats {
        max_drawdown_pct: dd.iter().copied().fold(0.0, f64::min),
        episodes,
    }
}
