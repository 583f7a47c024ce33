//! Forward-fill of monthly regime labels onto daily prices.

use chrono::NaiveDate;

use humbl_core::compass::{month_start, RegimeLabel};
use humbl_core::{HumblError, PriceBar, Regime};

use super::DailyRegime;

/// Monthly regimes of one country, sorted by month start.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegimeCalendar {
    months: Vec<NaiveDate>,
    regimes: Vec<Option<Regime>>,
}

impl RegimeCalendar {
    /// Build from compass output. Labels must all share one country; the
    /// first label of a repeated month wins.
    pub fn from_labels(labels: &[RegimeLabel]) -> Result<Self, HumblError> {
        if let Some(first) = labels.first() {
            if let Some(other) = labels.iter().find(|l| l.country != first.country) {
                return Err(HumblError::InvalidParameter(format!(
                    "regime labels mix countries '{}' and '{}'",
                    first.country, other.country
                )));
            }
        }
        let mut rows: Vec<(NaiveDate, Option<Regime>)> = labels
            .iter()
            .map(|l| (month_start(l.date_month_start), l.humbl_regime))
            .collect();
        rows.sort_by_key(|r| r.0);
        rows.dedup_by_key(|r| r.0);
        let (months, regimes) = rows.into_iter().unzip();
        Ok(Self { months, regimes })
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    /// The regime whose month covers `date`; the last month extends to the
    /// end of time. Dates before the first month have none.
    pub fn regime_on(&self, date: NaiveDate) -> Option<Regime> {
        let covering = self.months.partition_point(|m| *m <= date);
        covering.checked_sub(1).and_then(|i| self.regimes[i])
    }
}

/// One daily row per canonical bar with its regime; per-day metrics are
/// filled in later.
pub fn assign_daily(bars: &[PriceBar], calendar: &RegimeCalendar) -> Vec<DailyRegime> {
    bars.iter()
        .map(|bar| DailyRegime {
            symbol: bar.symbol.clone(),
            date: bar.date,
            close: bar.close,
            humbl_regime: calendar.regime_on(bar.date),
            regime_instance_id: 0,
            daily_return: None,
            log_return: None,
            volatility_pct: None,
        })
        .collect()
}
