//! humblCHANNEL: the rescaled-range price channel.
//!
//! The pipeline, per symbol:
//! 1. window index anchored at the last date
//! 2. log returns, per-window mean, detrended returns
//! 3. cumulative deviate per window (checked to close at ~0), its range and std
//! 4. optionally keep only rows in today's realized-volatility bucket
//! 5. R/S per window, projected onto price with an asymmetric modifier

pub mod engine;
pub mod historical;

pub use engine::calc_humbl_channel;
pub use historical::calc_humbl_channel_historical;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::bucket::{DEFAULT_HI_QUANTILE, DEFAULT_LO_QUANTILE};
use crate::domain::PriceBar;
use crate::error::HumblError;
use crate::momentum::MomentumMethod;
use crate::volatility::{Estimator, VolatilityOptions};
use crate::window::WindowSpec;

/// Which R/S statistic projects the historical range onto price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RsMethod {
    /// R/S of the most recent retained window.
    #[default]
    #[serde(rename = "RS")]
    Rs,
    #[serde(rename = "RS_mean")]
    RsMean,
    #[serde(rename = "RS_max")]
    RsMax,
    #[serde(rename = "RS_min")]
    RsMin,
}

impl fmt::Display for RsMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RsMethod::Rs => "RS",
            RsMethod::RsMean => "RS_mean",
            RsMethod::RsMax => "RS_max",
            RsMethod::RsMin => "RS_min",
        })
    }
}

impl FromStr for RsMethod {
    type Err = HumblError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RS" => Ok(RsMethod::Rs),
            "RS_mean" => Ok(RsMethod::RsMean),
            "RS_max" => Ok(RsMethod::RsMax),
            "RS_min" => Ok(RsMethod::RsMin),
            other => Err(HumblError::InvalidMethod {
                kind: "rs_method",
                value: other.to_string(),
                expected: "RS, RS_mean, RS_max, RS_min",
            }),
        }
    }
}

/// Channel parameters, passed explicitly to every entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub window: WindowSpec,
    pub rv_method: Estimator,
    pub rs_method: RsMethod,
    /// Restrict R/S statistics to rows in the current volatility bucket.
    pub rv_adjustment: bool,
    /// Average the volatility estimator over several window lengths.
    pub rv_grouped_mean: bool,
    /// Price the channel off the second-to-last close.
    pub yesterday_close: bool,
    /// Price the channel off a live quote.
    pub live_price: bool,
    /// One channel row per trailing date instead of one per symbol.
    pub historical: bool,
    /// Momentum joined alongside the channel; `None` skips it.
    pub momentum: Option<MomentumMethod>,
    pub lo_quantile: f64,
    pub hi_quantile: f64,
    pub volatility: VolatilityOptions,
    /// Worker cap for the historical fan-out; `None` uses the global pool.
    pub max_workers: Option<usize>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            window: WindowSpec::new(1, crate::window::WindowUnit::Month),
            rv_method: Estimator::Std,
            rs_method: RsMethod::Rs,
            rv_adjustment: true,
            rv_grouped_mean: false,
            yesterday_close: false,
            live_price: false,
            historical: false,
            momentum: Some(MomentumMethod::Shift),
            lo_quantile: DEFAULT_LO_QUANTILE,
            hi_quantile: DEFAULT_HI_QUANTILE,
            volatility: VolatilityOptions::default(),
            max_workers: None,
        }
    }
}

impl ChannelConfig {
    /// Fail-fast checks against the configuration and the input shape.
    pub fn validate(&self, bars: &[PriceBar]) -> Result<(), HumblError> {
        self.window.months("the channel window index")?;
        if !(0.0 < self.lo_quantile && self.lo_quantile < self.hi_quantile && self.hi_quantile < 1.0) {
            return Err(HumblError::InvalidParameter(format!(
                "bucket quantiles must satisfy 0 < lo < hi < 1, got {} and {}",
                self.lo_quantile, self.hi_quantile
            )));
        }
        if self.max_workers == Some(0) {
            return Err(HumblError::InvalidParameter("max_workers must be at least 1".into()));
        }
        if self.rv_adjustment {
            self.rv_method.check_inputs(bars)?;
        }
        Ok(())
    }
}

/// One channel row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelResult {
    pub date: NaiveDate,
    pub symbol: String,
    pub bottom_price: Option<f64>,
    pub recent_price: f64,
    pub top_price: Option<f64>,
    pub momentum_signal: Option<i8>,
}
