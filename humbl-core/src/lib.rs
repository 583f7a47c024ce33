//! humbl core — channel, volatility and regime computations.
//!
//! This crate contains the quantitative pipeline:
//! - Domain types (price bars, macro observations, regimes)
//! - Window strings and the backward-anchored window indexer
//! - Return and cumulative-deviate algebra
//! - Realized-volatility estimators, bucketing and filtering
//! - humblCHANNEL, point-in-time and historical
//! - Momentum signals
//! - humblCOMPASS regime classification
//! - Provider traits, polars conversion and synthetic data

pub mod bucket;
pub mod channel;
pub mod compass;
pub mod data;
pub mod domain;
pub mod error;
pub mod momentum;
pub mod transforms;
pub mod volatility;
pub mod window;

pub use channel::{
    calc_humbl_channel, calc_humbl_channel_historical, ChannelConfig, ChannelResult, RsMethod,
};
pub use compass::{classify_regime, CompassConfig, RegimeLabel};
pub use domain::{MacroObservation, PriceBar, Regime};
pub use error::HumblError;
pub use momentum::{calc_momentum, MomentumMethod, MomentumPoint};
pub use volatility::{realized_volatility, Estimator, VolatilityOptions, VolatilitySeries};
pub use window::{WindowSpec, WindowUnit};
