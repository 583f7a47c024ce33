//! humbl runner: regime backtests, performance metrics, configuration and
//! the toolbox facade.
//!
//! This crate builds on `humbl-core` to provide:
//! - The regime backtest engine (daily assignment, instances, drawdowns,
//!   investment growth, per-regime summary)
//! - Pure performance-metric helpers
//! - `ToolboxConfig`, loadable from TOML
//! - `Toolbox`, which runs the channel, compass and backtest over data providers

pub mod backtest;
pub mod config;
pub mod error;
pub mod metrics;
pub mod toolbox;

pub use backtest::{
    run_backtest, BacktestOutput, BacktestSummary, DailyRegime, RegimeDateRange, RegimeInstance,
};
pub use config::{BacktestConfig, ConfigError, ConfigId, ToolboxConfig};
pub use error::ToolboxError;
pub use toolbox::{ChannelOutput, Toolbox};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn backtest_types_are_send_sync() {
        assert_send::<BacktestOutput>();
        assert_sync::<BacktestOutput>();
        assert_send::<BacktestSummary>();
        assert_sync::<BacktestSummary>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<ToolboxConfig>();
        assert_sync::<ToolboxConfig>();
    }

    #[test]
    fn toolbox_is_send_sync() {
        assert_send::<Toolbox>();
        assert_sync::<Toolbox>();
        assert_send::<ToolboxError>();
        assert_sync::<ToolboxError>();
    }
}
