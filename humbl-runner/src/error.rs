use thiserror::Error;

use crate::config::ConfigError;
use humbl_core::data::DataError;
use humbl_core::HumblError;

/// Errors from the toolbox and the backtest engine.
#[derive(Debug, Error)]
pub enum ToolboxError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error(transparent)]
    Compute(#[from] HumblError),
}
