//! Domain error type shared by every computation in the core.

use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors raised by the quantitative pipeline.
///
/// Configuration problems (bad window strings, unknown method names, missing
/// columns) are raised before any computation starts.
#[derive(Debug, Error)]
pub enum HumblError {
    #[error("invalid window '{window}': {reason}")]
    InvalidWindow { window: String, reason: String },

    #[error("window unit '{unit}' is not supported for {context}")]
    UnsupportedWindowUnit { unit: String, context: &'static str },

    #[error("invalid {kind} '{value}', expected one of: {expected}")]
    InvalidMethod {
        kind: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("{context} requires columns {missing:?} which are absent")]
    MissingColumns {
        context: String,
        missing: Vec<String>,
    },

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("column length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("frame error: {0}")]
    Frame(#[from] PolarsError),

    #[error("worker pool error: {0}")]
    WorkerPool(String),
}

impl HumblError {
    pub(crate) fn missing(context: impl Into<String>, missing: Vec<&str>) -> Self {
        HumblError::MissingColumns {
            context: context.into(),
            missing: missing.into_iter().map(String::from).collect(),
        }
    }
}
