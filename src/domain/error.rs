//! Backtest Errors
//!
//! Every core component validates its own inputs and fails with one of these
//! kinds instead of substituting NaN or zero.

use thiserror::Error;

/// Error kinds raised by the rolling, signal, return and statistics stages
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BacktestError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Insufficient data: {required} observations required, {available} available")]
    InsufficientData { required: usize, available: usize },

    #[error("Statistics undefined: {0}")]
    StatisticsUndefined(String),

    #[error("Alignment error: {0}")]
    Alignment(String),
}

impl BacktestError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn undefined(msg: impl Into<String>) -> Self {
        Self::StatisticsUndefined(msg.into())
    }

    pub fn alignment(msg: impl Into<String>) -> Self {
        Self::Alignment(msg.into())
    }
}

pub type BacktestResult<T> = Result<T, BacktestError>;
