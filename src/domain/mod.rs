//! Domain Layer - Core value types and return/statistics logic
//!
//! This module contains pure domain types and logic with no I/O.
//! All external interactions happen through the ports layer.
//!
//! - `series`: date-indexed `TimeSeries`, `PricePoint`, `PriceHistory`
//! - `signal`: binary exposure signals
//! - `returns`: return compounder (lagged strategy returns, buy-and-hold, growth)
//! - `performance`: mean, stddev, skew, excess kurtosis, Sharpe
//! - `error`: error taxonomy shared by every stage

pub mod error;
pub mod series;
pub mod signal;
pub mod returns;
pub mod performance;

pub use error::{BacktestError, BacktestResult};
pub use series::{AlignmentPolicy, GrowthSeries, PriceHistory, PricePoint, ReturnSeries, TimeSeries};
pub use signal::{exposure, to_binary, transitions, Signal};
pub use returns::{
    annual_to_periodic, buy_and_hold_returns, compound_growth, daily_risk_free_returns,
    simple_returns, strategy_returns, validate_weight,
};
pub use performance::{max_drawdown, summarize, summarize_values, total_return, PerformanceSummary};
