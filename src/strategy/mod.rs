//! Strategy Layer - Rolling Statistics and Signal Generation
//!
//! Turns a raw price series into binary exposure signals:
//! - Rolling mean / sample standard deviation over trailing windows
//! - SMA crossover (fast > slow)
//! - Z-score gate on the price/slow-SMA spread
//! - Conjunction of trend and z-score signals
//!
//! Every signal value at date d depends only on the rolling statistics at d
//! (plus the prior z-scores for the gate); the one-day execution lag lives in
//! the return compounder.

pub mod params;
pub mod rolling;
pub mod crossover;
pub mod zscore_gate;
pub mod combined;

pub use params::{
    PipelineConfig, RollingWindowConfig, Variant, WindowAlignment, ZScoreFilterConfig,
    ZScoreNormalization, TRADING_DAYS_PER_YEAR,
};
pub use rolling::{rolling_mean, rolling_stddev, RollingWindow};
pub use crossover::{cross_events, sma_crossover_signal, CrossEvent};
pub use zscore_gate::{zscore_filter_signal, ZScoreGate, ZScoreSeries};
pub use combined::combined_signal;
