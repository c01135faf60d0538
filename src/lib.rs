//! Index Timing - Moving-Average Crossover Backtester Library
//!
//! Backtests trend-following rules on a daily equity index, holding a
//! risk-free asset when out of the market.
//!
//! # Modules
//!
//! - `domain`: Core value types and logic (TimeSeries, PriceHistory, returns, statistics)
//! - `ports`: Trait abstractions (PriceSeriesProvider, ReportSink)
//! - `strategy`: Signal generation (rolling statistics, SMA crossover, z-score gate)
//! - `adapters`: External implementations (CSV prices, report writers, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Strategy pipeline and backtest orchestrator

pub mod domain;
pub mod ports;
pub mod strategy;
pub mod adapters;
pub mod config;
pub mod application;
