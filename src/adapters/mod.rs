//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Market Data: CSV price and yield files
//! - Report: growth CSV, summary JSON, console table
//! - CLI: Command-line interface handlers

pub mod cli;
pub mod market_data;
pub mod report;

pub use cli::CliApp;
pub use market_data::CsvPriceProvider;
pub use report::{ConsoleTable, GrowthCsvExporter, SummaryJsonExporter};
