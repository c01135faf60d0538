//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - Historical price and yield series (CSV files, in-memory fixtures)
//! - Report outputs (growth CSV, summary JSON, console table)

pub mod market_data;
pub mod report;
pub mod mocks;

// Re-export main traits and types
pub use market_data::{PriceSeriesProvider, ProviderError, SeriesQuery};
pub use report::{ReportError, ReportSink};
