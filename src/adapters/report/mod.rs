//! Report Adapters
//!
//! `ReportSink` implementations for a finished pipeline report:
//! - `GrowthCsvExporter`: wide CSV of every variant's growth curve
//! - `SummaryJsonExporter`: summary statistics as pretty JSON
//! - `ConsoleTable`: comparison table on stdout

mod console;
mod csv_export;
mod json_export;

pub use console::ConsoleTable;
pub use csv_export::GrowthCsvExporter;
pub use json_export::{SummaryDocument, SummaryJsonExporter, VariantRecord};
