use thiserror::Error;

use crate::application::PipelineReport;

/// Report output error type
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Nothing to write: {0}")]
    Empty(String),
}

/// Destination for a finished pipeline report
pub trait ReportSink {
    fn write_report(&mut self, report: &PipelineReport) -> Result<(), ReportError>;

    /// Sink name for logging
    fn name(&self) -> &str;
}
