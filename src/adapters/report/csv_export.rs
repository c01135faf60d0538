//! Growth curves as one wide CSV: `date,<variant>,<variant>,...`
//!
//! Variants start compounding on different dates (warm-up), so cells before a
//! variant's first defined return are left empty.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::application::PipelineReport;
use crate::ports::{ReportError, ReportSink};

/// Writes every successful variant's growth curve to a CSV file
#[derive(Debug, Clone)]
pub struct GrowthCsvExporter {
    path: PathBuf,
}

impl GrowthCsvExporter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Write the wide table to any writer
    pub fn write_to<W: Write>(report: &PipelineReport, writer: W) -> Result<(), ReportError> {
        let results: Vec<_> = report.successes().collect();
        if results.is_empty() {
            return Err(ReportError::Empty("no variant produced a growth curve".to_string()));
        }

        let mut rows: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();
        for (col, result) in results.iter().enumerate() {
            for (date, &growth) in result.growth.iter() {
                rows.entry(date).or_insert_with(|| vec![None; results.len()])[col] = Some(growth);
            }
        }

        let mut wtr = csv::Writer::from_writer(writer);
        let mut header = vec!["date".to_string()];
        header.extend(results.iter().map(|r| r.variant.to_string()));
        wtr.write_record(&header)?;

        for (date, values) in &rows {
            let mut record = vec![date.format("%Y-%m-%d").to_string()];
            record.extend(values.iter().map(|v| v.map(|g| g.to_string()).unwrap_or_default()));
            wtr.write_record(&record)?;
        }

        wtr.flush()?;
        Ok(())
    }
}

impl ReportSink for GrowthCsvExporter {
    fn write_report(&mut self, report: &PipelineReport) -> Result<(), ReportError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(&self.path)?;
        Self::write_to(report, file)?;
        tracing::info!("Growth curves written to {}", self.path.display());
        Ok(())
    }

    fn name(&self) -> &str {
        "growth-csv"
    }
}
