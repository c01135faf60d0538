//! Variant summaries as pretty JSON

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::application::{PipelineReport, Stage};
use crate::domain::total_return;
use crate::ports::{ReportError, ReportSink};
use crate::strategy::Variant;

#[derive(Debug, Serialize)]
pub struct SummaryDocument {
    pub periods_per_year: u32,
    pub risk_free_rate_per_period: f64,
    pub variants: Vec<VariantRecord>,
}

#[derive(Debug, Serialize)]
pub struct VariantRecord {
    pub variant: Variant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<StatisticsRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorRecord>,
}

#[derive(Debug, Serialize)]
pub struct StatisticsRecord {
    pub observations: usize,
    pub mean: f64,
    pub stddev: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    pub sharpe: f64,
    pub annualized_sharpe: f64,
    pub sharpe_risk_free_rate: f64,
    pub total_return: Option<f64>,
    pub max_drawdown: f64,
    pub exposure: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ErrorRecord {
    pub stage: Stage,
    pub message: String,
}

impl From<&PipelineReport> for SummaryDocument {
    fn from(report: &PipelineReport) -> Self {
        let variants = report
            .iter()
            .map(|(variant, result)| match result {
                Ok(r) => VariantRecord {
                    variant,
                    statistics: Some(StatisticsRecord {
                        observations: r.summary.observations,
                        mean: r.summary.mean,
                        stddev: r.summary.stddev,
                        skewness: r.summary.skewness,
                        kurtosis: r.summary.kurtosis,
                        sharpe: r.summary.sharpe,
                        annualized_sharpe: r.summary.annualized_sharpe(report.periods_per_year),
                        sharpe_risk_free_rate: r.sharpe_risk_free_rate,
                        total_return: total_return(&r.growth),
                        max_drawdown: r.max_drawdown,
                        exposure: r.exposure(),
                    }),
                    error: None,
                },
                Err(e) => VariantRecord {
                    variant,
                    statistics: None,
                    error: Some(ErrorRecord {
                        stage: e.stage,
                        message: e.source.to_string(),
                    }),
                },
            })
            .collect();

        Self {
            periods_per_year: report.periods_per_year,
            risk_free_rate_per_period: report.risk_free_rate_per_period,
            variants,
        }
    }
}

/// Writes the summary document to a JSON file
#[derive(Debug, Clone)]
pub struct SummaryJsonExporter {
    path: PathBuf,
}

impl SummaryJsonExporter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn write_to<W: Write>(report: &PipelineReport, writer: W) -> Result<(), ReportError> {
        serde_json::to_writer_pretty(writer, &SummaryDocument::from(report))?;
        Ok(())
    }
}

impl ReportSink for SummaryJsonExporter {
    fn write_report(&mut self, report: &PipelineReport) -> Result<(), ReportError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(&self.path)?;
        Self::write_to(report, file)?;
        tracing::info!("Summary written to {}", self.path.display());
        Ok(())
    }

    fn name(&self) -> &str {
        "summary-json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::report::test_support::{create_short_report, create_test_report};

    #[test]
    fn test_summary_document() {
        let mut buf = Vec::new();
        SummaryJsonExporter::write_to(&create_test_report(), &mut buf).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(json["periods_per_year"], 252);
        let variants = json["variants"].as_array().unwrap();
        assert_eq!(variants.len(), 3);
        assert_eq!(variants[0]["variant"], "buy_hold");
        assert!(variants[0]["statistics"]["sharpe"].is_number());
        assert!(variants[0]["statistics"]["sharpe_risk_free_rate"].is_number());
        assert!(variants[0]["statistics"]["exposure"].is_null());
        assert!(variants[1]["statistics"]["exposure"].is_number());
        assert!(variants[0].get("error").is_none());
    }

    #[test]
    fn test_failed_variant_carries_stage() {
        let mut buf = Vec::new();
        SummaryJsonExporter::write_to(&create_short_report(), &mut buf).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        let crossover = &json["variants"][1];
        assert_eq!(crossover["error"]["stage"], "rolling");
        assert!(crossover.get("statistics").is_none());
    }
}
