//! Console summary table

use std::fmt::Write as _;

use crate::application::PipelineReport;
use crate::domain::total_return;
use crate::ports::{ReportError, ReportSink};

/// Prints a fixed-width comparison table to stdout
#[derive(Debug, Default, Clone)]
pub struct ConsoleTable;

impl ConsoleTable {
    pub fn new() -> Self {
        Self
    }

    /// Render the table without printing it
    pub fn render(report: &PipelineReport) -> String {
        let mut out = String::new();
        let ppy = report.periods_per_year;

        let _ = writeln!(
            out,
            "{:<16} {:>6} {:>10} {:>10} {:>8} {:>8} {:>8} {:>8} {:>9} {:>9} {:>8}",
            "variant", "obs", "mean", "stddev", "skew", "kurt", "sharpe", "ann.SR", "total", "max_dd", "exposure"
        );
        let _ = writeln!(out, "{}", "-".repeat(110));

        for (variant, result) in report.iter() {
            match result {
                Ok(r) => {
                    let s = &r.summary;
                    let total = total_return(&r.growth)
                        .map(|t| format!("{:.2}%", t * 100.0))
                        .unwrap_or_else(|| "-".to_string());
                    let exposure = r
                        .exposure()
                        .map(|e| format!("{:.1}%", e * 100.0))
                        .unwrap_or_else(|| "-".to_string());
                    let _ = writeln!(
                        out,
                        "{:<16} {:>6} {:>10.6} {:>10.6} {:>8.3} {:>8.3} {:>8.4} {:>8.3} {:>9} {:>8.2}% {:>8}",
                        variant.name(),
                        s.observations,
                        s.mean,
                        s.stddev,
                        s.skewness,
                        s.kurtosis,
                        s.sharpe,
                        s.annualized_sharpe(ppy),
                        total,
                        r.max_drawdown * 100.0,
                        exposure
                    );
                }
                Err(e) => {
                    let _ = writeln!(out, "{:<16} FAILED at {} stage: {}", variant.name(), e.stage, e.source);
                }
            }
        }

        let _ = writeln!(
            out,
            "\nrisk-free per period, full history: {:.6}% ({} periods/year)",
            report.risk_free_rate_per_period * 100.0,
            ppy
        );
        out
    }
}

impl ReportSink for ConsoleTable {
    fn write_report(&mut self, report: &PipelineReport) -> Result<(), ReportError> {
        println!("{}", Self::render(report));
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::report::test_support::{create_short_report, create_test_report};

    #[test]
    fn test_render_lists_variants_in_order() {
        let table = ConsoleTable::render(&create_test_report());
        let rows: Vec<&str> = table.lines().skip(2).take(3).collect();
        assert!(rows[0].starts_with("buy_hold"));
        assert!(rows[1].starts_with("sma_crossover"));
        assert!(rows[2].starts_with("sma_plus_zscore"));
    }

    #[test]
    fn test_render_failed_variant() {
        let table = ConsoleTable::render(&create_short_report());
        assert!(table.contains("sma_crossover    FAILED at rolling stage"));
    }
}
