//! Delimited-text price provider
//!
//! Reads a long-format CSV with one observation per row:
//!
//! ```text
//! date,symbol,adjusted_price
//! 1993-01-29,SPY,24.68
//! 1993-01-29,IRX,2.96
//! ```
//!
//! Yields for the risk-free symbol are annual percentages in the same column.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::domain::TimeSeries;
use crate::ports::{PriceSeriesProvider, ProviderError, SeriesQuery};

#[derive(Debug, Deserialize)]
struct PriceRow {
    date: NaiveDate,
    symbol: String,
    #[serde(alias = "adj_close", alias = "close", alias = "value")]
    adjusted_price: f64,
}

/// Price provider backed by one CSV file
#[derive(Debug, Clone)]
pub struct CsvPriceProvider {
    path: PathBuf,
    delimiter: u8,
}

impl CsvPriceProvider {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            delimiter: b',',
        }
    }

    /// Use another field delimiter (e.g. `b'\t'`)
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&self, bytes: &[u8], query: &SeriesQuery) -> Result<Vec<(NaiveDate, f64)>, ProviderError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let mut points = Vec::new();
        for (line, result) in reader.deserialize::<PriceRow>().enumerate() {
            // +2: header row and 1-based numbering
            let row = result.map_err(|e| ProviderError::Parse(format!("row {}: {}", line + 2, e)))?;
            if row.symbol == query.symbol && query.contains(row.date) {
                points.push((row.date, row.adjusted_price));
            }
        }
        Ok(points)
    }
}

#[async_trait]
impl PriceSeriesProvider for CsvPriceProvider {
    async fn fetch_series(&self, query: &SeriesQuery) -> Result<TimeSeries<f64>, ProviderError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|source| ProviderError::Io {
            path: self.path.clone(),
            source,
        })?;

        let points = self.parse(&bytes, query)?;
        if points.is_empty() {
            return Err(ProviderError::SymbolNotFound(query.symbol.clone()));
        }

        tracing::debug!(
            "Read {} rows for {} from {}",
            points.len(),
            query.symbol,
            self.path.display()
        );
        Ok(TimeSeries::from_unsorted(points))
    }

    fn name(&self) -> &str {
        "csv"
    }
}
