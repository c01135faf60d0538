use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{BacktestError, TimeSeries};

/// Price provider error type
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Data parsing error: {0}")]
    Parse(String),

    #[error("No observations for symbol '{0}' in the requested range")]
    SymbolNotFound(String),

    #[error("Invalid series for '{symbol}': {source}")]
    InvalidSeries {
        symbol: String,
        #[source]
        source: BacktestError,
    },
}

/// Historical series query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesQuery {
    pub symbol: String,
    /// Inclusive bounds; `None` leaves the side open
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl SeriesQuery {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            start: None,
            end: None,
        }
    }

    pub fn with_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

/// Source of daily adjusted price (or yield) series
#[async_trait]
pub trait PriceSeriesProvider: Send + Sync {
    /// Fetch one series, sorted by date with unique dates
    async fn fetch_series(&self, query: &SeriesQuery) -> Result<TimeSeries<f64>, ProviderError>;

    /// Provider name for logging
    fn name(&self) -> &str;
}
