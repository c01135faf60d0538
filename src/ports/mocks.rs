//! In-memory port implementations for tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::application::PipelineReport;
use crate::domain::TimeSeries;
use crate::ports::market_data::{PriceSeriesProvider, ProviderError, SeriesQuery};
use crate::ports::report::{ReportError, ReportSink};
use crate::strategy::Variant;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Price provider that records queries and serves configured series
#[derive(Debug, Default, Clone)]
pub struct InMemoryPriceProvider {
    calls: Arc<Mutex<Vec<SeriesQuery>>>,
    series: Arc<Mutex<HashMap<String, Vec<(NaiveDate, f64)>>>>,
}

impl InMemoryPriceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the observations for a symbol
    pub fn with_series(self, symbol: &str, points: Vec<(NaiveDate, f64)>) -> Self {
        lock(&self.series).insert(symbol.to_string(), points);
        self
    }

    /// Get all recorded queries
    pub fn get_calls(&self) -> Vec<SeriesQuery> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl PriceSeriesProvider for InMemoryPriceProvider {
    async fn fetch_series(&self, query: &SeriesQuery) -> Result<TimeSeries<f64>, ProviderError> {
        lock(&self.calls).push(query.clone());

        let points: Vec<(NaiveDate, f64)> = lock(&self.series)
            .get(&query.symbol)
            .map(|pts| pts.iter().copied().filter(|(d, _)| query.contains(*d)).collect())
            .unwrap_or_default();

        if points.is_empty() {
            return Err(ProviderError::SymbolNotFound(query.symbol.clone()));
        }
        Ok(TimeSeries::from_unsorted(points))
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

/// Report sink that records the variants of every report it receives
#[derive(Debug, Default, Clone)]
pub struct RecordingReportSink {
    reports: Arc<Mutex<Vec<Vec<Variant>>>>,
    fail_with: Option<String>,
}

impl RecordingReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to make every write fail
    pub fn failing(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_string());
        self
    }

    pub fn get_reports(&self) -> Vec<Vec<Variant>> {
        lock(&self.reports).clone()
    }
}

impl ReportSink for RecordingReportSink {
    fn write_report(&mut self, report: &PipelineReport) -> Result<(), ReportError> {
        if let Some(message) = &self.fail_with {
            return Err(ReportError::Empty(message.clone()));
        }
        lock(&self.reports).push(report.iter().map(|(v, _)| v).collect());
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}
