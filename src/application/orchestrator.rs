//! Backtest Orchestrator
//!
//! Loads the asset and risk-free series from a price provider, joins them into
//! one history, runs the strategy pipeline and hands the report to the sinks.

use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;

use crate::application::pipeline::{PipelineReport, StrategyPipeline};
use crate::domain::{AlignmentPolicy, BacktestError, PriceHistory};
use crate::ports::{PriceSeriesProvider, ProviderError, ReportError, ReportSink, SeriesQuery};
use crate::strategy::PipelineConfig;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Price data error: {0}")]
    Provider(#[from] ProviderError),
    #[error("Backtest error: {0}")]
    Backtest(#[from] BacktestError),
    #[error("Report error ({sink}): {source}")]
    Report {
        sink: String,
        #[source]
        source: ReportError,
    },
}

/// Which series to load and how to join them
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRequest {
    pub asset_symbol: String,
    pub risk_free_symbol: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub alignment: AlignmentPolicy,
}

impl HistoryRequest {
    pub fn new(asset_symbol: impl Into<String>, risk_free_symbol: impl Into<String>) -> Self {
        Self {
            asset_symbol: asset_symbol.into(),
            risk_free_symbol: risk_free_symbol.into(),
            start: None,
            end: None,
            alignment: AlignmentPolicy::default(),
        }
    }

    pub fn with_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn with_alignment(mut self, alignment: AlignmentPolicy) -> Self {
        self.alignment = alignment;
        self
    }

    fn query(&self, symbol: &str) -> SeriesQuery {
        SeriesQuery::new(symbol).with_range(self.start, self.end)
    }
}

/// Coordinates data loading, the pipeline and report output
pub struct BacktestOrchestrator {
    provider: Arc<dyn PriceSeriesProvider>,
    request: HistoryRequest,
    pipeline: StrategyPipeline,
}

impl BacktestOrchestrator {
    pub fn new(
        provider: Arc<dyn PriceSeriesProvider>,
        request: HistoryRequest,
        config: PipelineConfig,
    ) -> Result<Self, OrchestratorError> {
        let pipeline = StrategyPipeline::new(config)?;
        Ok(Self {
            provider,
            request,
            pipeline,
        })
    }

    pub fn pipeline(&self) -> &StrategyPipeline {
        &self.pipeline
    }

    /// Fetch both series concurrently and join them on date
    pub async fn load_history(&self) -> Result<PriceHistory, OrchestratorError> {
        let asset_query = self.request.query(&self.request.asset_symbol);
        let rf_query = self.request.query(&self.request.risk_free_symbol);

        tracing::info!(
            "Loading {} and {} from {}",
            asset_query.symbol,
            rf_query.symbol,
            self.provider.name()
        );

        let (asset, risk_free) = tokio::try_join!(
            self.provider.fetch_series(&asset_query),
            self.provider.fetch_series(&rf_query),
        )?;

        let history = PriceHistory::from_series(&asset, &risk_free, self.request.alignment)?;
        tracing::info!(
            rows = history.len(),
            first = ?history.points().first().map(|p| p.date),
            last = ?history.points().last().map(|p| p.date),
            "Price history loaded"
        );
        Ok(history)
    }

    /// Load the history and run every configured variant
    pub async fn run(&self) -> Result<PipelineReport, OrchestratorError> {
        let history = self.load_history().await?;
        Ok(self.pipeline.run(&history)?)
    }

    /// Write the report to every sink, stopping at the first failure
    pub fn publish(
        &self,
        report: &PipelineReport,
        sinks: &mut [Box<dyn ReportSink>],
    ) -> Result<(), OrchestratorError> {
        for sink in sinks.iter_mut() {
            sink.write_report(report).map_err(|source| OrchestratorError::Report {
                sink: sink.name().to_string(),
                source,
            })?;
            tracing::debug!("Report written to {}", sink.name());
        }
        Ok(())
    }
}
