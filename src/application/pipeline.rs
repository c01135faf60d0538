//! Strategy Pipeline
//!
//! Wires rolling statistics -> signals -> compounded returns -> statistics for
//! every requested variant. Rolling means and the crossover signal are
//! computed once and shared by the variants that need them.
//!
//! A failing variant (e.g. not enough history for the slow window) does not
//! stop the others; its entry carries the stage and the cause instead.

use std::fmt;

use serde::Serialize;
use statrs::statistics::Statistics;
use thiserror::Error;

use crate::domain::{
    annual_to_periodic, buy_and_hold_returns, compound_growth, daily_risk_free_returns, exposure,
    max_drawdown, simple_returns, strategy_returns, summarize, BacktestError, BacktestResult,
    GrowthSeries, PerformanceSummary, PriceHistory, ReturnSeries, Signal, TimeSeries,
};
use crate::strategy::{
    combined_signal, sma_crossover_signal, PipelineConfig, RollingWindow, RollingWindowConfig, Variant,
    ZScoreGate,
};

/// Pipeline stage at which a variant failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Rolling,
    Signal,
    Returns,
    Growth,
    Performance,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Rolling => "rolling",
            Stage::Signal => "signal",
            Stage::Returns => "returns",
            Stage::Growth => "growth",
            Stage::Performance => "performance",
        };
        f.write_str(name)
    }
}

/// Failure of one variant, tagged with its stage
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{variant} failed at {stage} stage: {source}")]
pub struct VariantError {
    pub variant: Variant,
    pub stage: Stage,
    #[source]
    pub source: BacktestError,
}

/// Output bundle of one variant
#[derive(Debug, Clone, PartialEq)]
pub struct VariantResult {
    pub variant: Variant,
    /// Exposure signal before the execution lag; `None` for buy-and-hold
    pub signal: Option<Signal>,
    pub returns: ReturnSeries,
    pub growth: GrowthSeries,
    pub summary: PerformanceSummary,
    pub max_drawdown: f64,
    /// Per-period risk-free rate this variant's Sharpe ratio is measured against
    pub sharpe_risk_free_rate: f64,
}

impl VariantResult {
    /// Fraction of defined signal days in the asset
    pub fn exposure(&self) -> Option<f64> {
        self.signal.as_ref().and_then(exposure)
    }

    pub fn final_growth(&self) -> f64 {
        self.growth.values().last().copied().unwrap_or(1.0)
    }
}

/// Per-variant outcomes in the configured order
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    /// Per-period risk-free rate over the whole history. Without a configured
    /// rate each variant averages only its own defined return days, see
    /// `VariantResult::sharpe_risk_free_rate`.
    pub risk_free_rate_per_period: f64,
    pub periods_per_year: u32,
    entries: Vec<(Variant, Result<VariantResult, VariantError>)>,
}

impl PipelineReport {
    pub fn get(&self, variant: Variant) -> Option<&Result<VariantResult, VariantError>> {
        self.entries.iter().find(|(v, _)| *v == variant).map(|(_, r)| r)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Variant, &Result<VariantResult, VariantError>)> + '_ {
        self.entries.iter().map(|(v, r)| (*v, r))
    }

    pub fn successes(&self) -> impl Iterator<Item = &VariantResult> + '_ {
        self.entries.iter().filter_map(|(_, r)| r.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &VariantError> + '_ {
        self.entries.iter().filter_map(|(_, r)| r.as_ref().err())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Rolling outputs shared by the signal-driven variants
struct TrendInputs {
    slow_sma: TimeSeries<Option<f64>>,
    crossover: Signal,
}

/// Runs the configured strategy variants over one price history
#[derive(Debug, Clone)]
pub struct StrategyPipeline {
    config: PipelineConfig,
}

impl StrategyPipeline {
    pub fn new(config: PipelineConfig) -> BacktestResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every configured variant.
    ///
    /// Fails as a whole only when the history has fewer than two rows; all
    /// other failures are reported per variant.
    pub fn run(&self, history: &PriceHistory) -> BacktestResult<PipelineReport> {
        if history.len() < 2 {
            return Err(BacktestError::InsufficientData {
                required: 2,
                available: history.len(),
            });
        }

        let prices = history.asset_prices();
        let asset_returns = simple_returns(&prices);
        let rf_returns = daily_risk_free_returns(&history.risk_free_annual_pct(), self.config.periods_per_year)?;
        let rf_per_period = self.sharpe_risk_free_rate(&rf_returns, None);

        tracing::info!(
            rows = history.len(),
            variants = self.config.variants.len(),
            rf_per_period,
            "Running strategy pipeline"
        );

        let trend = self
            .config
            .variants
            .iter()
            .any(Variant::uses_signal)
            .then(|| self.trend_inputs(&prices));

        let entries = self
            .config
            .variants
            .iter()
            .map(|&variant| {
                let result = self
                    .run_variant(variant, &prices, &asset_returns, &rf_returns, trend.as_ref())
                    .map_err(|(stage, source)| VariantError { variant, stage, source });
                match &result {
                    Ok(r) => tracing::info!(
                        %variant,
                        growth = r.final_growth(),
                        sharpe = r.summary.sharpe,
                        "Variant completed"
                    ),
                    Err(e) => tracing::warn!("{}", e),
                }
                (variant, result)
            })
            .collect();

        Ok(PipelineReport {
            risk_free_rate_per_period: rf_per_period,
            periods_per_year: self.config.periods_per_year,
            entries,
        })
    }

    /// Configured rate, or the mean daily risk-free return over the rows
    /// where `returns` is defined (every row when `returns` is `None`)
    fn sharpe_risk_free_rate(&self, rf_returns: &ReturnSeries, returns: Option<&ReturnSeries>) -> f64 {
        if let Some(pct) = self.config.sharpe_risk_free_annual_pct {
            return annual_to_periodic(pct / 100.0, 1.0 / f64::from(self.config.periods_per_year));
        }
        match returns {
            Some(returns) => rf_returns
                .values()
                .iter()
                .zip(returns.values())
                .filter_map(|(rf, r)| r.and(*rf))
                .mean(),
            None => rf_returns.defined().map(|(_, r)| r).mean(),
        }
    }

    fn trend_inputs(&self, prices: &TimeSeries<f64>) -> Result<TrendInputs, (Stage, BacktestError)> {
        let rolling = |cfg: RollingWindowConfig| {
            RollingWindow::new(cfg)
                .and_then(|w| w.mean(prices))
                .map_err(|e| (Stage::Rolling, e))
        };
        let fast_sma = rolling(self.config.fast_window)?;
        let slow_sma = rolling(self.config.slow_window)?;
        tracing::debug!(
            fast = self.config.fast_window.window_length,
            slow = self.config.slow_window.window_length,
            "Rolling means computed"
        );

        let crossover = sma_crossover_signal(&fast_sma, &slow_sma).map_err(|e| (Stage::Signal, e))?;
        Ok(TrendInputs { slow_sma, crossover })
    }

    fn run_variant(
        &self,
        variant: Variant,
        prices: &TimeSeries<f64>,
        asset_returns: &ReturnSeries,
        rf_returns: &ReturnSeries,
        trend: Option<&Result<TrendInputs, (Stage, BacktestError)>>,
    ) -> Result<VariantResult, (Stage, BacktestError)> {
        let (signal, returns) = match variant {
            Variant::BuyHold => {
                let returns = buy_and_hold_returns(asset_returns, rf_returns, self.config.asset_weight)
                    .map_err(|e| (Stage::Returns, e))?;
                (None, returns)
            }
            Variant::SmaCrossover | Variant::SmaPlusZscore => {
                let trend = match trend {
                    Some(Ok(t)) => t,
                    Some(Err(e)) => return Err(e.clone()),
                    None => {
                        return Err((Stage::Rolling, BacktestError::config("trend inputs were not computed")))
                    }
                };

                let signal = if variant == Variant::SmaPlusZscore {
                    let z_signal = ZScoreGate::new(self.config.zscore)
                        .and_then(|gate| gate.signal(prices, &trend.slow_sma))
                        .map_err(|e| (Stage::Signal, e))?;
                    combined_signal(&trend.crossover, &z_signal).map_err(|e| (Stage::Signal, e))?
                } else {
                    trend.crossover.clone()
                };

                let returns = strategy_returns(&signal, asset_returns, rf_returns)
                    .map_err(|e| (Stage::Returns, e))?;
                (Some(signal), returns)
            }
        };

        let growth = compound_growth(&returns).map_err(|e| (Stage::Growth, e))?;
        let rf_per_period = self.sharpe_risk_free_rate(rf_returns, Some(&returns));
        let summary = summarize(&returns, rf_per_period).map_err(|e| (Stage::Performance, e))?;

        Ok(VariantResult {
            variant,
            signal,
            max_drawdown: max_drawdown(&growth),
            sharpe_risk_free_rate: rf_per_period,
            returns,
            growth,
            summary,
        })
    }
}
