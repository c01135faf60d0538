//! Strategy Parameters
//!
//! Configuration structs for the rolling windows, the z-score gate and the
//! strategy pipeline. Defaults reproduce the reference 50/200 crossover with a
//! 3-day z-score filter at -0.05.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::{BacktestError, BacktestResult};
use crate::domain::returns::validate_weight;

/// Trading days per year used to de-annualise rates
pub const TRADING_DAYS_PER_YEAR: u32 = 252;

/// Where a rolling value sits relative to its window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowAlignment {
    /// Value at index i summarizes indices i-window+1..=i
    #[default]
    Trailing,
}

/// Rolling window configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollingWindowConfig {
    pub window_length: usize,
    #[serde(default)]
    pub alignment: WindowAlignment,
}

impl RollingWindowConfig {
    pub fn trailing(window_length: usize) -> Self {
        Self {
            window_length,
            alignment: WindowAlignment::Trailing,
        }
    }

    pub fn validate(&self) -> BacktestResult<()> {
        if self.window_length == 0 {
            return Err(BacktestError::config("window length must be positive"));
        }
        Ok(())
    }
}

/// Reference statistics used to normalize the price/SMA spread
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ZScoreNormalization {
    /// Mean and standard deviation over the whole spread history.
    /// Every z-score sees the full sample, so the filter is not causal.
    #[default]
    FullSample,
    /// Trailing rolling mean and standard deviation of the spread
    Trailing { window: usize },
}

/// Z-score gate parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZScoreFilterConfig {
    /// Number of prior days that must all sit below the threshold
    pub lookback: usize,
    /// Suppress exposure when every z-score in the lookback is below this
    pub threshold: f64,
    #[serde(default)]
    pub normalization: ZScoreNormalization,
}

impl Default for ZScoreFilterConfig {
    fn default() -> Self {
        Self {
            lookback: 3,
            threshold: -0.05,
            normalization: ZScoreNormalization::FullSample,
        }
    }
}

impl ZScoreFilterConfig {
    pub fn validate(&self) -> BacktestResult<()> {
        if self.lookback == 0 {
            return Err(BacktestError::config("z-score lookback must be at least 1"));
        }
        if !self.threshold.is_finite() || self.threshold.abs() > 10.0 {
            return Err(BacktestError::config(format!(
                "z-score threshold must be finite and within [-10, 10], got {}",
                self.threshold
            )));
        }
        if let ZScoreNormalization::Trailing { window } = self.normalization {
            if window < 2 {
                return Err(BacktestError::config(format!(
                    "trailing z-score window must be at least 2, got {}",
                    window
                )));
            }
        }
        Ok(())
    }
}

/// Named strategy variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Fixed asset/risk-free weights, no signal
    BuyHold,
    /// Asset while fast SMA > slow SMA, else risk-free
    SmaCrossover,
    /// Crossover gated by the z-score filter
    SmaPlusZscore,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::BuyHold, Variant::SmaCrossover, Variant::SmaPlusZscore];

    pub fn name(&self) -> &'static str {
        match self {
            Variant::BuyHold => "buy_hold",
            Variant::SmaCrossover => "sma_crossover",
            Variant::SmaPlusZscore => "sma_plus_zscore",
        }
    }

    /// Whether the variant needs the fast/slow rolling means
    pub fn uses_signal(&self) -> bool {
        !matches!(self, Variant::BuyHold)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = BacktestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "buy_hold" | "buy_and_hold" => Ok(Variant::BuyHold),
            "sma_crossover" | "sma" => Ok(Variant::SmaCrossover),
            "sma_plus_zscore" | "sma_zscore" => Ok(Variant::SmaPlusZscore),
            other => Err(BacktestError::config(format!("unknown variant '{}'", other))),
        }
    }
}

/// Full pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub fast_window: RollingWindowConfig,
    pub slow_window: RollingWindowConfig,
    pub zscore: ZScoreFilterConfig,
    /// Asset share of the buy-and-hold benchmark; the rest is risk-free
    pub asset_weight: f64,
    /// Variants to run, reported in this order
    pub variants: Vec<Variant>,
    /// Periods per year used to convert annual rates
    pub periods_per_year: u32,
    /// Annual risk-free percent for the Sharpe ratio.
    /// `None` uses the mean daily risk-free return of the sample.
    pub sharpe_risk_free_annual_pct: Option<f64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fast_window: RollingWindowConfig::trailing(50),
            slow_window: RollingWindowConfig::trailing(200),
            zscore: ZScoreFilterConfig::default(),
            asset_weight: 0.9,
            variants: Variant::ALL.to_vec(),
            periods_per_year: TRADING_DAYS_PER_YEAR,
            sharpe_risk_free_annual_pct: None,
        }
    }
}

impl PipelineConfig {
    /// Override the fast and slow SMA windows
    pub fn with_windows(mut self, fast: usize, slow: usize) -> Self {
        self.fast_window = RollingWindowConfig::trailing(fast);
        self.slow_window = RollingWindowConfig::trailing(slow);
        self
    }

    pub fn with_z_threshold(mut self, threshold: f64) -> Self {
        self.zscore.threshold = threshold;
        self
    }

    pub fn with_variants(mut self, variants: Vec<Variant>) -> Self {
        self.variants = variants;
        self
    }

    pub fn with_asset_weight(mut self, weight: f64) -> Self {
        self.asset_weight = weight;
        self
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> BacktestResult<()> {
        self.fast_window.validate()?;
        self.slow_window.validate()?;
        if self.fast_window.window_length >= self.slow_window.window_length {
            return Err(BacktestError::config(format!(
                "fast window ({}) must be shorter than slow window ({})",
                self.fast_window.window_length, self.slow_window.window_length
            )));
        }
        self.zscore.validate()?;
        validate_weight(self.asset_weight)?;
        if self.variants.is_empty() {
            return Err(BacktestError::config("at least one variant must be requested"));
        }
        for (i, v) in self.variants.iter().enumerate() {
            if self.variants[..i].contains(v) {
                return Err(BacktestError::config(format!("variant '{}' listed twice", v)));
            }
        }
        if self.periods_per_year == 0 {
            return Err(BacktestError::config("periods_per_year must be positive"));
        }
        if let Some(rf) = self.sharpe_risk_free_annual_pct {
            if !rf.is_finite() || rf <= -100.0 {
                return Err(BacktestError::config(format!(
                    "Sharpe risk-free rate must be finite and above -100%, got {}",
                    rf
                )));
            }
        }
        Ok(())
    }
}
