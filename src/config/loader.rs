//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config/default.toml.

use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::application::HistoryRequest;
use crate::domain::AlignmentPolicy;
use crate::strategy::{
    PipelineConfig, RollingWindowConfig, Variant, ZScoreFilterConfig, ZScoreNormalization,
    TRADING_DAYS_PER_YEAR,
};

/// Environment variable that overrides `[data] prices_file`
pub const PRICES_FILE_ENV: &str = "INDEX_TIMING_PRICES_FILE";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main configuration structure matching config/default.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub data: DataSection,
    #[serde(default)]
    pub strategy: StrategySection,
    #[serde(default)]
    pub zscore: ZScoreSection,
    #[serde(default)]
    pub performance: PerformanceSection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub output: OutputSection,
}

/// Input data section
#[derive(Debug, Clone, Deserialize)]
pub struct DataSection {
    /// CSV file with `date,symbol,adjusted_price` rows
    pub prices_file: String,
    /// Symbol of the traded index (e.g. "SPY")
    pub asset_symbol: String,
    /// Symbol of the annual-percent risk-free yield (e.g. "IRX")
    pub risk_free_symbol: String,
    /// Inclusive start date, "YYYY-MM-DD"
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Inclusive end date, "YYYY-MM-DD"
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// "strict" or "intersect"
    #[serde(default)]
    pub alignment: AlignmentPolicy,
}

impl DataSection {
    /// Get prices file with environment variable override and `~` expansion
    /// Checks INDEX_TIMING_PRICES_FILE env var first, falls back to config value
    pub fn get_prices_file(&self) -> PathBuf {
        let raw = std::env::var(PRICES_FILE_ENV).unwrap_or_else(|_| self.prices_file.clone());
        PathBuf::from(shellexpand::tilde(&raw).into_owned())
    }
}

/// Strategy configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct StrategySection {
    #[serde(default = "default_fast_window")]
    pub fast_window: usize,
    #[serde(default = "default_slow_window")]
    pub slow_window: usize,
    /// Asset share of the buy-and-hold benchmark, in (0, 1]
    #[serde(default = "default_asset_weight")]
    pub asset_weight: f64,
    /// Variants to run, in report order
    #[serde(default = "default_variants")]
    pub variants: Vec<Variant>,
}

fn default_fast_window() -> usize {
    50
}

fn default_slow_window() -> usize {
    200
}

fn default_asset_weight() -> f64 {
    0.9
}

fn default_variants() -> Vec<Variant> {
    Variant::ALL.to_vec()
}

impl Default for StrategySection {
    fn default() -> Self {
        Self {
            fast_window: default_fast_window(),
            slow_window: default_slow_window(),
            asset_weight: default_asset_weight(),
            variants: default_variants(),
        }
    }
}

/// Z-score normalization choice as written in the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationKind {
    #[default]
    FullSample,
    Trailing,
}

/// Z-score filter section
#[derive(Debug, Clone, Deserialize)]
pub struct ZScoreSection {
    #[serde(default = "default_lookback")]
    pub lookback: usize,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub normalization: NormalizationKind,
    /// Required when normalization = "trailing"
    #[serde(default)]
    pub trailing_window: Option<usize>,
}

fn default_lookback() -> usize {
    3
}

fn default_threshold() -> f64 {
    -0.05
}

impl Default for ZScoreSection {
    fn default() -> Self {
        Self {
            lookback: default_lookback(),
            threshold: default_threshold(),
            normalization: NormalizationKind::FullSample,
            trailing_window: None,
        }
    }
}

/// Performance statistics section
#[derive(Debug, Clone, Deserialize)]
pub struct PerformanceSection {
    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: u32,
    /// Annual percent used for the Sharpe ratio; omit to use the sample mean
    #[serde(default)]
    pub sharpe_risk_free_annual_pct: Option<f64>,
}

fn default_periods_per_year() -> u32 {
    TRADING_DAYS_PER_YEAR
}

impl Default for PerformanceSection {
    fn default() -> Self {
        Self {
            periods_per_year: default_periods_per_year(),
            sharpe_risk_free_annual_pct: None,
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Optional report exports
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputSection {
    /// Wide CSV of every variant's growth curve
    #[serde(default)]
    pub growth_csv: Option<String>,
    /// Pretty JSON of every variant's summary
    #[serde(default)]
    pub summary_json: Option<String>,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate data section
        if self.data.prices_file.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "prices_file cannot be empty".to_string(),
            ));
        }
        if self.data.asset_symbol.trim().is_empty() || self.data.risk_free_symbol.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "asset_symbol and risk_free_symbol cannot be empty".to_string(),
            ));
        }
        if self.data.asset_symbol == self.data.risk_free_symbol {
            return Err(ConfigError::ValidationError(format!(
                "asset and risk-free symbols must differ, both are '{}'",
                self.data.asset_symbol
            )));
        }
        if let (Some(start), Some(end)) = (self.data.start_date, self.data.end_date) {
            if start > end {
                return Err(ConfigError::ValidationError(format!(
                    "start_date {} is after end_date {}",
                    start, end
                )));
            }
        }

        // Validate z-score section
        if self.zscore.normalization == NormalizationKind::Trailing && self.zscore.trailing_window.is_none() {
            return Err(ConfigError::ValidationError(
                "trailing_window is required when normalization = \"trailing\"".to_string(),
            ));
        }

        // Validate logging
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging level must be one of {:?}, got '{}'",
                LOG_LEVELS, self.logging.level
            )));
        }

        // Windows, weight, threshold and variants
        PipelineConfig::from(self)
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    /// Series request for the price provider
    pub fn history_request(&self) -> HistoryRequest {
        HistoryRequest::new(&self.data.asset_symbol, &self.data.risk_free_symbol)
            .with_range(self.data.start_date, self.data.end_date)
            .with_alignment(self.data.alignment)
    }
}

impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        let normalization = match config.zscore.normalization {
            NormalizationKind::FullSample => ZScoreNormalization::FullSample,
            NormalizationKind::Trailing => ZScoreNormalization::Trailing {
                window: config.zscore.trailing_window.unwrap_or(0),
            },
        };

        PipelineConfig {
            fast_window: RollingWindowConfig::trailing(config.strategy.fast_window),
            slow_window: RollingWindowConfig::trailing(config.strategy.slow_window),
            zscore: ZScoreFilterConfig {
                lookback: config.zscore.lookback,
                threshold: config.zscore.threshold,
                normalization,
            },
            asset_weight: config.strategy.asset_weight,
            variants: config.strategy.variants.clone(),
            periods_per_year: config.performance.periods_per_year,
            sharpe_risk_free_annual_pct: config.performance.sharpe_risk_free_annual_pct,
        }
    }
}
