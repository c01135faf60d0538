//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    load_config, Config, ConfigError, DataSection, LoggingSection, NormalizationKind,
    OutputSection, PerformanceSection, StrategySection, ZScoreSection, PRICES_FILE_ENV,
};
