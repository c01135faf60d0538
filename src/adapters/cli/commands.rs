//! CLI Command Handlers
//!
//! Implementation of all CLI commands for the index timing backtester.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::adapters::market_data::CsvPriceProvider;
use crate::adapters::report::{ConsoleTable, GrowthCsvExporter, SummaryJsonExporter};
use crate::application::BacktestOrchestrator;
use crate::config::{load_config, Config};
use crate::ports::ReportSink;
use crate::strategy::{PipelineConfig, Variant};

/// Index Timing - Moving-average crossover backtester for equity indices
#[derive(Parser, Debug)]
#[command(
    name = "index-timing",
    version = env!("CARGO_PKG_VERSION"),
    about = "Moving-average crossover backtester for equity indices",
    long_about = "Backtests buy-and-hold, SMA crossover and SMA crossover gated by a \
                  z-score filter over daily index prices, holding the risk-free asset \
                  when out of the market."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the configured strategy variants
    Run(RunCmd),

    /// Check the configuration and the input data
    Validate(ValidateCmd),
}

/// Run the backtest
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Override fast SMA window
    #[arg(long, value_name = "DAYS")]
    pub fast: Option<usize>,

    /// Override slow SMA window
    #[arg(long, value_name = "DAYS")]
    pub slow: Option<usize>,

    /// Override z-score threshold
    #[arg(long, value_name = "THRESHOLD", allow_hyphen_values = true)]
    pub threshold: Option<f64>,

    /// Run only these variants (repeatable)
    #[arg(long = "variant", value_name = "NAME")]
    pub variants: Vec<Variant>,

    /// Export growth curves to CSV
    #[arg(long, value_name = "FILE")]
    pub export_csv: Option<PathBuf>,

    /// Export summaries to JSON
    #[arg(long, value_name = "FILE")]
    pub export_json: Option<PathBuf>,
}

impl RunCmd {
    /// Pipeline configuration with the command-line overrides applied
    pub fn pipeline_config(&self, config: &Config) -> PipelineConfig {
        let mut pipeline = PipelineConfig::from(config);
        let fast = self.fast.unwrap_or(pipeline.fast_window.window_length);
        let slow = self.slow.unwrap_or(pipeline.slow_window.window_length);
        pipeline = pipeline.with_windows(fast, slow);
        if let Some(threshold) = self.threshold {
            pipeline = pipeline.with_z_threshold(threshold);
        }
        if !self.variants.is_empty() {
            pipeline = pipeline.with_variants(self.variants.clone());
        }
        pipeline
    }
}

/// Validate configuration and data
#[derive(Parser, Debug)]
pub struct ValidateCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    let config_path = match &app.command {
        Command::Run(cmd) => &cmd.config,
        Command::Validate(cmd) => &cmd.config,
    };
    let config = load_config(config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?;

    // Initialize logging based on flags
    init_logging(app.verbose, app.debug, &config.logging.level)?;

    match app.command {
        Command::Run(cmd) => run_command(cmd, config).await,
        Command::Validate(cmd) => validate_command(cmd, config).await,
    }
}

/// Initialize logging system
fn init_logging(verbose: bool, debug: bool, default_level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

fn build_orchestrator(config: &Config, pipeline: PipelineConfig) -> Result<BacktestOrchestrator> {
    let prices_file = config.data.get_prices_file();
    tracing::info!("Prices: {}", prices_file.display());
    let provider = Arc::new(CsvPriceProvider::new(prices_file));
    Ok(BacktestOrchestrator::new(provider, config.history_request(), pipeline)?)
}

/// Handle run command
async fn run_command(cmd: RunCmd, config: Config) -> Result<()> {
    tracing::info!("Config: {}", cmd.config.display());

    let pipeline = cmd.pipeline_config(&config);
    let orchestrator = build_orchestrator(&config, pipeline)?;
    let report = orchestrator.run().await.context("Backtest failed")?;

    let mut sinks: Vec<Box<dyn ReportSink>> = vec![Box::new(ConsoleTable::new())];
    let csv_path = cmd
        .export_csv
        .or_else(|| config.output.growth_csv.as_deref().map(PathBuf::from));
    if let Some(path) = csv_path {
        sinks.push(Box::new(GrowthCsvExporter::new(path)));
    }
    let json_path = cmd
        .export_json
        .or_else(|| config.output.summary_json.as_deref().map(PathBuf::from));
    if let Some(path) = json_path {
        sinks.push(Box::new(SummaryJsonExporter::new(path)));
    }

    orchestrator.publish(&report, &mut sinks)?;

    let failed = report.failures().count();
    if failed == report.len() {
        anyhow::bail!("All {} variants failed", failed);
    }
    if failed > 0 {
        tracing::warn!("{} of {} variants failed", failed, report.len());
    }
    Ok(())
}

/// Handle validate command
async fn validate_command(cmd: ValidateCmd, config: Config) -> Result<()> {
    tracing::info!("Validating {}", cmd.config.display());

    let pipeline = PipelineConfig::from(&config);
    let slow = pipeline.slow_window.window_length;
    let orchestrator = build_orchestrator(&config, pipeline)?;
    let history = orchestrator.load_history().await.context("Failed to load price data")?;

    println!("✓ Configuration valid: {}", cmd.config.display());
    println!(
        "  Series: {} / {}",
        config.data.asset_symbol, config.data.risk_free_symbol
    );
    println!("  Rows: {}", history.len());
    if let (Some(first), Some(last)) = (history.points().first(), history.points().last()) {
        println!("  Span: {} .. {}", first.date, last.date);
    }
    if history.len() <= slow {
        println!(
            "  ⚠ Only {} rows for a {}-day slow window: signal variants will fail",
            history.len(),
            slow
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_config() -> Config {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"
[data]
prices_file = "prices.csv"
asset_symbol = "SPY"
risk_free_symbol = "IRX"

[strategy]
fast_window = 20
slow_window = 100
"#,
        )
        .unwrap();
        load_config(file.path()).unwrap()
    }

    #[test]
    fn test_cli_app_parse_run() {
        let args = vec!["index-timing", "run", "--config", "test.toml"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Run(cmd) => {
                assert_eq!(cmd.config, PathBuf::from("test.toml"));
                assert!(cmd.variants.is_empty());
                assert!(cmd.fast.is_none());
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_app_parse_run_with_overrides() {
        let args = vec![
            "index-timing", "run",
            "--fast", "10",
            "--slow", "40",
            "--threshold", "-0.5",
            "--variant", "buy_hold",
            "--variant", "sma_crossover",
        ];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Run(cmd) => {
                assert_eq!(cmd.fast, Some(10));
                assert_eq!(cmd.slow, Some(40));
                assert_eq!(cmd.threshold, Some(-0.5));
                assert_eq!(cmd.variants, vec![Variant::BuyHold, Variant::SmaCrossover]);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_app_parse_run_with_exports() {
        let args = vec![
            "index-timing", "run",
            "--export-csv", "growth.csv",
            "--export-json", "summary.json"
        ];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Run(cmd) => {
                assert_eq!(cmd.export_csv, Some(PathBuf::from("growth.csv")));
                assert_eq!(cmd.export_json, Some(PathBuf::from("summary.json")));
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_unknown_variant_rejected() {
        let args = vec!["index-timing", "run", "--variant", "momentum"];
        assert!(CliApp::try_parse_from(args).is_err());
    }

    #[test]
    fn test_cli_app_parse_validate() {
        let args = vec!["index-timing", "validate", "-c", "other.toml"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Validate(cmd) => assert_eq!(cmd.config, PathBuf::from("other.toml")),
            _ => panic!("Expected Validate command"),
        }
    }

    #[test]
    fn test_global_flags() {
        let args = vec!["index-timing", "-v", "--debug", "validate"];
        let app = CliApp::try_parse_from(args).unwrap();

        assert!(app.verbose);
        assert!(app.debug);
    }

    #[test]
    fn test_default_config_path() {
        let args = vec!["index-timing", "run"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Run(cmd) => {
                assert_eq!(cmd.config, PathBuf::from("config/default.toml"));
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_overrides_applied_to_pipeline_config() {
        let config = create_test_config();
        let args = vec!["index-timing", "run", "--slow", "150", "--threshold", "-1.0"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Run(cmd) => {
                let pipeline = cmd.pipeline_config(&config);
                assert_eq!(pipeline.fast_window.window_length, 20);
                assert_eq!(pipeline.slow_window.window_length, 150);
                assert_eq!(pipeline.zscore.threshold, -1.0);
                assert_eq!(pipeline.variants, Variant::ALL.to_vec());
            }
            _ => panic!("Expected Run command"),
        }
    }
}
