//! Index Timing - Moving-Average Crossover Backtester
//!
//! Compares buy-and-hold, SMA crossover and z-score gated crossover on daily
//! index prices.

use anyhow::Result;

use index_timing::adapters::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (INDEX_TIMING_PRICES_FILE etc.)
    dotenvy::dotenv().ok();

    let app = cli::init();
    cli::execute(app).await
}
