//! Market Data Adapters
//!
//! Historical price sources implementing `PriceSeriesProvider`:
//! - `CsvPriceProvider`: long-format `date,symbol,adjusted_price` files

mod csv_file;

pub use csv_file::CsvPriceProvider;
