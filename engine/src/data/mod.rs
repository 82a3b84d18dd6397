pub mod binance;
pub mod csv_parser;
pub mod market_data;
pub mod provider;

pub use binance::BinanceFuturesClient;
pub use csv_parser::CsvCandleSource;
pub use market_data::MarketDataStore;
pub use provider::{CandleProvider, InstrumentStatsProvider};
