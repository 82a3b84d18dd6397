// Market data sources consumed by the scanner.
use crate::error::EngineError;
use async_trait::async_trait;
use shared::models::{Candle, InstrumentStats, Timeframe};

/// Source of ordered candle windows.
///
/// `Ok(vec![])` means the provider answered with no data; `Err` means the
/// provider could not be reached or answered with something unusable.
#[async_trait]
pub trait CandleProvider: Send + Sync {
    async fn fetch_candles(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Result<Vec<Candle>, EngineError>;
}

/// Source of 24h statistics for every listed instrument.
#[async_trait]
pub trait InstrumentStatsProvider: Send + Sync {
    async fn fetch_instrument_stats(&self) -> Result<Vec<InstrumentStats>, EngineError>;
}
