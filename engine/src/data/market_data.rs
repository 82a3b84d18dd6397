// In-memory candle store; doubles as an offline provider for scans.
use super::provider::{CandleProvider, InstrumentStatsProvider};
use crate::error::EngineError;
use async_trait::async_trait;
use chrono::Duration;
use shared::models::{Candle, InstrumentStats, Timeframe};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

pub struct MarketDataStore {
    data: HashMap<String, HashMap<Timeframe, Vec<Candle>>>,
}

impl MarketDataStore {
    pub fn new() -> Self {
        MarketDataStore { data: HashMap::new() }
    }

    /// Merges candles into the series, keeping it sorted and unique by open time.
    /// An incoming candle replaces a stored one with the same open time.
    pub fn add_candles(&mut self, symbol: &str, timeframe: Timeframe, new_candles: Vec<Candle>) -> Result<(), EngineError> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(EngineError::MarketDataError("Symbol cannot be empty".to_string()));
        }
        let symbol_data = self.data.entry(symbol.to_uppercase()).or_default();
        let timeframe_data = symbol_data.entry(timeframe).or_default();

        let incoming: HashSet<_> = new_candles.iter().map(|c| c.open_time).collect();
        timeframe_data.retain(|c| !incoming.contains(&c.open_time));
        timeframe_data.extend(new_candles);
        timeframe_data.sort_by_key(|c| c.open_time);
        timeframe_data.dedup_by_key(|c| c.open_time);

        Ok(())
    }

    /// The most recent `limit` candles, oldest first.
    pub fn latest(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Option<Vec<Candle>> {
        self.series(symbol, timeframe)
            .map(|candles| candles[candles.len().saturating_sub(limit)..].to_vec())
    }

    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    /// Sum of `close * volume` over the 24h ending at the newest candle of the
    /// finest stored timeframe.
    pub fn quote_volume_24h(&self, symbol: &str) -> Option<f64> {
        let by_timeframe = self.data.get(&symbol.to_uppercase())?;
        let (_, candles) = by_timeframe.iter().filter(|(_, c)| !c.is_empty()).min_by_key(|(tf, _)| **tf)?;
        let newest = candles.last()?.open_time;
        let window_start = newest - Duration::hours(24);
        Some(
            candles
                .iter()
                .filter(|c| c.open_time > window_start)
                .map(|c| c.close * c.volume)
                .sum(),
        )
    }

    fn series(&self, symbol: &str, timeframe: Timeframe) -> Option<&Vec<Candle>> {
        self.data
            .get(&symbol.to_uppercase())
            .and_then(|symbol_data| symbol_data.get(&timeframe))
    }
}

impl Default for MarketDataStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CandleProvider for RwLock<MarketDataStore> {
    async fn fetch_candles(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Result<Vec<Candle>, EngineError> {
        let store = self.read().await;
        Ok(store.latest(symbol, timeframe, limit).unwrap_or_default())
    }
}

#[async_trait]
impl InstrumentStatsProvider for RwLock<MarketDataStore> {
    async fn fetch_instrument_stats(&self) -> Result<Vec<InstrumentStats>, EngineError> {
        let store = self.read().await;
        Ok(store
            .symbols()
            .into_iter()
            .filter_map(|symbol| {
                let quote_volume = store.quote_volume_24h(&symbol)?;
                Some(InstrumentStats { symbol, quote_volume })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn candle(minutes: i64, close: f64, volume: f64) -> Candle {
        Candle {
            open_time: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes),
            open: close,
            high: close,
            low: close,
            close,
            volume,
        }
    }

    #[test]
    fn add_candles_sorts_and_keeps_newest_duplicate() {
        let mut store = MarketDataStore::new();
        store
            .add_candles("btcusdt", Timeframe::Minute5, vec![candle(10, 2.0, 1.0), candle(0, 1.0, 1.0)])
            .unwrap();
        store
            .add_candles("BTCUSDT", Timeframe::Minute5, vec![candle(10, 2.5, 1.0), candle(5, 1.5, 1.0)])
            .unwrap();

        let candles = store.latest("BTCUSDT", Timeframe::Minute5, usize::MAX).unwrap();
        let closes: Vec<_> = candles.iter().map(|c| c.close).collect();
        assert_eq!(closes, vec![1.0, 1.5, 2.5]);
    }

    #[test]
    fn reloading_updates_forming_candle() {
        let mut store = MarketDataStore::new();
        let first: Vec<_> = (0..3).map(|i| candle(i * 5, 10.0 + i as f64, 100.0)).collect();
        store.add_candles("ETHUSDT", Timeframe::Minute5, first).unwrap();

        // Same file re-exported once the last bar has moved on.
        let mut reload: Vec<_> = (0..3).map(|i| candle(i * 5, 10.0 + i as f64, 100.0)).collect();
        reload[2] = candle(10, 12.8, 340.0);
        store.add_candles("ETHUSDT", Timeframe::Minute5, reload).unwrap();

        let candles = store.latest("ETHUSDT", Timeframe::Minute5, usize::MAX).unwrap();
        assert_eq!(candles.len(), 3);
        assert_eq!((candles[2].close, candles[2].volume), (12.8, 340.0));
    }

    #[test]
    fn empty_symbol_is_rejected() {
        let mut store = MarketDataStore::new();
        assert!(store.add_candles("  ", Timeframe::Hour1, vec![]).is_err());
    }

    #[test]
    fn latest_returns_tail_oldest_first() {
        let mut store = MarketDataStore::new();
        store
            .add_candles("ETHUSDT", Timeframe::Hour1, (0..10).map(|i| candle(i * 60, i as f64, 1.0)).collect())
            .unwrap();
        let tail = store.latest("ETHUSDT", Timeframe::Hour1, 3).unwrap();
        assert_eq!(tail.iter().map(|c| c.close).collect::<Vec<_>>(), vec![7.0, 8.0, 9.0]);
        assert_eq!(store.latest("ETHUSDT", Timeframe::Hour1, 50).unwrap().len(), 10);
        assert!(store.latest("ETHUSDT", Timeframe::Minute5, 3).is_none());
    }

    #[test]
    fn quote_volume_uses_last_day_of_finest_series() {
        let mut store = MarketDataStore::new();
        // 25 hourly candles: only the newest 24 fall inside the window.
        store
            .add_candles("SOLUSDT", Timeframe::Hour1, (0..25).map(|i| candle(i * 60, 10.0, 100.0)).collect())
            .unwrap();
        store
            .add_candles("SOLUSDT", Timeframe::Day1, vec![candle(0, 10.0, 1_000_000.0)])
            .unwrap();
        assert_eq!(store.quote_volume_24h("SOLUSDT"), Some(24.0 * 1_000.0));
        assert_eq!(store.quote_volume_24h("NOPE"), None);
    }

    #[tokio::test]
    async fn store_serves_as_candle_provider() {
        let mut store = MarketDataStore::new();
        store
            .add_candles("BNBUSDT", Timeframe::Minute5, (0..5).map(|i| candle(i * 5, 300.0, 2.0)).collect())
            .unwrap();
        let provider = RwLock::new(store);

        let candles = provider.fetch_candles("BNBUSDT", Timeframe::Minute5, 2).await.unwrap();
        assert_eq!(candles.len(), 2);
        let missing = provider.fetch_candles("XRPUSDT", Timeframe::Minute5, 2).await.unwrap();
        assert!(missing.is_empty());

        let stats = provider.fetch_instrument_stats().await.unwrap();
        assert_eq!(stats, vec![InstrumentStats { symbol: "BNBUSDT".to_string(), quote_volume: 3_000.0 }]);
    }
}
