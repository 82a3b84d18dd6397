// USDⓈ-M futures REST adapter
use super::provider::{CandleProvider, InstrumentStatsProvider};
use crate::error::EngineError;
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::{Client, Url};
use serde::Deserialize;
use shared::models::{Candle, InstrumentStats, Timeframe};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://fapi.binance.com";

pub struct BinanceFuturesClient {
    http: Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct Ticker24h {
    symbol: String,
    #[serde(rename = "quoteVolume")]
    quote_volume: String,
}

impl BinanceFuturesClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, EngineError> {
        let http = Client::builder().timeout(timeout).build()?;
        let base_url = Url::parse(base_url)
            .map_err(|e| EngineError::ConfigError(format!("Invalid provider URL '{}': {}", base_url, e)))?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, EngineError> {
        self.base_url
            .join(path)
            .map_err(|e| EngineError::ConfigError(format!("Invalid endpoint '{}': {}", path, e)))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url, what: &str) -> Result<T, EngineError> {
        let res = self.http.get(url).send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(EngineError::ProviderError(format!("{} request failed with {}: {}", what, status, body)));
        }
        Ok(res.json().await?)
    }

    /// Rows are `[open_time_ms, "open", "high", "low", "close", "volume", ...]`.
    /// Rows with missing or non-numeric fields are dropped.
    pub fn parse_klines(raw: Vec<serde_json::Value>) -> Vec<Candle> {
        raw.into_iter()
            .filter_map(|row| {
                let arr = row.as_array()?;
                if arr.len() < 6 {
                    return None;
                }
                let number = |idx: usize| -> Option<f64> {
                    let value: f64 = arr[idx].as_str()?.parse().ok()?;
                    value.is_finite().then_some(value)
                };
                Some(Candle {
                    open_time: DateTime::from_timestamp_millis(arr[0].as_i64()?)?,
                    open: number(1)?,
                    high: number(2)?,
                    low: number(3)?,
                    close: number(4)?,
                    volume: number(5)?,
                })
            })
            .collect()
    }

    fn parse_tickers(raw: Vec<Ticker24h>) -> Vec<InstrumentStats> {
        raw.into_iter()
            .filter_map(|ticker| {
                let quote_volume: f64 = ticker.quote_volume.parse().ok()?;
                quote_volume.is_finite().then_some(InstrumentStats {
                    symbol: ticker.symbol,
                    quote_volume,
                })
            })
            .collect()
    }
}

#[async_trait]
impl CandleProvider for BinanceFuturesClient {
    async fn fetch_candles(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Result<Vec<Candle>, EngineError> {
        let mut url = self.endpoint("/fapi/v1/klines")?;
        url.query_pairs_mut()
            .append_pair("symbol", symbol)
            .append_pair("interval", timeframe.as_interval())
            .append_pair("limit", &limit.to_string());

        let raw: Vec<serde_json::Value> = self.get_json(url, "Klines").await?;
        let total = raw.len();
        let candles = Self::parse_klines(raw);
        if candles.len() < total {
            tracing::debug!(symbol = %symbol, dropped = total - candles.len(), "Skipped malformed kline rows");
        }
        Ok(candles)
    }
}

#[async_trait]
impl InstrumentStatsProvider for BinanceFuturesClient {
    async fn fetch_instrument_stats(&self) -> Result<Vec<InstrumentStats>, EngineError> {
        let url = self.endpoint("/fapi/v1/ticker/24hr")?;
        let raw: Vec<Ticker24h> = self.get_json(url, "Ticker").await?;
        Ok(Self::parse_tickers(raw))
    }
}
