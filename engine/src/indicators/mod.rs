// Technical indicators module
pub mod atr;
pub mod channel;
pub mod ema;
pub mod engine;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod snapshot;

pub use atr::Atr;
pub use channel::{Channel, ChannelBound};
pub use ema::Ema;
pub use engine::{IndicatorEngine, IndicatorPeriods};
pub use macd::{Macd, MacdLines};
pub use rsi::Rsi;
pub use sma::Sma;
pub use snapshot::IndicatorSnapshot;

use crate::error::EngineError;
use serde_json::Value;
use shared::models::Candle;

/// Candle field an indicator reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl Source {
    pub fn value(&self, candle: &Candle) -> f64 {
        match self {
            Source::Open => candle.open,
            Source::High => candle.high,
            Source::Low => candle.low,
            Source::Close => candle.close,
            Source::Volume => candle.volume,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Source::Open => "open",
            Source::High => "high",
            Source::Low => "low",
            Source::Close => "close",
            Source::Volume => "volume",
        }
    }
}

// Common trait for all indicators
pub trait IndicatorCalculator: Send + Sync {
    fn name(&self) -> &str;
    fn parameters(&self) -> Value;
    /// One output per input candle; `None` where the lookback is not yet filled.
    fn calculate(&self, data: &[Candle]) -> Result<Vec<Option<f64>>, EngineError>;
}

/// Reads `source` out of every candle, rejecting non-finite values.
pub(crate) fn finite_series(data: &[Candle], source: Source, indicator: &str) -> Result<Vec<f64>, EngineError> {
    data.iter()
        .enumerate()
        .map(|(idx, candle)| {
            let value = source.value(candle);
            if value.is_finite() {
                Ok(value)
            } else {
                Err(EngineError::IndicatorError(format!(
                    "{}: non-finite {} at row {}",
                    indicator,
                    source.label(),
                    idx
                )))
            }
        })
        .collect()
}

pub(crate) fn check_period(period: usize, indicator: &str) -> Result<(), EngineError> {
    if period == 0 {
        return Err(EngineError::IndicatorError(format!("{}: period cannot be 0", indicator)));
    }
    Ok(())
}
