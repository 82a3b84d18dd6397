// Moving Average Convergence/Divergence (MACD)
use super::ema::ema_values;
use super::{check_period, finite_series, IndicatorCalculator, Source};
use crate::error::EngineError;
use serde_json::Value;
use shared::models::Candle;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdLines {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
}

pub struct Macd {
    name: String,
    fast: usize,
    slow: usize,
    signal: usize,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Self {
            name: format!("MACD({},{},{})", fast, slow, signal),
            fast,
            slow,
            signal,
        }
    }

    /// MACD line (fast EMA - slow EMA) and its EMA signal line.
    pub fn calculate_lines(&self, data: &[Candle]) -> Result<MacdLines, EngineError> {
        check_period(self.fast, &self.name)?;
        check_period(self.slow, &self.name)?;
        check_period(self.signal, &self.name)?;
        if self.fast >= self.slow {
            return Err(EngineError::IndicatorError(format!(
                "{}: fast period must be shorter than slow period",
                self.name
            )));
        }
        let closes = finite_series(data, Source::Close, &self.name)?;

        let fast = ema_values(&closes, self.fast);
        let slow = ema_values(&closes, self.slow);
        let macd: Vec<Option<f64>> = fast
            .iter()
            .zip(slow.iter())
            .map(|(f, s)| match (f, s) {
                (Some(f), Some(s)) => Some(f - s),
                _ => None,
            })
            .collect();

        // The signal EMA runs over the defined tail of the MACD line only.
        let warmup = macd.iter().take_while(|v| v.is_none()).count();
        let defined: Vec<f64> = macd.iter().skip(warmup).flatten().copied().collect();
        let mut signal = vec![None; warmup];
        signal.extend(ema_values(&defined, self.signal));

        Ok(MacdLines { macd, signal })
    }
}

impl IndicatorCalculator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "fast": self.fast, "slow": self.slow, "signal": self.signal })
    }

    fn calculate(&self, data: &[Candle]) -> Result<Vec<Option<f64>>, EngineError> {
        Ok(self.calculate_lines(data)?.macd)
    }
}
