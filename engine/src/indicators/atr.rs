// Average True Range (ATR), Wilder smoothing
use super::{check_period, finite_series, IndicatorCalculator, Source};
use crate::error::EngineError;
use serde_json::Value;
use shared::models::Candle;

pub struct Atr {
    name: String,
    period: usize,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("ATR({})", period),
            period,
        }
    }
}

impl IndicatorCalculator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    /// True range needs the previous close, so the first ATR lands at index `period`.
    fn calculate(&self, data: &[Candle]) -> Result<Vec<Option<f64>>, EngineError> {
        check_period(self.period, &self.name)?;
        let highs = finite_series(data, Source::High, &self.name)?;
        let lows = finite_series(data, Source::Low, &self.name)?;
        let closes = finite_series(data, Source::Close, &self.name)?;
        if data.len() <= self.period {
            return Ok(vec![None; data.len()]);
        }

        let true_range = |i: usize| {
            (highs[i] - lows[i])
                .max((highs[i] - closes[i - 1]).abs())
                .max((lows[i] - closes[i - 1]).abs())
        };

        let mut results = vec![None; self.period];
        let seed: f64 = (1..=self.period).map(true_range).sum();
        let mut atr = seed / self.period as f64;
        results.push(Some(atr));

        for i in (self.period + 1)..data.len() {
            atr = (atr * (self.period as f64 - 1.0) + true_range(i)) / self.period as f64;
            results.push(Some(atr));
        }
        Ok(results)
    }
}
