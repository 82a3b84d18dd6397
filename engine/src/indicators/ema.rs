// Exponential Moving Average (EMA) indicator implementation
use super::{check_period, finite_series, IndicatorCalculator, Source};
use crate::error::EngineError;
use serde_json::Value;
use shared::models::Candle;

pub struct Ema {
    name: String,
    period: usize,
    source: Source,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self::with_source(period, Source::Close)
    }

    pub fn with_source(period: usize, source: Source) -> Self {
        Self {
            name: format!("EMA({})", period),
            period,
            source,
        }
    }
}

/// SMA-seeded EMA over raw values. The first `period - 1` outputs are `None`.
pub fn ema_values(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 || values.len() < period {
        return vec![None; values.len()];
    }

    let mut results = vec![None; period - 1];
    let multiplier = 2.0 / (period as f64 + 1.0);

    let initial_sum: f64 = values.iter().take(period).sum();
    let mut previous_ema = initial_sum / period as f64;
    results.push(Some(previous_ema));

    for value in values.iter().skip(period) {
        let ema = (value - previous_ema) * multiplier + previous_ema;
        results.push(Some(ema));
        previous_ema = ema;
    }
    results
}

impl IndicatorCalculator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period, "source": self.source.label() })
    }

    fn calculate(&self, data: &[Candle]) -> Result<Vec<Option<f64>>, EngineError> {
        check_period(self.period, &self.name)?;
        let values = finite_series(data, self.source, &self.name)?;
        Ok(ema_values(&values, self.period))
    }
}
