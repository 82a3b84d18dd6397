// Simple Moving Average (SMA) indicator implementation
use super::{check_period, finite_series, IndicatorCalculator, Source};
use crate::error::EngineError;
use serde_json::Value;
use shared::models::Candle;

pub struct Sma {
    name: String,
    period: usize,
    source: Source,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self::with_source(period, Source::Close)
    }

    pub fn with_source(period: usize, source: Source) -> Self {
        Self {
            name: format!("SMA({})", period),
            period,
            source,
        }
    }
}

impl IndicatorCalculator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period, "source": self.source.label() })
    }

    fn calculate(&self, data: &[Candle]) -> Result<Vec<Option<f64>>, EngineError> {
        check_period(self.period, &self.name)?;
        let values = finite_series(data, self.source, &self.name)?;
        if values.len() < self.period {
            return Ok(vec![None; values.len()]);
        }

        let mut results = vec![None; self.period - 1];

        let mut sum: f64 = values.iter().take(self.period).sum();
        results.push(Some(sum / self.period as f64));

        // Slide the window
        for i in self.period..values.len() {
            sum = sum - values[i - self.period] + values[i];
            results.push(Some(sum / self.period as f64));
        }
        Ok(results)
    }
}
