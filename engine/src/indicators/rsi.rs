// Relative Strength Index (RSI) indicator implementation
use super::{check_period, finite_series, IndicatorCalculator, Source};
use crate::error::EngineError;
use serde_json::Value;
use shared::models::Candle;

pub struct Rsi {
    name: String,
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("RSI({})", period),
            period,
        }
    }

    fn rsi_from(avg_gain: f64, avg_loss: f64) -> f64 {
        if avg_loss == 0.0 {
            100.0
        } else {
            let rs = avg_gain / avg_loss;
            100.0 - (100.0 / (1.0 + rs))
        }
    }
}

impl IndicatorCalculator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    fn calculate(&self, data: &[Candle]) -> Result<Vec<Option<f64>>, EngineError> {
        check_period(self.period, &self.name)?;
        let closes = finite_series(data, Source::Close, &self.name)?;
        if closes.len() <= self.period {
            return Ok(vec![None; closes.len()]);
        }

        let mut results = vec![None; self.period];

        let mut gains = 0.0;
        let mut losses = 0.0;
        for i in 1..=self.period {
            let change = closes[i] - closes[i - 1];
            if change > 0.0 {
                gains += change;
            } else {
                losses -= change;
            }
        }

        let mut avg_gain = gains / self.period as f64;
        let mut avg_loss = losses / self.period as f64;
        results.push(Some(Self::rsi_from(avg_gain, avg_loss)));

        // Wilder smoothing
        for i in (self.period + 1)..closes.len() {
            let change = closes[i] - closes[i - 1];
            let (current_gain, current_loss) = if change > 0.0 { (change, 0.0) } else { (0.0, -change) };

            avg_gain = (avg_gain * (self.period - 1) as f64 + current_gain) / self.period as f64;
            avg_loss = (avg_loss * (self.period - 1) as f64 + current_loss) / self.period as f64;
            results.push(Some(Self::rsi_from(avg_gain, avg_loss)));
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::closes;

    #[test]
    fn test_rsi_calculation() {
        let candles = closes(&[
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03, 45.61, 46.28, 46.28,
            46.00, 46.03, 46.41, 46.22, 45.64, 46.25,
        ]);
        let results = Rsi::new(14).calculate(&candles).unwrap();

        for (i, value) in results.iter().enumerate().take(14) {
            assert_eq!(*value, None, "Expected None at index {}", i);
        }
        // Reference values are ~70.5, ~66.2, ~66.5, ~69.4 for this series.
        let first = results[14].unwrap();
        assert!(first > 65.0 && first < 75.0, "RSI[14] out of expected range: {}", first);
        let after_dip = results[15].unwrap();
        assert!(after_dip < first, "a lower close must lower RSI");
        let after_rise = results[17].unwrap();
        assert!(after_rise > results[16].unwrap());
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let candles = closes(&[1.0; 10]);
        assert_eq!(Rsi::new(14).calculate(&candles).unwrap(), vec![None; 10]);
    }

    #[test]
    fn test_rsi_all_gains() {
        let values: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        let results = Rsi::new(14).calculate(&closes(&values)).unwrap();
        assert!(results[..14].iter().all(Option::is_none));
        assert!(results[14..].iter().all(|v| *v == Some(100.0)));
    }

    #[test]
    fn test_rsi_all_losses() {
        let values: Vec<f64> = (1..=20).map(|i| 20.0 - i as f64).collect();
        let results = Rsi::new(14).calculate(&closes(&values)).unwrap();
        assert!(results[14..].iter().all(|v| *v == Some(0.0)));
    }
}
