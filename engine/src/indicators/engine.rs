// Derives the full indicator snapshot series for one symbol/timeframe.
use super::{
    Atr, Channel, Ema, IndicatorCalculator, IndicatorSnapshot, Macd, Rsi, Sma, Source,
};
use crate::error::EngineError;
use shared::models::Candle;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPeriods {
    pub ema_fast: usize,
    pub ema_mid: usize,
    pub ema_slow: usize,
    pub rsi: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub atr: usize,
    pub channel: usize,
    pub volume_sma: usize,
}

impl Default for IndicatorPeriods {
    fn default() -> Self {
        IndicatorPeriods {
            ema_fast: 20,
            ema_mid: 50,
            ema_slow: 100,
            rsi: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            atr: 14,
            channel: 20,
            volume_sma: 20,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IndicatorEngine {
    periods: IndicatorPeriods,
}

impl IndicatorEngine {
    pub fn new(periods: IndicatorPeriods) -> Self {
        IndicatorEngine { periods }
    }

    /// Configured indicator set as `{name: parameters}`.
    pub fn describe(&self) -> serde_json::Value {
        let p = &self.periods;
        let calculators: Vec<Box<dyn IndicatorCalculator>> = vec![
            Box::new(Ema::new(p.ema_fast)),
            Box::new(Ema::new(p.ema_mid)),
            Box::new(Ema::new(p.ema_slow)),
            Box::new(Rsi::new(p.rsi)),
            Box::new(Macd::new(p.macd_fast, p.macd_slow, p.macd_signal)),
            Box::new(Atr::new(p.atr)),
            Box::new(Channel::upper(p.channel)),
            Box::new(Channel::lower(p.channel)),
            Box::new(Sma::with_source(p.volume_sma, Source::Volume)),
        ];
        serde_json::Value::Object(
            calculators
                .iter()
                .map(|c| (c.name().to_string(), c.parameters()))
                .collect(),
        )
    }

    /// Snapshots for every row with full lookback, oldest first.
    ///
    /// Never fails: when the full indicator set cannot be computed the result
    /// falls back to the reduced `{ema20, ema50, rsi}` set.
    pub fn compute(&self, candles: &[Candle]) -> Vec<IndicatorSnapshot> {
        match self.compute_full(candles) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(error_detail = %e, rows = candles.len(), "Indicator computation failed, degrading to core set");
                self.compute_reduced(candles)
            }
        }
    }

    fn compute_full(&self, candles: &[Candle]) -> Result<Vec<IndicatorSnapshot>, EngineError> {
        let p = &self.periods;
        let ema20 = Ema::new(p.ema_fast).calculate(candles)?;
        let ema50 = Ema::new(p.ema_mid).calculate(candles)?;
        let ema100 = Ema::new(p.ema_slow).calculate(candles)?;
        let rsi = Rsi::new(p.rsi).calculate(candles)?;
        let macd = Macd::new(p.macd_fast, p.macd_slow, p.macd_signal).calculate_lines(candles)?;
        let atr = Atr::new(p.atr).calculate(candles)?;
        let upper = Channel::upper(p.channel).calculate(candles)?;
        let lower = Channel::lower(p.channel).calculate(candles)?;
        let volume_sma = Sma::with_source(p.volume_sma, Source::Volume).calculate(candles)?;

        let rows = candles
            .iter()
            .enumerate()
            .map(|(i, candle)| IndicatorSnapshot {
                candle: candle.clone(),
                ema20: ema20[i],
                ema50: ema50[i],
                ema100: ema100[i],
                rsi: rsi[i],
                macd: macd.macd[i],
                macd_signal: macd.signal[i],
                atr: atr[i],
                channel_upper: upper[i],
                channel_lower: lower[i],
                volume_sma: volume_sma[i],
            })
            .filter(IndicatorSnapshot::is_complete)
            .collect();
        Ok(rows)
    }

    fn compute_reduced(&self, candles: &[Candle]) -> Vec<IndicatorSnapshot> {
        let usable: Vec<Candle> = candles
            .iter()
            .filter(|c| [c.open, c.high, c.low, c.close, c.volume].iter().all(|v| v.is_finite()))
            .cloned()
            .collect();

        let p = &self.periods;
        let series = (|| -> Result<_, EngineError> {
            Ok((
                Ema::new(p.ema_fast).calculate(&usable)?,
                Ema::new(p.ema_mid).calculate(&usable)?,
                Rsi::new(p.rsi).calculate(&usable)?,
            ))
        })();
        let (ema20, ema50, rsi) = match series {
            Ok(series) => series,
            Err(e) => {
                tracing::warn!(error_detail = %e, "Reduced indicator set unavailable");
                return Vec::new();
            }
        };

        usable
            .into_iter()
            .enumerate()
            .map(|(i, candle)| IndicatorSnapshot {
                ema20: ema20[i],
                ema50: ema50[i],
                rsi: rsi[i],
                ..IndicatorSnapshot::bare(candle)
            })
            .filter(IndicatorSnapshot::has_core_fields)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::candle_at;

    fn trending(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let close = 100.0 + i as f64 * 0.5;
                candle_at(i, close - 0.2, close + 0.5, close - 0.5, close, 1_000.0 + i as f64)
            })
            .collect()
    }

    #[test]
    fn full_lookback_keeps_only_trailing_rows() {
        let candles = trending(120);
        let rows = IndicatorEngine::default().compute(&candles);
        // EMA(100) is the longest lookback: first complete row is index 99.
        assert_eq!(rows.len(), 21);
        assert_eq!(rows[0].candle, candles[99]);
        assert!(rows.iter().all(IndicatorSnapshot::is_complete));
    }

    #[test]
    fn short_history_yields_nothing() {
        assert!(IndicatorEngine::default().compute(&trending(99)).is_empty());
        assert!(IndicatorEngine::default().compute(&[]).is_empty());
    }

    #[test]
    fn non_finite_volume_degrades_to_core_fields() {
        let mut candles = trending(120);
        candles[110].volume = f64::NAN;
        let rows = IndicatorEngine::default().compute(&candles);

        assert!(!rows.is_empty());
        assert!(rows.iter().all(IndicatorSnapshot::has_core_fields));
        assert!(rows.iter().all(|r| r.ema100.is_none() && r.macd.is_none() && r.atr.is_none()));
        // The bad row is dropped; rows start once EMA(50) is warm on the remaining 119.
        assert_eq!(rows.len(), 119 - 49);
        assert!(rows.iter().all(|r| r.candle.volume.is_finite()));
    }

    #[test]
    fn describe_lists_configured_indicators() {
        let described = IndicatorEngine::default().describe();
        assert_eq!(described["EMA(100)"]["period"], 100);
        assert_eq!(described["RSI(14)"]["period"], 14);
        assert_eq!(described["MACD(12,26,9)"]["signal"], 9);
        assert_eq!(described["SMA(20)"]["source"], "volume");
        assert_eq!(described.as_object().unwrap().len(), 9);
    }

    #[test]
    fn degraded_path_with_too_few_rows_is_empty() {
        let mut candles = trending(40);
        candles[0].high = f64::INFINITY;
        assert!(IndicatorEngine::default().compute(&candles).is_empty());
    }
}
