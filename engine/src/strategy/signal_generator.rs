// Multi-timeframe confluence signal generation
use super::confidence::{self, ConfidenceInputs};
use super::trend::{self, TrendReading};
use crate::error::EngineError;
use crate::indicators::{IndicatorEngine, IndicatorSnapshot};
use shared::models::{Candle, Side, Signal, TrendBias};
use shared::utils::format_percent;

/// Number of confluence conditions evaluated per direction.
pub const CONDITION_COUNT: usize = 7;

/// Thresholds and multipliers of the confluence gate.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRules {
    pub min_conditions: usize,
    pub min_confidence: f64,
    pub min_trend_strength: f64,
    pub long_rsi_band: (f64, f64),
    pub short_rsi_band: (f64, f64),
    pub divergence_min_strength: f64,
    pub divergence_penalty: f64,
    pub confirmation_min_strength: f64,
    pub confirmation_boost: f64,
    pub atr_stop_multiplier: f64,
    pub fallback_stop_fraction: f64,
    pub take_profit_multiples: [f64; 3],
}

impl Default for SignalRules {
    fn default() -> Self {
        SignalRules {
            min_conditions: 5,
            min_confidence: 0.5,
            min_trend_strength: 1.0,
            long_rsi_band: (55.0, 70.0),
            short_rsi_band: (30.0, 45.0),
            divergence_min_strength: 2.0,
            divergence_penalty: 0.7,
            confirmation_min_strength: 3.0,
            confirmation_boost: 1.2,
            atr_stop_multiplier: 2.0,
            fallback_stop_fraction: 0.03,
            take_profit_multiples: [1.0, 1.5, 2.0],
        }
    }
}

/// A signal together with the readings that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalEvaluation {
    pub signal: Signal,
    pub trend: TrendReading,
    pub higher_trend: TrendReading,
    pub long_score: usize,
    pub short_score: usize,
}

impl SignalEvaluation {
    fn unscored(signal: Signal) -> Self {
        SignalEvaluation {
            signal,
            trend: TrendReading::flat(),
            higher_trend: TrendReading::flat(),
            long_score: 0,
            short_score: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignalGenerator {
    indicators: IndicatorEngine,
    rules: SignalRules,
}

impl SignalGenerator {
    pub fn new(indicators: IndicatorEngine, rules: SignalRules) -> Self {
        SignalGenerator { indicators, rules }
    }

    pub fn indicators(&self) -> &IndicatorEngine {
        &self.indicators
    }

    /// Always yields a signal; faults surface as `Side::None` with a reason.
    pub fn generate(&self, primary: &[Candle], higher: Option<&[Candle]>) -> Signal {
        self.evaluate(primary, higher).signal
    }

    pub fn evaluate(&self, primary: &[Candle], higher: Option<&[Candle]>) -> SignalEvaluation {
        let rows = self.indicators.compute(primary);
        let Some(last) = rows.last() else {
            return SignalEvaluation::unscored(Signal::empty("No data"));
        };

        let higher_trend = self.higher_trend(higher);
        settle(self.decide(last, higher_trend))
    }

    /// Same as [`SignalGenerator::generate`] for an already computed snapshot.
    pub fn generate_from_snapshot(&self, last: &IndicatorSnapshot, higher_trend: TrendReading) -> Signal {
        settle(self.decide(last, higher_trend)).signal
    }

    fn higher_trend(&self, higher: Option<&[Candle]>) -> TrendReading {
        let Some(candles) = higher else {
            return TrendReading::flat();
        };
        match self.indicators.compute(candles).last() {
            Some(last) => trend::classify(last),
            None => {
                tracing::debug!(rows = candles.len(), "Higher timeframe has no usable rows, treating as flat");
                TrendReading::flat()
            }
        }
    }

    /// Scores the latest primary snapshot against the higher-timeframe trend.
    pub fn decide(&self, last: &IndicatorSnapshot, higher_trend: TrendReading) -> Result<SignalEvaluation, EngineError> {
        let entry = last.close();
        let (Some(ema20), Some(_), Some(rsi)) = (last.ema20, last.ema50, last.rsi) else {
            return Ok(SignalEvaluation::unscored(Signal {
                side: Side::None,
                reason: "Missing indicators".to_string(),
                entry,
                stop: 0.0,
                tp1: 0.0,
                tp2: 0.0,
                tp3: 0.0,
                confidence: 0.0,
            }));
        };

        let trend = trend::classify(last);
        let volume_ratio = match last.volume_sma {
            Some(sma) if sma > 0.0 => last.volume() / sma,
            _ => 1.0,
        };
        let macd_signal = last.macd_signal.unwrap_or(0.0);

        let mut confidence = confidence::score(&ConfidenceInputs {
            bias: trend.bias,
            rsi,
            macd: last.macd.unwrap_or(0.0),
            macd_signal,
            volume_ratio,
        });

        // Not re-clamped: a confirmed setup may exceed 1.0.
        if higher_trend.bias != trend.bias && higher_trend.strength > self.rules.divergence_min_strength {
            confidence *= self.rules.divergence_penalty;
        } else if higher_trend.bias == trend.bias && higher_trend.strength > self.rules.confirmation_min_strength {
            confidence *= self.rules.confirmation_boost;
        }

        let (long_low, long_high) = self.rules.long_rsi_band;
        let (short_low, short_high) = self.rules.short_rsi_band;
        let long_score = count([
            trend.bias == TrendBias::Up,
            higher_trend.bias == TrendBias::Up,
            last.macd.map_or(false, |m| m > macd_signal),
            rsi > long_low && rsi < long_high,
            entry > ema20,
            trend.strength > self.rules.min_trend_strength,
            confidence > self.rules.min_confidence,
        ]);
        let short_score = count([
            trend.bias == TrendBias::Down,
            higher_trend.bias == TrendBias::Down,
            last.macd.map_or(false, |m| m < macd_signal),
            rsi > short_low && rsi < short_high,
            entry < ema20,
            trend.strength > self.rules.min_trend_strength,
            confidence > self.rules.min_confidence,
        ]);

        let stop_distance = match last.atr {
            Some(atr) if atr > 0.0 => atr * self.rules.atr_stop_multiplier,
            _ => entry * self.rules.fallback_stop_fraction,
        };

        let signal = if long_score >= self.rules.min_conditions {
            self.directional(Side::Long, entry, stop_distance, confidence, rsi, trend.strength)?
        } else if short_score >= self.rules.min_conditions {
            self.directional(Side::Short, entry, stop_distance, confidence, rsi, trend.strength)?
        } else {
            Signal::none(
                format!(
                    "No strong confluence (LONG: {}/{}, SHORT: {}/{}, confidence: {})",
                    long_score,
                    CONDITION_COUNT,
                    short_score,
                    CONDITION_COUNT,
                    format_percent(confidence)
                ),
                entry,
                confidence,
            )
        };

        Ok(SignalEvaluation {
            signal,
            trend,
            higher_trend,
            long_score,
            short_score,
        })
    }

    fn directional(
        &self,
        side: Side,
        entry: f64,
        stop_distance: f64,
        confidence: f64,
        rsi: f64,
        trend_strength: f64,
    ) -> Result<Signal, EngineError> {
        if !(stop_distance.is_finite() && stop_distance > 0.0) {
            return Err(EngineError::ProcessingError(format!(
                "invalid stop distance {} for entry {}",
                stop_distance, entry
            )));
        }

        let direction = if side == Side::Long { 1.0 } else { -1.0 };
        let stop = entry - direction * stop_distance;
        let risk = (entry - stop).abs();
        let [m1, m2, m3] = self.rules.take_profit_multiples;
        let (tp1, tp2, tp3) = (
            entry + direction * risk * m1,
            entry + direction * risk * m2,
            entry + direction * risk * m3,
        );

        let ordered = if side == Side::Long {
            stop < entry && entry < tp1 && tp1 < tp2 && tp2 < tp3
        } else {
            tp3 < tp2 && tp2 < tp1 && tp1 < entry && entry < stop
        };
        if !ordered {
            return Err(EngineError::ProcessingError(format!(
                "price levels out of order for {} at entry {}",
                side, entry
            )));
        }

        Ok(Signal {
            side,
            reason: format!(
                "STRONG {}: Multi-TF confirmation, RSI {:.1}, Trend strength: {:.1}",
                side, rsi, trend_strength
            ),
            entry,
            stop,
            tp1,
            tp2,
            tp3,
            confidence,
        })
    }
}

fn settle(result: Result<SignalEvaluation, EngineError>) -> SignalEvaluation {
    result.unwrap_or_else(|e| {
        tracing::error!(error_detail = %e, "Signal generation failed");
        SignalEvaluation::unscored(Signal::empty(format!("Error: {}", e)))
    })
}

fn count(conditions: [bool; CONDITION_COUNT]) -> usize {
    conditions.iter().filter(|&&met| met).count()
}
