// Moving-average stack trend classification
use crate::indicators::IndicatorSnapshot;
use shared::models::TrendBias;

/// Minimum EMA20/EMA50 spread, in percent, for a stack to count as trending.
const MIN_SHORT_SPREAD_PCT: f64 = 0.5;
const MAX_STRENGTH: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendReading {
    pub bias: TrendBias,
    /// 0..=10
    pub strength: f64,
}

impl TrendReading {
    pub fn flat() -> Self {
        TrendReading {
            bias: TrendBias::Flat,
            strength: 0.0,
        }
    }
}

/// Classifies the latest snapshot. Missing or non-finite EMAs read as flat.
pub fn classify(snapshot: &IndicatorSnapshot) -> TrendReading {
    match (snapshot.ema20, snapshot.ema50, snapshot.ema100) {
        (Some(ema20), Some(ema50), Some(ema100)) => classify_emas(ema20, ema50, ema100),
        _ => {
            tracing::debug!("Trend classification skipped: EMA stack incomplete");
            TrendReading::flat()
        }
    }
}

pub fn classify_emas(ema20: f64, ema50: f64, ema100: f64) -> TrendReading {
    let short_spread = (ema20 - ema50) / ema50 * 100.0;
    let long_spread = (ema50 - ema100) / ema100 * 100.0;
    if !short_spread.is_finite() || !long_spread.is_finite() {
        tracing::debug!(ema20, ema50, ema100, "Trend classification skipped: non-finite spread");
        return TrendReading::flat();
    }

    let strength = MAX_STRENGTH.min((short_spread.abs() + long_spread.abs()) / 2.0);
    if ema20 > ema50 && ema50 > ema100 && short_spread > MIN_SHORT_SPREAD_PCT {
        TrendReading { bias: TrendBias::Up, strength }
    } else if ema20 < ema50 && ema50 < ema100 && short_spread < -MIN_SHORT_SPREAD_PCT {
        TrendReading { bias: TrendBias::Down, strength }
    } else {
        TrendReading::flat()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stacked_up_emas_read_as_up() {
        let reading = classify_emas(110.0, 100.0, 90.0);
        assert_eq!(reading.bias, TrendBias::Up);
        // (10 + 11.11) / 2 > 10, capped
        assert_eq!(reading.strength, 10.0);
    }

    #[test]
    fn stacked_down_emas_read_as_down() {
        let reading = classify_emas(99.0, 100.0, 101.0);
        assert_eq!(reading.bias, TrendBias::Down);
        let expected = (1.0 + (1.0f64 / 101.0 * 100.0)) / 2.0;
        assert!((reading.strength - expected).abs() < 1e-9);
    }

    #[test]
    fn narrow_spread_is_flat() {
        // Ordered up, but EMA20 only 0.3% above EMA50.
        assert_eq!(classify_emas(100.3, 100.0, 99.0), TrendReading::flat());
    }

    #[test]
    fn tangled_stack_is_flat() {
        assert_eq!(classify_emas(110.0, 100.0, 105.0), TrendReading::flat());
    }

    #[test]
    fn degenerate_values_are_flat() {
        assert_eq!(classify_emas(1.0, 0.0, 1.0), TrendReading::flat());
        assert_eq!(classify_emas(f64::NAN, 100.0, 90.0), TrendReading::flat());
    }

    #[test]
    fn missing_ema100_is_flat() {
        let candle = crate::indicators::test_support::candle_at(0, 1.0, 1.0, 1.0, 1.0, 1.0);
        let snapshot = IndicatorSnapshot {
            ema20: Some(110.0),
            ema50: Some(100.0),
            ..IndicatorSnapshot::bare(candle)
        };
        assert_eq!(classify(&snapshot), TrendReading::flat());
    }
}
