// Confidence scoring from oscillator position, momentum and volume.
use shared::models::TrendBias;

const MAX_MOMENTUM_BONUS: f64 = 0.4;
const MOMENTUM_WEIGHT: f64 = 0.5;
const HIGH_VOLUME_RATIO: f64 = 1.2;
const LOW_VOLUME_RATIO: f64 = 0.8;
const VOLUME_ADJUSTMENT: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInputs {
    pub bias: TrendBias,
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    /// Last volume over its moving average; 1.0 when unknown.
    pub volume_ratio: f64,
}

/// Sum of the RSI, momentum and volume terms, clamped to `[0, 1]`.
pub fn score(inputs: &ConfidenceInputs) -> f64 {
    let total = finite_or_zero(rsi_term(inputs.bias, inputs.rsi))
        + finite_or_zero(momentum_term(inputs.bias, inputs.macd, inputs.macd_signal))
        + finite_or_zero(volume_term(inputs.volume_ratio));
    total.clamp(0.0, 1.0)
}

fn finite_or_zero(term: f64) -> f64 {
    if term.is_finite() {
        term
    } else {
        tracing::debug!(term, "Dropping non-finite confidence term");
        0.0
    }
}

fn rsi_term(bias: TrendBias, rsi: f64) -> f64 {
    match bias {
        TrendBias::Up => {
            if rsi > 55.0 && rsi < 65.0 {
                0.4
            } else if rsi > 50.0 && rsi <= 55.0 {
                0.2
            } else if rsi > 70.0 {
                -0.2
            } else {
                0.0
            }
        }
        TrendBias::Down => {
            if rsi > 35.0 && rsi < 45.0 {
                0.4
            } else if (45.0..50.0).contains(&rsi) {
                0.2
            } else if rsi < 30.0 {
                -0.2
            } else {
                0.0
            }
        }
        TrendBias::Flat => 0.0,
    }
}

fn momentum_term(bias: TrendBias, macd: f64, macd_signal: f64) -> f64 {
    let confirms = match bias {
        TrendBias::Up => macd > macd_signal,
        TrendBias::Down => macd < macd_signal,
        TrendBias::Flat => false,
    };
    if !confirms {
        return 0.0;
    }
    let relative_gap = if macd_signal != 0.0 {
        (macd - macd_signal).abs() / macd_signal.abs()
    } else {
        0.0
    };
    MAX_MOMENTUM_BONUS.min(relative_gap * MOMENTUM_WEIGHT)
}

fn volume_term(volume_ratio: f64) -> f64 {
    if volume_ratio > HIGH_VOLUME_RATIO {
        VOLUME_ADJUSTMENT
    } else if volume_ratio < LOW_VOLUME_RATIO {
        -VOLUME_ADJUSTMENT
    } else {
        0.0
    }
}
