// Rolling price channel: highest high / lowest low over a window
use super::{check_period, finite_series, IndicatorCalculator, Source};
use crate::error::EngineError;
use serde_json::Value;
use shared::models::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelBound {
    Upper,
    Lower,
}

pub struct Channel {
    name: String,
    period: usize,
    bound: ChannelBound,
}

impl Channel {
    pub fn upper(period: usize) -> Self {
        Self {
            name: format!("CHANNEL_UPPER({})", period),
            period,
            bound: ChannelBound::Upper,
        }
    }

    pub fn lower(period: usize) -> Self {
        Self {
            name: format!("CHANNEL_LOWER({})", period),
            period,
            bound: ChannelBound::Lower,
        }
    }
}

impl IndicatorCalculator for Channel {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        let bound = match self.bound {
            ChannelBound::Upper => "upper",
            ChannelBound::Lower => "lower",
        };
        serde_json::json!({ "period": self.period, "bound": bound })
    }

    fn calculate(&self, data: &[Candle]) -> Result<Vec<Option<f64>>, EngineError> {
        check_period(self.period, &self.name)?;
        let (source, pick): (Source, fn(f64, f64) -> f64) = match self.bound {
            ChannelBound::Upper => (Source::High, f64::max),
            ChannelBound::Lower => (Source::Low, f64::min),
        };
        let values = finite_series(data, source, &self.name)?;

        Ok((0..values.len())
            .map(|i| {
                if i + 1 < self.period {
                    None
                } else {
                    values[i + 1 - self.period..=i].iter().copied().reduce(pick)
                }
            })
            .collect())
    }
}
