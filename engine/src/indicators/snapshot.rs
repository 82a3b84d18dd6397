use shared::models::Candle;

/// One candle together with the indicator values computed up to it.
///
/// After a degraded computation only `ema20`, `ema50` and `rsi` are present.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSnapshot {
    pub candle: Candle,
    pub ema20: Option<f64>,
    pub ema50: Option<f64>,
    pub ema100: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub atr: Option<f64>,
    pub channel_upper: Option<f64>,
    pub channel_lower: Option<f64>,
    pub volume_sma: Option<f64>,
}

impl IndicatorSnapshot {
    pub fn bare(candle: Candle) -> Self {
        IndicatorSnapshot {
            candle,
            ema20: None,
            ema50: None,
            ema100: None,
            rsi: None,
            macd: None,
            macd_signal: None,
            atr: None,
            channel_upper: None,
            channel_lower: None,
            volume_sma: None,
        }
    }

    pub fn close(&self) -> f64 {
        self.candle.close
    }

    pub fn volume(&self) -> f64 {
        self.candle.volume
    }

    fn candle_is_finite(&self) -> bool {
        let c = &self.candle;
        [c.open, c.high, c.low, c.close, c.volume].iter().all(|v| v.is_finite())
    }

    /// Every indicator field is present and finite.
    pub fn is_complete(&self) -> bool {
        self.candle_is_finite()
            && [
                self.ema20,
                self.ema50,
                self.ema100,
                self.rsi,
                self.macd,
                self.macd_signal,
                self.atr,
                self.channel_upper,
                self.channel_lower,
                self.volume_sma,
            ]
            .iter()
            .all(|v| v.map_or(false, f64::is_finite))
    }

    /// The reduced field set kept after a degraded computation is present.
    pub fn has_core_fields(&self) -> bool {
        self.candle_is_finite()
            && [self.ema20, self.ema50, self.rsi]
                .iter()
                .all(|v| v.map_or(false, f64::is_finite))
    }
}
