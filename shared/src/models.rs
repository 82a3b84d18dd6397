use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    Minute1,
    #[serde(rename = "5m")]
    Minute5,
    #[serde(rename = "15m")]
    Minute15,
    #[serde(rename = "30m")]
    Minute30,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "1d")]
    Day1,
}

impl Timeframe {
    /// Interval code understood by the exchange kline endpoints.
    pub fn as_interval(&self) -> &'static str {
        match self {
            Timeframe::Minute1 => "1m",
            Timeframe::Minute5 => "5m",
            Timeframe::Minute15 => "15m",
            Timeframe::Minute30 => "30m",
            Timeframe::Hour1 => "1h",
            Timeframe::Hour4 => "4h",
            Timeframe::Day1 => "1d",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_interval())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTimeframeError(pub String);

impl fmt::Display for ParseTimeframeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown timeframe '{}'", self.0)
    }
}

impl std::error::Error for ParseTimeframeError {}

impl FromStr for Timeframe {
    type Err = ParseTimeframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1m" => Ok(Timeframe::Minute1),
            "5m" => Ok(Timeframe::Minute5),
            "15m" => Ok(Timeframe::Minute15),
            "30m" => Ok(Timeframe::Minute30),
            "1h" => Ok(Timeframe::Hour1),
            "4h" => Ok(Timeframe::Hour4),
            "1d" => Ok(Timeframe::Day1),
            other => Err(ParseTimeframeError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Long,
    Short,
    None,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Side::Long => "LONG",
            Side::Short => "SHORT",
            Side::None => "NONE",
        };
        f.write_str(s)
    }
}

/// Direction of the moving-average stack on one timeframe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TrendBias {
    Up,
    Down,
    Flat,
}

impl fmt::Display for TrendBias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrendBias::Up => "up",
            TrendBias::Down => "down",
            TrendBias::Flat => "flat",
        };
        f.write_str(s)
    }
}

/// A directional trade idea with its price levels.
///
/// Levels are ordered `stop < entry < tp1 < tp2 < tp3` for longs and mirrored
/// for shorts. A `Side::None` signal built through [`Signal::none`] carries
/// every level at `entry`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub side: Side,
    pub reason: String,
    pub entry: f64,
    pub stop: f64,
    pub tp1: f64,
    pub tp2: f64,
    pub tp3: f64,
    pub confidence: f64,
}

impl Signal {
    /// No trade; all levels collapse onto `entry`.
    pub fn none(reason: impl Into<String>, entry: f64, confidence: f64) -> Self {
        Signal {
            side: Side::None,
            reason: reason.into(),
            entry,
            stop: entry,
            tp1: entry,
            tp2: entry,
            tp3: entry,
            confidence,
        }
    }

    /// No trade and no usable levels.
    pub fn empty(reason: impl Into<String>) -> Self {
        Signal::none(reason, 0.0, 0.0)
    }

    pub fn is_actionable(&self) -> bool {
        self.side != Side::None
    }
}

/// 24h statistics for one listed instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentStats {
    pub symbol: String,
    pub quote_volume: f64,
}

/// A retained signal for one symbol from a scan pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub signal: Signal,
    /// `confidence * 10`.
    pub strength: f64,
    pub timeframes: Vec<Timeframe>,
    pub price: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSignal {
    pub symbol: String,
    pub signal: Signal,
    pub strength: f64,
    pub timeframes: Vec<Timeframe>,
    pub price: f64,
    pub volume: f64,
}

impl RankedSignal {
    pub fn from_scan(symbol: impl Into<String>, result: ScanResult) -> Self {
        RankedSignal {
            symbol: symbol.into(),
            signal: result.signal,
            strength: result.strength,
            timeframes: result.timeframes,
            price: result.price,
            volume: result.volume,
        }
    }
}
