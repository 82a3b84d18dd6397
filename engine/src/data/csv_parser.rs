use crate::error::EngineError;
use csv::{ReaderBuilder, StringRecord};
use shared::models::Candle;
use std::fs::File;
use std::io::BufReader;

// Field parsing for exchange kline exports
pub mod kline_format {
    use anyhow::{anyhow, Result};
    use chrono::{DateTime, Utc};
    use std::str::FromStr;

    /// Plain decimal such as "43250.10". Non-finite values are rejected.
    pub fn parse_decimal(s: &str) -> Result<f64> {
        let value = f64::from_str(s.trim()).map_err(|e| anyhow!("Failed to parse decimal '{}': {}", s, e))?;
        if !value.is_finite() {
            return Err(anyhow!("Non-finite decimal '{}'", s));
        }
        Ok(value)
    }

    /// Epoch milliseconds ("1704067200000") or RFC 3339 ("2024-01-01T00:00:00Z").
    pub fn parse_open_time(s: &str) -> Result<DateTime<Utc>> {
        let s = s.trim();
        if let Ok(millis) = s.parse::<i64>() {
            return DateTime::from_timestamp_millis(millis)
                .ok_or_else(|| anyhow!("Timestamp out of range: {}", millis));
        }
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| anyhow!("Failed to parse open time '{}': {}", s, e))
    }

}

const REQUIRED_COLUMNS: [&str; 6] = ["open_time", "open", "high", "low", "close", "volume"];

pub struct CsvCandleSource;

impl CsvCandleSource {
    // Header: open_time,open,high,low,close,volume (extra columns ignored)
    // Row:    1704067200000,42283.58,42554.57,42261.02,42475.23,1271.68
    pub fn load_candles_from_csv(file_path: &str) -> Result<Vec<Candle>, EngineError> {
        let file = File::open(file_path)?;
        let mut rdr = ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(BufReader::new(file));

        let headers = rdr.headers()?.clone();
        let positions = Self::column_positions(&headers)?;

        let mut candles = Vec::new();
        for (idx, result) in rdr.records().enumerate() {
            let line = idx + 2;
            let record = result?;
            let field = |col: usize| -> Result<&str, EngineError> {
                record.get(positions[col]).ok_or_else(|| {
                    EngineError::CsvDataFormatError(format!("Missing '{}' field at line {}", REQUIRED_COLUMNS[col], line))
                })
            };
            let price = |col: usize| -> Result<f64, EngineError> {
                kline_format::parse_decimal(field(col)?).map_err(|e| {
                    EngineError::CsvDataFormatError(format!("Error parsing '{}' at line {}: {}", REQUIRED_COLUMNS[col], line, e))
                })
            };

            let open_time = kline_format::parse_open_time(field(0)?)
                .map_err(|e| EngineError::CsvDataFormatError(format!("Error parsing 'open_time' at line {}: {}", line, e)))?;

            candles.push(Candle {
                open_time,
                open: price(1)?,
                high: price(2)?,
                low: price(3)?,
                close: price(4)?,
                volume: price(5)?,
            });
        }
        tracing::debug!(path = %file_path, count = candles.len(), "Parsed kline CSV");
        Ok(candles)
    }

    fn column_positions(headers: &StringRecord) -> Result<[usize; 6], EngineError> {
        let mut positions = [0usize; 6];
        for (slot, name) in positions.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = headers
                .iter()
                .position(|header| header.eq_ignore_ascii_case(name))
                .ok_or_else(|| EngineError::CsvDataFormatError(format!("Missing '{}' column in header", name)))?;
        }
        Ok(positions)
    }
}
