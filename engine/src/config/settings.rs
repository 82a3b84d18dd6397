// Engine settings: optional JSON file, then environment overrides.
use crate::error::EngineError;
use serde::Deserialize;
use shared::models::Timeframe;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_PATH_VAR: &str = "ENGINE_CONFIG";

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct EngineSettings {
    pub host: String,
    pub port: u16,
    /// Serve scans from the in-memory store instead of the exchange.
    pub offline: bool,
    pub scanner: ScannerSettings,
    pub universe: UniverseSettings,
    pub provider: ProviderSettings,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ScannerSettings {
    pub max_concurrency: usize,
    pub fetch_timeout_secs: u64,
    pub min_confidence: f64,
    pub primary_timeframe: Timeframe,
    pub primary_limit: usize,
    pub higher_timeframe: Timeframe,
    pub higher_limit: usize,
    pub signal_interval_secs: u64,
    pub max_signals: usize,
    /// Scheduler ticks between universe refreshes.
    pub universe_refresh_every: u32,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct UniverseSettings {
    pub quote_asset: String,
    pub exclusions: Vec<String>,
    pub min_symbol_len: usize,
    pub max_symbol_len: usize,
    pub min_quote_volume: f64,
    pub limit: usize,
    pub fallback: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ProviderSettings {
    pub rest_url: String,
    pub request_timeout_secs: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            host: "localhost".to_string(),
            port: 50051,
            offline: false,
            scanner: ScannerSettings::default(),
            universe: UniverseSettings::default(),
            provider: ProviderSettings::default(),
        }
    }
}

impl Default for ScannerSettings {
    fn default() -> Self {
        ScannerSettings {
            max_concurrency: 8,
            fetch_timeout_secs: 20,
            min_confidence: 0.6,
            primary_timeframe: Timeframe::Minute5,
            primary_limit: 100,
            higher_timeframe: Timeframe::Hour1,
            higher_limit: 100,
            signal_interval_secs: 300,
            max_signals: 5,
            universe_refresh_every: 12,
        }
    }
}

impl Default for UniverseSettings {
    fn default() -> Self {
        let owned = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        UniverseSettings {
            quote_asset: "USDT".to_string(),
            exclusions: owned(&[
                "PUMPUSDT", "BLUAIUSDT", "COAIUSDT", "LIGHTUSDT", "ASTERUSDT", "RIVERUSDT", "FARTCOINUSDT",
                "ALPACAUSDT", "AIAUSDT", "ALPHAUSDT", "ZECUSDT", "TAOUSDT", "HYPEUSDT",
            ]),
            min_symbol_len: 7,
            max_symbol_len: 12,
            min_quote_volume: 10_000_000.0,
            limit: 25,
            fallback: owned(&[
                "BTCUSDT", "ETHUSDT", "BNBUSDT", "SOLUSDT", "XRPUSDT", "ADAUSDT", "AVAXUSDT", "DOTUSDT", "LINKUSDT",
                "MATICUSDT", "DOGEUSDT", "LTCUSDT",
            ]),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        ProviderSettings {
            rest_url: crate::data::binance::DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 20,
        }
    }
}

impl ScannerSettings {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn signal_interval(&self) -> Duration {
        Duration::from_secs(self.signal_interval_secs)
    }
}

impl ProviderSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl EngineSettings {
    /// Reads the file named by `ENGINE_CONFIG` (if any), then applies
    /// environment overrides.
    pub fn load() -> Result<Self, EngineError> {
        let mut settings = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::from_json_file(path.trim())?,
            _ => Self::default(),
        };
        settings.apply_overrides(|name| std::env::var(name).ok());
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
            .map_err(|e| EngineError::ConfigError(format!("{}: {}", path.display(), e)))
    }

    pub fn from_json_str(raw: &str) -> Result<Self, EngineError> {
        serde_json::from_str(raw).map_err(|e| EngineError::ConfigError(e.to_string()))
    }

    /// Overrides from a variable lookup; unset, blank or unparsable values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let parsed = |name: &str| var(name).and_then(|s| s.parse::<u64>().ok());

        if let Some(host) = var("ENGINE_HOST") {
            self.host = host;
        }
        if let Some(port) = var("ENGINE_PORT").and_then(|s| s.parse().ok()) {
            self.port = port;
        }
        if let Some(offline) = var("ENGINE_OFFLINE") {
            self.offline = matches!(offline.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        if let Some(secs) = parsed("SIGNAL_CHECK_INTERVAL_SEC") {
            self.scanner.signal_interval_secs = secs;
        }
        if let Some(max) = parsed("SCAN_MAX_SIGNALS") {
            self.scanner.max_signals = max as usize;
        }
        if let Some(url) = var("BINANCE_REST_URL") {
            self.provider.rest_url = url;
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.scanner.max_concurrency == 0 {
            return Err(EngineError::ConfigError("scanner.max_concurrency must be at least 1".to_string()));
        }
        if self.scanner.signal_interval_secs == 0 {
            return Err(EngineError::ConfigError("scanner.signal_interval_secs must be at least 1".to_string()));
        }
        if self.universe.min_symbol_len > self.universe.max_symbol_len {
            return Err(EngineError::ConfigError(format!(
                "universe symbol length range [{}, {}] is empty",
                self.universe.min_symbol_len, self.universe.max_symbol_len
            )));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn partial_json_keeps_defaults() {
        let settings = EngineSettings::from_json_str(
            r#"{"port": 6000, "scanner": {"primary_timeframe": "15m", "max_signals": 3}, "universe": {"limit": 10}}"#,
        )
        .unwrap();
        assert_eq!(settings.port, 6000);
        assert_eq!(settings.host, "localhost");
        assert_eq!(settings.scanner.primary_timeframe, Timeframe::Minute15);
        assert_eq!(settings.scanner.higher_timeframe, Timeframe::Hour1);
        assert_eq!(settings.scanner.max_signals, 3);
        assert_eq!(settings.scanner.min_confidence, 0.6);
        assert_eq!(settings.universe.limit, 10);
        assert_eq!(settings.universe.fallback.len(), 12);
    }

    #[test]
    fn unknown_timeframe_is_config_error() {
        let err = EngineSettings::from_json_str(r#"{"scanner": {"higher_timeframe": "2h"}}"#).unwrap_err();
        assert!(matches!(err, EngineError::ConfigError(_)));
    }

    #[test]
    fn reads_settings_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"offline": true, "provider": {{"rest_url": "http://127.0.0.1:9000"}}}}"#).unwrap();
        let settings = EngineSettings::from_json_file(file.path()).unwrap();
        assert!(settings.offline);
        assert_eq!(settings.provider.rest_url, "http://127.0.0.1:9000");
        assert_eq!(settings.provider.request_timeout(), Duration::from_secs(20));
    }

    #[test]
    fn env_overrides_apply_over_file_values() {
        let vars: HashMap<&str, &str> = [
            ("ENGINE_HOST", "0.0.0.0"),
            ("ENGINE_PORT", "7000"),
            ("SIGNAL_CHECK_INTERVAL_SEC", " 60 "),
            ("SCAN_MAX_SIGNALS", "not-a-number"),
            ("BINANCE_REST_URL", ""),
            ("ENGINE_OFFLINE", "yes"),
        ]
        .into_iter()
        .collect();
        let mut settings = EngineSettings::default();
        settings.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(settings.listen_addr(), "0.0.0.0:7000");
        assert_eq!(settings.scanner.signal_interval(), Duration::from_secs(60));
        assert_eq!(settings.scanner.max_signals, 5);
        assert_eq!(settings.provider.rest_url, crate::data::binance::DEFAULT_BASE_URL);
        assert!(settings.offline);
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut settings = EngineSettings::default();
        assert!(settings.validate().is_ok());
        settings.scanner.max_concurrency = 0;
        assert!(settings.validate().is_err());
    }
}
