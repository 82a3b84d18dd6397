// Universe scan: per-symbol fan-out, quality gate and ranking
use super::universe::SymbolUniverseSelector;
use crate::config::ScannerSettings;
use crate::data::CandleProvider;
use crate::error::EngineError;
use crate::strategy::SignalGenerator;
use shared::models::{Candle, RankedSignal, ScanResult, Signal, Timeframe};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock, Semaphore};

pub struct MarketScanner {
    candles: Arc<dyn CandleProvider>,
    selector: SymbolUniverseSelector,
    generator: Arc<SignalGenerator>,
    settings: ScannerSettings,
    universe: RwLock<Vec<String>>,
    shutdown: Option<watch::Receiver<bool>>,
}

impl MarketScanner {
    pub fn new(candles: Arc<dyn CandleProvider>, selector: SymbolUniverseSelector, settings: ScannerSettings) -> Self {
        MarketScanner {
            candles,
            selector,
            generator: Arc::new(SignalGenerator::default()),
            settings,
            universe: RwLock::new(Vec::new()),
            shutdown: None,
        }
    }

    pub fn with_generator(mut self, generator: SignalGenerator) -> Self {
        self.generator = Arc::new(generator);
        self
    }

    /// Symbols not yet started are skipped once the receiver reads `true`.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn settings(&self) -> &ScannerSettings {
        &self.settings
    }

    pub fn generator(&self) -> &SignalGenerator {
        &self.generator
    }

    pub async fn universe(&self) -> Vec<String> {
        self.universe.read().await.clone()
    }

    /// Replaces the cached universe wholesale and returns it.
    pub async fn refresh_universe(&self) -> Vec<String> {
        let fresh = self.selector.fetch(self.selector.default_limit()).await;
        *self.universe.write().await = fresh.clone();
        fresh
    }

    /// Signals retained from one pass over `symbols`. Symbols whose data cannot
    /// be fetched are logged and left out.
    pub async fn scan(&self, symbols: &[String]) -> HashMap<String, ScanResult> {
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrency.max(1)));
        let mut tasks = Vec::with_capacity(symbols.len());

        for symbol in symbols {
            if self.is_cancelled() {
                tracing::info!(remaining = symbols.len() - tasks.len(), "Scan cancelled");
                break;
            }
            let semaphore = semaphore.clone();
            let candles = self.candles.clone();
            let generator = self.generator.clone();
            let settings = self.settings.clone();
            let shutdown = self.shutdown.clone();
            let symbol = symbol.clone();

            tasks.push(tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (symbol, Ok(None));
                };
                if shutdown.as_ref().map_or(false, |rx| *rx.borrow()) {
                    return (symbol, Ok(None));
                }
                let outcome = scan_symbol(candles.as_ref(), &generator, &settings, &symbol).await;
                (symbol, outcome)
            }));
        }

        let mut results = HashMap::new();
        for task in tasks {
            match task.await {
                Ok((symbol, Ok(Some(result)))) => {
                    tracing::info!(
                        symbol = %symbol,
                        side = %result.signal.side,
                        confidence = result.signal.confidence,
                        "Quality signal found"
                    );
                    results.insert(symbol, result);
                }
                Ok((_, Ok(None))) => {}
                Ok((symbol, Err(e))) => {
                    tracing::warn!(symbol = %symbol, error_detail = %e, "Skipping symbol");
                }
                Err(e) => {
                    tracing::warn!(error_detail = %e, "Scan task failed");
                }
            }
        }
        results
    }

    /// Scans the cached universe (refreshing it first if empty) and returns the
    /// top `max_signals` by strength, then volume.
    pub async fn best_signals(&self, max_signals: usize) -> Vec<RankedSignal> {
        let mut symbols = self.universe().await;
        if symbols.is_empty() {
            symbols = self.refresh_universe().await;
        }
        let ranked = rank(self.scan(&symbols).await, max_signals);
        if ranked.is_empty() {
            tracing::info!(scanned = symbols.len(), "No quality signals in current market conditions");
        } else {
            tracing::info!(count = ranked.len(), "Found quality signals");
        }
        ranked
    }

    /// On-demand signal for one symbol, without the quality gate. Only the
    /// primary window is required; the higher timeframe is dropped if missing.
    pub async fn generate_signal(&self, symbol: &str) -> Signal {
        let settings = &self.settings;
        let timeout = settings.fetch_timeout();
        let (primary, higher) = tokio::join!(
            fetch_window(self.candles.as_ref(), symbol, settings.primary_timeframe, settings.primary_limit, timeout),
            fetch_window(self.candles.as_ref(), symbol, settings.higher_timeframe, settings.higher_limit, timeout),
        );

        let primary = match primary {
            Ok(primary) => primary,
            Err(e) => {
                tracing::warn!(symbol = %symbol, error_detail = %e, "No candles for signal request");
                return Signal::empty("No data");
            }
        };
        let higher = match higher {
            Ok(higher) => Some(higher),
            Err(e) => {
                tracing::debug!(symbol = %symbol, error_detail = %e, "Higher timeframe unavailable, signalling without it");
                None
            }
        };
        self.generator.generate(&primary, higher.as_deref())
    }

    fn is_cancelled(&self) -> bool {
        self.shutdown.as_ref().map_or(false, |rx| *rx.borrow())
    }
}

/// Orders by strength then volume, both descending, and keeps the first `max_signals`.
pub fn rank(results: HashMap<String, ScanResult>, max_signals: usize) -> Vec<RankedSignal> {
    let mut ranked: Vec<RankedSignal> = results
        .into_iter()
        .map(|(symbol, result)| RankedSignal::from_scan(symbol, result))
        .collect();
    ranked.sort_by(|a, b| {
        b.strength
            .total_cmp(&a.strength)
            .then_with(|| b.volume.total_cmp(&a.volume))
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    ranked.truncate(max_signals);
    ranked
}

async fn scan_symbol(
    candles: &dyn CandleProvider,
    generator: &SignalGenerator,
    settings: &ScannerSettings,
    symbol: &str,
) -> Result<Option<ScanResult>, EngineError> {
    let (primary, higher) = fetch_windows(candles, settings, symbol).await?;
    let signal = generator.generate(&primary, Some(&higher));
    if !signal.is_actionable() || signal.confidence <= settings.min_confidence {
        tracing::debug!(symbol = %symbol, reason = %signal.reason, "Signal below quality gate");
        return Ok(None);
    }

    let Some(last) = primary.last() else {
        return Ok(None);
    };
    Ok(Some(ScanResult {
        strength: signal.confidence * 10.0,
        timeframes: vec![settings.primary_timeframe, settings.higher_timeframe],
        price: last.close,
        volume: last.volume,
        signal,
    }))
}

async fn fetch_windows(
    candles: &dyn CandleProvider,
    settings: &ScannerSettings,
    symbol: &str,
) -> Result<(Vec<Candle>, Vec<Candle>), EngineError> {
    let timeout = settings.fetch_timeout();
    let (primary, higher) = tokio::join!(
        fetch_window(candles, symbol, settings.primary_timeframe, settings.primary_limit, timeout),
        fetch_window(candles, symbol, settings.higher_timeframe, settings.higher_limit, timeout),
    );
    Ok((primary?, higher?))
}

async fn fetch_window(
    candles: &dyn CandleProvider,
    symbol: &str,
    timeframe: Timeframe,
    limit: usize,
    timeout: Duration,
) -> Result<Vec<Candle>, EngineError> {
    let window = tokio::time::timeout(timeout, candles.fetch_candles(symbol, timeframe, limit))
        .await
        .map_err(|_| EngineError::Timeout(timeout))??;
    if window.is_empty() {
        return Err(EngineError::MarketDataError(format!("no {} candles for {}", timeframe, symbol)));
    }
    Ok(window)
}
