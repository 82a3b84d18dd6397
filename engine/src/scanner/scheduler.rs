// Periodic best-signal scans pushed to a channel.
use super::market_scanner::MarketScanner;
use crate::config::ScannerSettings;
use shared::models::RankedSignal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

/// Floor for configured scan intervals.
const MIN_SCAN_INTERVAL: Duration = Duration::from_secs(1);
/// `tokio::time::interval` rejects a zero period.
const MIN_TICK: Duration = Duration::from_millis(1);

pub struct ScanScheduler {
    scanner: Arc<MarketScanner>,
    interval: Duration,
    max_signals: usize,
    refresh_every: u32,
    sink: mpsc::Sender<Vec<RankedSignal>>,
    shutdown: watch::Receiver<bool>,
}

impl ScanScheduler {
    pub fn new(
        scanner: Arc<MarketScanner>,
        settings: &ScannerSettings,
        sink: mpsc::Sender<Vec<RankedSignal>>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        ScanScheduler {
            scanner,
            interval: settings.signal_interval().max(MIN_SCAN_INTERVAL),
            max_signals: settings.max_signals,
            refresh_every: settings.universe_refresh_every,
            sink,
            shutdown,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Runs until shutdown is signalled or the sink is closed.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.interval.max(MIN_TICK));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut tick: u64 = 0;
        tracing::info!(interval = ?self.interval, max_signals = self.max_signals, "Scan scheduler started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            if tick > 0 && self.refresh_every > 0 && tick % u64::from(self.refresh_every) == 0 {
                let universe = self.scanner.refresh_universe().await;
                tracing::info!(tick, symbols = universe.len(), "Universe refreshed");
            }
            tick += 1;

            let ranked = self.scanner.best_signals(self.max_signals).await;
            if *self.shutdown.borrow() {
                break;
            }
            if self.sink.send(ranked).await.is_err() {
                tracing::info!("Signal sink closed");
                break;
            }
        }
        tracing::info!(ticks = tick, "Scan scheduler stopped");
    }
}
