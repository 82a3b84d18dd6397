// Signal engine entry point
use anyhow::Context;
use engine::config::EngineSettings;
use engine::data::{BinanceFuturesClient, CandleProvider, InstrumentStatsProvider, MarketDataStore};
use engine::scanner::{MarketScanner, ScanScheduler, SymbolUniverseSelector};
use engine::services::{SignalScannerServer, SignalScannerService};
use shared::models::RankedSignal;
use shared::utils::format_percent;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch, RwLock};
use tonic::transport::Server;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting signal engine...");

    let settings = EngineSettings::load().context("loading engine settings")?;
    let addr = tokio::net::lookup_host(settings.listen_addr())
        .await?
        .next()
        .with_context(|| format!("cannot resolve {}", settings.listen_addr()))?;

    let market_data_store = Arc::new(RwLock::new(MarketDataStore::new()));
    let (candles, stats): (Arc<dyn CandleProvider>, Arc<dyn InstrumentStatsProvider>) = if settings.offline {
        info!("Offline mode: scanning candles loaded through LoadCsvData");
        let candles: Arc<dyn CandleProvider> = market_data_store.clone();
        let stats: Arc<dyn InstrumentStatsProvider> = market_data_store.clone();
        (candles, stats)
    } else {
        let client = Arc::new(BinanceFuturesClient::new(
            &settings.provider.rest_url,
            settings.provider.request_timeout(),
        )?);
        info!(url = %settings.provider.rest_url, "Using exchange market data");
        let candles: Arc<dyn CandleProvider> = client.clone();
        let stats: Arc<dyn InstrumentStatsProvider> = client;
        (candles, stats)
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let selector = SymbolUniverseSelector::new(stats, settings.universe.clone(), settings.scanner.fetch_timeout());
    let scanner = Arc::new(
        MarketScanner::new(candles, selector, settings.scanner.clone()).with_shutdown(shutdown_rx.clone()),
    );

    info!(indicators = %scanner.generator().indicators().describe(), "Indicator set");

    let (batch_tx, batch_rx) = mpsc::channel(16);
    let (signals_tx, _) = broadcast::channel(16);
    let scheduler = ScanScheduler::new(scanner.clone(), &settings.scanner, batch_tx, shutdown_rx);
    let scheduler_handle = tokio::spawn(scheduler.run());
    let relay_handle = tokio::spawn(relay_batches(batch_rx, signals_tx.clone()));

    let service = SignalScannerService::new(scanner, market_data_store, signals_tx);
    info!(%addr, "Engine listening");

    Server::builder()
        .add_service(SignalScannerServer::new(service))
        .serve_with_shutdown(addr, shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    scheduler_handle.await?;
    relay_handle.await?;
    info!("Signal engine stopped");
    Ok(())
}

/// Logs each scheduled batch and fans it out to stream subscribers.
async fn relay_batches(mut batches: mpsc::Receiver<Vec<RankedSignal>>, signals: broadcast::Sender<Vec<RankedSignal>>) {
    while let Some(batch) = batches.recv().await {
        for ranked in &batch {
            info!(
                symbol = %ranked.symbol,
                side = %ranked.signal.side,
                confidence = %format_percent(ranked.signal.confidence),
                entry = ranked.signal.entry,
                stop = ranked.signal.stop,
                tp1 = ranked.signal.tp1,
                "Scheduled signal"
            );
        }
        // No subscribers is fine.
        let _ = signals.send(batch);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error_detail = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, gracefully stopping...");
}
