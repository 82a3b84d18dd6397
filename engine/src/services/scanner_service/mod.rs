// SignalScanner service: dispatches each RPC to its handler module.
use super::{
    BestSignalsRequest, BestSignalsResponse, LoadCsvRequest, LoadCsvResponse, RefreshUniverseRequest, SignalRequest,
    SignalResponse, SignalScanner, StreamSignalsRequest, UniverseResponse,
};
use crate::data::MarketDataStore;
use crate::scanner::MarketScanner;
use shared::models::RankedSignal;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status};

pub mod get_best_signals;
pub mod get_signal;
pub mod helpers;
pub mod load_csv_data;
pub mod refresh_universe;
pub mod stream_signals;

pub struct SignalScannerService {
    scanner: Arc<MarketScanner>,
    market_data_store: Arc<RwLock<MarketDataStore>>,
    signals: broadcast::Sender<Vec<RankedSignal>>,
    default_max_signals: usize,
}

impl SignalScannerService {
    pub fn new(
        scanner: Arc<MarketScanner>,
        market_data_store: Arc<RwLock<MarketDataStore>>,
        signals: broadcast::Sender<Vec<RankedSignal>>,
    ) -> Self {
        let default_max_signals = scanner.settings().max_signals;
        SignalScannerService {
            scanner,
            market_data_store,
            signals,
            default_max_signals,
        }
    }
}

#[tonic::async_trait]
impl SignalScanner for SignalScannerService {
    async fn get_signal(&self, request: Request<SignalRequest>) -> Result<Response<SignalResponse>, Status> {
        let req_payload = request.into_inner();
        tracing::info!(symbol = %req_payload.symbol, "Received GetSignal request");
        get_signal::handle_get_signal(req_payload, self.scanner.clone()).await
    }

    async fn get_best_signals(
        &self,
        request: Request<BestSignalsRequest>,
    ) -> Result<Response<BestSignalsResponse>, Status> {
        let req_payload = request.into_inner();
        tracing::info!(max_signals = req_payload.max_signals, "Received GetBestSignals request");
        get_best_signals::handle_get_best_signals(req_payload, self.scanner.clone(), self.default_max_signals).await
    }

    async fn refresh_universe(
        &self,
        _request: Request<RefreshUniverseRequest>,
    ) -> Result<Response<UniverseResponse>, Status> {
        tracing::info!("Received RefreshUniverse request");
        refresh_universe::handle_refresh_universe(self.scanner.clone()).await
    }

    async fn load_csv_data(&self, request: Request<LoadCsvRequest>) -> Result<Response<LoadCsvResponse>, Status> {
        let req_payload = request.into_inner();
        tracing::info!(
            symbol = %req_payload.symbol,
            path = %req_payload.file_path,
            timeframe = %req_payload.timeframe,
            "Received LoadCsvData request"
        );
        load_csv_data::handle_load_csv_data(req_payload, self.market_data_store.clone()).await
    }

    type StreamSignalsStream = ReceiverStream<Result<BestSignalsResponse, Status>>;

    async fn stream_signals(
        &self,
        _request: Request<StreamSignalsRequest>,
    ) -> Result<Response<Self::StreamSignalsStream>, Status> {
        tracing::info!("Received StreamSignals request");
        stream_signals::handle_stream_signals(&self.signals).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ScannerSettings, UniverseSettings};
    use crate::data::{CandleProvider, InstrumentStatsProvider};
    use crate::scanner::SymbolUniverseSelector;
    use shared::models::{Side, Signal, Timeframe};
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;
    use tokio_stream::StreamExt;

    fn create_test_service() -> (SignalScannerService, broadcast::Sender<Vec<RankedSignal>>) {
        let store = Arc::new(RwLock::new(MarketDataStore::new()));
        let candles: Arc<dyn CandleProvider> = store.clone();
        let stats: Arc<dyn InstrumentStatsProvider> = store.clone();
        let selector = SymbolUniverseSelector::new(stats, UniverseSettings::default(), Duration::from_secs(1));
        let scanner = Arc::new(MarketScanner::new(candles, selector, ScannerSettings::default()));
        let (signals, _) = broadcast::channel(8);
        (SignalScannerService::new(scanner, store, signals.clone()), signals)
    }

    fn create_dummy_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", content).unwrap();
        file.flush().unwrap();
        file
    }

    /// 150 bars climbing 1% each, five minutes apart.
    fn rally_csv() -> NamedTempFile {
        let mut content = String::from("open_time,open,high,low,close,volume");
        for i in 0..150 {
            let close = 100.0 * 1.01f64.powi(i);
            let open = close / 1.01;
            content.push_str(&format!(
                "\n{},{},{},{},{},1000",
                1704067200000i64 + i as i64 * 300_000,
                open,
                close * 1.002,
                open * 0.998,
                close
            ));
        }
        create_dummy_csv(&content)
    }

    async fn load(service: &SignalScannerService, file: &NamedTempFile, symbol: &str, timeframe: &str) -> Result<LoadCsvResponse, Status> {
        let request = Request::new(LoadCsvRequest {
            file_path: file.path().to_str().unwrap().to_string(),
            symbol: symbol.to_string(),
            timeframe: timeframe.to_string(),
        });
        service.load_csv_data(request).await.map(Response::into_inner)
    }

    #[tokio::test]
    async fn test_load_csv_data_success() {
        let (service, _) = create_test_service();
        let tmp_file = create_dummy_csv("open_time,open,high,low,close,volume\n1704067200000,1,2,0.5,1.5,10");
        let response = load(&service, &tmp_file, "btcusdt", "1h").await.unwrap();
        assert!(response.success);
        assert_eq!(response.candles_loaded, 1);
        assert!(response.message.contains("Loaded 1 candles for symbol BTCUSDT"));

        let store = service.market_data_store.read().await;
        let candles = store.latest("BTCUSDT", Timeframe::Hour1, usize::MAX).unwrap();
        assert_eq!(candles.len(), 1);
    }

    #[tokio::test]
    async fn test_load_csv_data_unknown_timeframe() {
        let (service, _) = create_test_service();
        let tmp_file = create_dummy_csv("open_time,open,high,low,close,volume");
        let status = load(&service, &tmp_file, "BTCUSDT", "7m").await.unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
        assert!(status.message().contains("unknown timeframe '7m'"));
    }

    #[tokio::test]
    async fn test_load_csv_data_file_not_found() {
        let (service, _) = create_test_service();
        let request = Request::new(LoadCsvRequest {
            file_path: "non_existent_file.csv".to_string(),
            symbol: "TEST".to_string(),
            timeframe: "5m".to_string(),
        });
        let status = service.load_csv_data(request).await.unwrap_err();
        assert_eq!(status.code(), tonic::Code::Internal);
        assert!(status.message().contains("I/O error"));
    }

    #[tokio::test]
    async fn test_load_csv_data_bad_number() {
        let (service, _) = create_test_service();
        let tmp_file = create_dummy_csv("open_time,open,high,low,close,volume\n1704067200000,NOT_A_NUMBER,2,0.5,1.5,10");
        let status = load(&service, &tmp_file, "BTCUSDT", "5m").await.unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
        assert!(status.message().contains("CSV data format error"));
        assert!(status.message().contains("Failed to parse decimal 'NOT_A_NUMBER'"));
    }

    #[tokio::test]
    async fn test_get_signal_requires_symbol() {
        let (service, _) = create_test_service();
        let status = service
            .get_signal(Request::new(SignalRequest { symbol: " ".to_string() }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn test_get_signal_without_data() {
        let (service, _) = create_test_service();
        let response = service
            .get_signal(Request::new(SignalRequest { symbol: "ethusdt".to_string() }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(response.symbol, "ETHUSDT");
        let signal = response.signal.unwrap();
        assert_eq!(signal.side, "NONE");
        assert_eq!(signal.reason, "No data");
        assert_eq!(signal.entry, 0.0);
    }

    #[tokio::test]
    async fn test_offline_scan_from_loaded_csv() {
        let (service, _) = create_test_service();
        let primary = rally_csv();
        let higher = rally_csv();
        load(&service, &primary, "SOLUSDT", "5m").await.unwrap();
        load(&service, &higher, "SOLUSDT", "1h").await.unwrap();

        let response = service
            .get_signal(Request::new(SignalRequest { symbol: "SOLUSDT".to_string() }))
            .await
            .unwrap()
            .into_inner();
        let signal = response.signal.unwrap();
        assert_eq!(signal.side, Side::Long.to_string());
        assert!(signal.stop < signal.entry && signal.entry < signal.tp1 && signal.tp1 < signal.tp2 && signal.tp2 < signal.tp3);

        let universe = service
            .refresh_universe(Request::new(RefreshUniverseRequest {}))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(universe.symbols, vec!["SOLUSDT"]);

        // The rally's overbought RSI keeps its confidence below the quality gate.
        let best = service
            .get_best_signals(Request::new(BestSignalsRequest { max_signals: 0 }))
            .await
            .unwrap()
            .into_inner();
        assert!(best.signals.is_empty());
        assert!(best.generated_at > 0);
    }

    #[tokio::test]
    async fn test_stream_signals_forwards_batches() {
        let (service, signals) = create_test_service();
        let mut stream = service
            .stream_signals(Request::new(StreamSignalsRequest {}))
            .await
            .unwrap()
            .into_inner();

        let batch = vec![RankedSignal {
            symbol: "BTCUSDT".to_string(),
            signal: Signal::none("test", 100.0, 0.7),
            strength: 7.0,
            timeframes: vec![Timeframe::Minute5, Timeframe::Hour1],
            price: 100.0,
            volume: 10.0,
        }];
        signals.send(batch).unwrap();

        let response = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(response.signals.len(), 1);
        assert_eq!(response.signals[0].symbol, "BTCUSDT");
        assert_eq!(response.signals[0].strength, 7.0);
    }
}
