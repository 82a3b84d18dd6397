// gRPC surface of the engine.
pub mod scanner_proto {
    tonic::include_proto!("scanner");
}

pub use scanner_proto::signal_scanner_client::SignalScannerClient;
pub use scanner_proto::signal_scanner_server::{SignalScanner, SignalScannerServer};
pub use scanner_proto::{
    BestSignalsRequest, BestSignalsResponse, LoadCsvRequest, LoadCsvResponse, RankedSignal as ProtoRankedSignal,
    RefreshUniverseRequest, Signal as ProtoSignal, SignalRequest, SignalResponse, StreamSignalsRequest,
    UniverseResponse,
};

pub mod scanner_service;

pub use scanner_service::SignalScannerService;
