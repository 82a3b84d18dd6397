// Handler for the GetBestSignals RPC
use super::helpers::to_batch_response;
use crate::scanner::MarketScanner;
use crate::services::{BestSignalsRequest, BestSignalsResponse};
use std::sync::Arc;
use tonic::{Response, Status};

pub async fn handle_get_best_signals(
    req_payload: BestSignalsRequest,
    scanner: Arc<MarketScanner>,
    default_max_signals: usize,
) -> Result<Response<BestSignalsResponse>, Status> {
    let max_signals = match req_payload.max_signals {
        0 => default_max_signals,
        n => n as usize,
    };
    let ranked = scanner.best_signals(max_signals).await;
    Ok(Response::new(to_batch_response(&ranked)))
}
