// Handler for the GetSignal RPC
use super::helpers::{normalize_symbol, to_proto_signal};
use crate::scanner::MarketScanner;
use crate::services::{SignalRequest, SignalResponse};
use std::sync::Arc;
use tonic::{Response, Status};

pub async fn handle_get_signal(
    req_payload: SignalRequest,
    scanner: Arc<MarketScanner>,
) -> Result<Response<SignalResponse>, Status> {
    let symbol = normalize_symbol(&req_payload.symbol)
        .ok_or_else(|| Status::invalid_argument("Symbol cannot be empty"))?;

    let signal = scanner.generate_signal(&symbol).await;
    tracing::debug!(symbol = %symbol, side = %signal.side, reason = %signal.reason, "Signal computed");

    Ok(Response::new(SignalResponse {
        symbol,
        signal: Some(to_proto_signal(&signal)),
    }))
}
