// Handler for the LoadCsvData RPC
use super::helpers::normalize_symbol;
use crate::data::{CsvCandleSource, MarketDataStore};
use crate::error::EngineError;
use crate::services::{LoadCsvRequest, LoadCsvResponse};
use shared::models::Timeframe;
use std::sync::Arc;
use tokio::sync::RwLock;
use tonic::{Response, Status};

pub async fn handle_load_csv_data(
    req_payload: LoadCsvRequest,
    market_data_store: Arc<RwLock<MarketDataStore>>,
) -> Result<Response<LoadCsvResponse>, Status> {
    let symbol = normalize_symbol(&req_payload.symbol)
        .ok_or_else(|| Status::invalid_argument("Symbol cannot be empty"))?;
    let timeframe: Timeframe = req_payload
        .timeframe
        .parse()
        .map_err(|e| Status::invalid_argument(format!("{}", e)))?;

    let file_path = req_payload.file_path.clone();
    let candles = tokio::task::spawn_blocking(move || CsvCandleSource::load_candles_from_csv(&file_path))
        .await
        .map_err(|e| EngineError::ProcessingError(format!("CSV loader task failed: {}", e)))??;

    let candles_loaded = candles.len() as i32;
    market_data_store.write().await.add_candles(&symbol, timeframe, candles)?;

    tracing::info!(symbol = %symbol, %timeframe, count = candles_loaded, "Loaded CSV candles");
    Ok(Response::new(LoadCsvResponse {
        success: true,
        message: format!("Loaded {} candles for symbol {} ({})", candles_loaded, symbol, timeframe),
        candles_loaded,
    }))
}
