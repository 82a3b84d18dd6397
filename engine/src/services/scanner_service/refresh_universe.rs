// Handler for the RefreshUniverse RPC
use crate::scanner::MarketScanner;
use crate::services::UniverseResponse;
use std::sync::Arc;
use tonic::{Response, Status};

pub async fn handle_refresh_universe(scanner: Arc<MarketScanner>) -> Result<Response<UniverseResponse>, Status> {
    let symbols = scanner.refresh_universe().await;
    tracing::info!(count = symbols.len(), "Universe refreshed on request");
    Ok(Response::new(UniverseResponse { symbols }))
}
