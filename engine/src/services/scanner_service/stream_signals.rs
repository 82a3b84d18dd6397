// Handler for the StreamSignals RPC
use super::helpers::to_batch_response;
use crate::services::BestSignalsResponse;
use shared::models::RankedSignal;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Response, Status};

pub async fn handle_stream_signals(
    signals: &broadcast::Sender<Vec<RankedSignal>>,
) -> Result<Response<ReceiverStream<Result<BestSignalsResponse, Status>>>, Status> {
    let mut subscription = signals.subscribe();
    let (tx, rx) = mpsc::channel(4);

    tokio::spawn(async move {
        loop {
            match subscription.recv().await {
                Ok(batch) => {
                    if tx.send(Ok(to_batch_response(&batch))).await.is_err() {
                        tracing::debug!("Signal stream client disconnected");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Signal stream lagging, dropped batches");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    Ok(Response::new(ReceiverStream::new(rx)))
}
