// Conversions between domain models and their protobuf counterparts
use crate::services::{BestSignalsResponse, ProtoRankedSignal, ProtoSignal};
use shared::models::{RankedSignal, Signal};

pub fn to_proto_signal(signal: &Signal) -> ProtoSignal {
    ProtoSignal {
        side: signal.side.to_string(),
        reason: signal.reason.clone(),
        entry: signal.entry,
        stop: signal.stop,
        tp1: signal.tp1,
        tp2: signal.tp2,
        tp3: signal.tp3,
        confidence: signal.confidence,
    }
}

pub fn to_proto_ranked(ranked: &RankedSignal) -> ProtoRankedSignal {
    ProtoRankedSignal {
        symbol: ranked.symbol.clone(),
        signal: Some(to_proto_signal(&ranked.signal)),
        strength: ranked.strength,
        timeframes: ranked.timeframes.iter().map(|tf| tf.to_string()).collect(),
        price: ranked.price,
        volume: ranked.volume,
    }
}

pub fn to_batch_response(ranked: &[RankedSignal]) -> BestSignalsResponse {
    BestSignalsResponse {
        signals: ranked.iter().map(to_proto_ranked).collect(),
        generated_at: chrono::Utc::now().timestamp_millis(),
    }
}

/// Trimmed, upper-cased symbol; `None` when blank.
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let symbol = raw.trim();
    (!symbol.is_empty()).then(|| symbol.to_uppercase())
}
