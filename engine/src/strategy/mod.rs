// Trend, confidence and signal rules applied on top of the indicator snapshots.
pub mod confidence;
pub mod signal_generator;
pub mod trend;

pub use confidence::{score as score_confidence, ConfidenceInputs};
pub use signal_generator::{SignalEvaluation, SignalGenerator, SignalRules, CONDITION_COUNT};
pub use trend::{classify as classify_trend, TrendReading};
