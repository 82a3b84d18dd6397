pub mod models;
pub mod utils;

#[cfg(test)]
mod tests {
    use crate::models::{Side, Signal, Timeframe, TrendBias};

    #[test]
    fn none_signal_collapses_levels_onto_entry() {
        let signal = Signal::none("flat market", 101.5, 0.3);
        assert_eq!(signal.side, Side::None);
        assert_eq!(signal.stop, 101.5);
        assert_eq!(signal.tp1, 101.5);
        assert_eq!(signal.tp2, 101.5);
        assert_eq!(signal.tp3, 101.5);
        assert!(!signal.is_actionable());
    }

    #[test]
    fn timeframe_parses_exchange_interval_codes() {
        assert_eq!("5m".parse::<Timeframe>().unwrap(), Timeframe::Minute5);
        assert_eq!("1h".parse::<Timeframe>().unwrap(), Timeframe::Hour1);
        assert_eq!(Timeframe::Day1.to_string(), "1d");
        assert!("7m".parse::<Timeframe>().is_err());
    }

    #[test]
    fn enums_serialize_with_wire_names() {
        assert_eq!(serde_json::to_string(&Side::Long).unwrap(), "\"LONG\"");
        assert_eq!(serde_json::to_string(&TrendBias::Flat).unwrap(), "\"flat\"");
        assert_eq!(serde_json::to_string(&Timeframe::Minute15).unwrap(), "\"15m\"");
    }
}
