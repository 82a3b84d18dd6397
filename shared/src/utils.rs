// Formatting helpers shared by the engine and its clients.

/// Renders a ratio as a percentage with one decimal, e.g. `0.625` -> `"62.5%"`.
pub fn format_percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

/// Strips `suffix` from the end of `symbol`, returning the base asset.
pub fn base_asset<'a>(symbol: &'a str, suffix: &str) -> &'a str {
    symbol.strip_suffix(suffix).unwrap_or(symbol)
}
