// Liquidity-ranked instrument universe
use crate::config::UniverseSettings;
use crate::data::InstrumentStatsProvider;
use crate::error::EngineError;
use shared::models::InstrumentStats;
use shared::utils::base_asset;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

pub struct SymbolUniverseSelector {
    provider: Arc<dyn InstrumentStatsProvider>,
    settings: UniverseSettings,
    exclusions: HashSet<String>,
    fetch_timeout: Duration,
}

impl SymbolUniverseSelector {
    pub fn new(provider: Arc<dyn InstrumentStatsProvider>, settings: UniverseSettings, fetch_timeout: Duration) -> Self {
        let exclusions = settings.exclusions.iter().map(|s| s.to_uppercase()).collect();
        SymbolUniverseSelector {
            provider,
            settings,
            exclusions,
            fetch_timeout,
        }
    }

    pub fn default_limit(&self) -> usize {
        self.settings.limit
    }

    /// Top `limit` eligible symbols by 24h quote volume. Falls back to the
    /// configured list when the provider fails.
    pub async fn fetch(&self, limit: usize) -> Vec<String> {
        let stats = match tokio::time::timeout(self.fetch_timeout, self.provider.fetch_instrument_stats()).await {
            Ok(Ok(stats)) => stats,
            Ok(Err(e)) => return self.fallback(e),
            Err(_) => return self.fallback(EngineError::Timeout(self.fetch_timeout)),
        };
        let symbols = self.select(stats, limit);
        tracing::info!(count = symbols.len(), limit, "Selected symbol universe");
        symbols
    }

    pub fn select(&self, mut stats: Vec<InstrumentStats>, limit: usize) -> Vec<String> {
        stats.retain(|s| self.is_eligible(s));
        stats.sort_by(|a, b| b.quote_volume.total_cmp(&a.quote_volume));
        stats.into_iter().take(limit).map(|s| s.symbol).collect()
    }

    fn is_eligible(&self, stats: &InstrumentStats) -> bool {
        let symbol = stats.symbol.as_str();
        let quote = self.settings.quote_asset.as_str();
        if !symbol.ends_with(quote) || self.exclusions.contains(symbol) {
            return false;
        }
        let base = base_asset(symbol, quote);
        if base.is_empty() || !base.chars().all(|c| c.is_ascii_alphanumeric()) {
            return false;
        }
        let len = symbol.chars().count();
        len >= self.settings.min_symbol_len
            && len <= self.settings.max_symbol_len
            && stats.quote_volume > self.settings.min_quote_volume
    }

    fn fallback(&self, error: EngineError) -> Vec<String> {
        tracing::warn!(error_detail = %error, "Instrument stats unavailable, using fallback universe");
        self.settings.fallback.clone()
    }
}
