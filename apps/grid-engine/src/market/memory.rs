//! In-memory market-data provider for tests.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;

use super::error::MarketDataError;
use super::provider::{KlineSource, SymbolUniverse};
use super::types::{Bar, KlineInterval};

/// Deterministic [`KlineSource`] and [`SymbolUniverse`] backed by fixed
/// bar vectors, with per-symbol and universe failure injection.
#[derive(Debug, Default)]
pub struct InMemoryMarketData {
    bars: HashMap<String, Vec<Bar>>,
    symbols: Vec<String>,
    failing: HashSet<String>,
    universe_unavailable: bool,
    latency: Option<Duration>,
}

impl InMemoryMarketData {
    /// Empty provider with no symbols.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `symbol` with its bar history.
    #[must_use]
    pub fn with_symbol(mut self, symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        let symbol = symbol.into();
        self.symbols.push(symbol.clone());
        self.bars.insert(symbol, bars);
        self
    }

    /// Register `symbol` in the universe but make its bar fetch fail.
    #[must_use]
    pub fn with_failing_symbol(mut self, symbol: impl Into<String>) -> Self {
        let symbol = symbol.into();
        self.symbols.push(symbol.clone());
        self.failing.insert(symbol);
        self
    }

    /// Make `list_symbols` fail.
    #[must_use]
    pub fn with_unavailable_universe(mut self) -> Self {
        self.universe_unavailable = true;
        self
    }

    /// Delay every bar fetch, to exercise in-flight task states.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}

#[async_trait]
impl KlineSource for InMemoryMarketData {
    async fn get_bars(
        &self,
        symbol: &str,
        _interval: KlineInterval,
        limit: usize,
    ) -> Result<Vec<Bar>, MarketDataError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.contains(symbol) {
            return Err(MarketDataError::SymbolUnavailable(symbol.to_string()));
        }
        let bars = self
            .bars
            .get(symbol)
            .ok_or_else(|| MarketDataError::SymbolUnavailable(symbol.to_string()))?;

        let start = bars.len().saturating_sub(limit);
        Ok(bars[start..].to_vec())
    }
}

#[async_trait]
impl SymbolUniverse for InMemoryMarketData {
    async fn list_symbols(&self) -> Result<Vec<String>, MarketDataError> {
        if self.universe_unavailable {
            return Err(MarketDataError::Status {
                endpoint: "/api/v3/exchangeInfo".to_string(),
                status: 503,
            });
        }
        Ok(self.symbols.clone())
    }
}
