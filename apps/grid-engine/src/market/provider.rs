//! Collaborator interfaces the engine consumes.

use async_trait::async_trait;

use super::error::MarketDataError;
use super::types::{Bar, KlineInterval};

/// Supplies ordered historical bars for a symbol.
#[async_trait]
pub trait KlineSource: Send + Sync {
    /// Fetch up to `limit` bars, oldest first.
    async fn get_bars(
        &self,
        symbol: &str,
        interval: KlineInterval,
        limit: usize,
    ) -> Result<Vec<Bar>, MarketDataError>;
}

/// Supplies the symbol universe to screen.
#[async_trait]
pub trait SymbolUniverse: Send + Sync {
    /// List tradable symbol identifiers.
    async fn list_symbols(&self) -> Result<Vec<String>, MarketDataError>;
}
