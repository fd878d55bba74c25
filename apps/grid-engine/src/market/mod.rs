//! Market data: bar types, provider traits, and exchange adapters.

mod binance;
mod error;
mod memory;
mod provider;
mod types;

pub use binance::{BinanceMarketData, RetryConfig};
pub use error::MarketDataError;
pub use memory::InMemoryMarketData;
pub use provider::{KlineSource, SymbolUniverse};
pub use types::{Bar, KlineInterval};
