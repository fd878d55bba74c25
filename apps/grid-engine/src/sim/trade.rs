//! Trade events produced by a simulation run.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which side of a trade fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    /// A grid level opened a position.
    Buy,
    /// A position reached its take-profit and closed.
    Sell,
}

/// One immutable entry in a run's append-only trade log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeEvent {
    /// Buy or sell.
    pub side: TradeSide,
    /// Fill price.
    pub price: Decimal,
    /// Quantity traded.
    pub quantity: Decimal,
    /// Open time of the bar that produced the event (ms since epoch).
    pub bar_time: i64,
}
