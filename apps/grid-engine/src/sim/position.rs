//! Open-position bookkeeping for a single simulation run.

use rust_decimal::Decimal;

/// An open lot held by one grid level.
///
/// Owned exclusively by the run that created it; removed when the
/// matching take-profit sell fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridPosition {
    /// Index of the grid level holding this lot (0 = top line).
    pub level: usize,
    /// Fill price of the opening buy.
    pub entry_price: Decimal,
    /// Quantity bought.
    pub quantity: Decimal,
    /// Capital spent on the opening buy (`entry_price * quantity`).
    pub cost: Decimal,
}

impl GridPosition {
    /// Open a lot at `entry_price` spending `allocation`.
    #[must_use]
    pub fn open(level: usize, entry_price: Decimal, allocation: Decimal) -> Self {
        let quantity = allocation / entry_price;
        Self {
            level,
            entry_price,
            quantity,
            cost: entry_price * quantity,
        }
    }

    /// Mark-to-market profit of this lot at `price`.
    #[must_use]
    pub fn unrealized_at(&self, price: Decimal) -> Decimal {
        price * self.quantity - self.cost
    }

    /// Price at which this lot takes profit.
    #[must_use]
    pub fn take_profit_price(&self, multiplier: Decimal) -> Decimal {
        self.entry_price * multiplier
    }
}
