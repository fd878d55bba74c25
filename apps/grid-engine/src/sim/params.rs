//! Validated grid-strategy parameters.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::sim::constants::HUNDRED;

/// Parameters for one grid-strategy configuration.
///
/// Immutable once constructed; [`StrategyParams::new`] enforces every
/// invariant so the simulator never has to re-check them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyParams {
    /// Lower price boundary of the grid.
    pub min_price: Decimal,
    /// Upper price boundary of the grid.
    pub max_price: Decimal,
    /// Number of grid levels (capital is split evenly across them).
    pub grid_levels: u32,
    /// Take-profit percentage per position, in percent (0-100).
    pub sell_percentage: Decimal,
    /// Total simulated budget.
    pub total_amount: Decimal,
}

impl StrategyParams {
    /// Validate and construct strategy parameters.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidParams`] when:
    /// - `min_price <= 0` or `min_price >= max_price`
    /// - `grid_levels < 2` (a single level has no interior lines and
    ///   would silently produce no grid)
    /// - `sell_percentage` outside `[0, 100]`
    /// - `total_amount <= 0`
    pub fn new(
        min_price: Decimal,
        max_price: Decimal,
        grid_levels: u32,
        sell_percentage: Decimal,
        total_amount: Decimal,
    ) -> Result<Self, EngineError> {
        if min_price <= Decimal::ZERO {
            return Err(EngineError::invalid_params(format!(
                "min_price must be positive, got {min_price}"
            )));
        }
        if min_price >= max_price {
            return Err(EngineError::invalid_params(format!(
                "min_price ({min_price}) must be below max_price ({max_price})"
            )));
        }
        if grid_levels < 2 {
            return Err(EngineError::invalid_params(format!(
                "grid_levels must be at least 2, got {grid_levels}"
            )));
        }
        if sell_percentage < Decimal::ZERO || sell_percentage > HUNDRED {
            return Err(EngineError::invalid_params(format!(
                "sell_percentage must be within [0, 100], got {sell_percentage}"
            )));
        }
        if total_amount <= Decimal::ZERO {
            return Err(EngineError::invalid_params(format!(
                "total_amount must be positive, got {total_amount}"
            )));
        }

        Ok(Self {
            min_price,
            max_price,
            grid_levels,
            sell_percentage,
            total_amount,
        })
    }

    /// Price distance between adjacent grid lines.
    #[must_use]
    pub fn step(&self) -> Decimal {
        (self.max_price - self.min_price) / Decimal::from(self.grid_levels)
    }

    /// Capital allocated to each level.
    #[must_use]
    pub fn level_allocation(&self) -> Decimal {
        self.total_amount / Decimal::from(self.grid_levels)
    }

    /// Take-profit multiplier, `1 + sell_percentage / 100`.
    #[must_use]
    pub fn take_profit_multiplier(&self) -> Decimal {
        Decimal::ONE + self.sell_percentage / HUNDRED
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use test_case::test_case;

    use super::*;

    fn params(
        min: Decimal,
        max: Decimal,
        levels: u32,
        sell_pct: Decimal,
        amount: Decimal,
    ) -> Result<StrategyParams, EngineError> {
        StrategyParams::new(min, max, levels, sell_pct, amount)
    }

    #[test]
    fn valid_params_construct() {
        let p = params(dec!(100), dec!(200), 10, dec!(2), dec!(1000));
        assert!(p.is_ok());
    }

    #[test_case(dec!(0), dec!(200), 10, dec!(2), dec!(1000); "zero min price")]
    #[test_case(dec!(-5), dec!(200), 10, dec!(2), dec!(1000); "negative min price")]
    #[test_case(dec!(200), dec!(100), 10, dec!(2), dec!(1000); "inverted range")]
    #[test_case(dec!(100), dec!(100), 10, dec!(2), dec!(1000); "empty range")]
    #[test_case(dec!(100), dec!(200), 1, dec!(2), dec!(1000); "single level")]
    #[test_case(dec!(100), dec!(200), 0, dec!(2), dec!(1000); "zero levels")]
    #[test_case(dec!(100), dec!(200), 10, dec!(-1), dec!(1000); "negative sell pct")]
    #[test_case(dec!(100), dec!(200), 10, dec!(101), dec!(1000); "sell pct above 100")]
    #[test_case(dec!(100), dec!(200), 10, dec!(2), dec!(0); "zero amount")]
    fn invalid_params_rejected(
        min: Decimal,
        max: Decimal,
        levels: u32,
        sell_pct: Decimal,
        amount: Decimal,
    ) {
        assert!(matches!(
            params(min, max, levels, sell_pct, amount),
            Err(EngineError::InvalidParams { .. })
        ));
    }

    #[test]
    fn step_and_allocation() {
        let p = params(dec!(100), dec!(200), 10, dec!(2), dec!(1000)).unwrap();
        assert_eq!(p.step(), dec!(10));
        assert_eq!(p.level_allocation(), dec!(100));
        assert_eq!(p.take_profit_multiplier(), dec!(1.02));
    }
}
