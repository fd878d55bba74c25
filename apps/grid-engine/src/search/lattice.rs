//! Candidate lattice generation for parameter search.
//!
//! Price boundaries are derived from percentiles of the training closes
//! so the search never wastes budget on ranges the price history cannot
//! reach. The lattice is bounded by a hard candidate cap to keep search
//! runtime predictable.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::sim::StrategyParams;

/// Percentiles tried for the lower grid boundary.
const MIN_PRICE_PERCENTILES: [u32; 4] = [5, 10, 15, 25];

/// Percentiles tried for the upper grid boundary.
const MAX_PRICE_PERCENTILES: [u32; 4] = [75, 85, 90, 95];

/// A max/min pair closer than 2% apart is too narrow to grid.
const MIN_RANGE_RATIO: Decimal = dec!(1.02);

/// Discrete value sets the lattice enumerates, in generation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatticeConfig {
    /// Grid level counts to try.
    pub grid_levels: Vec<u32>,
    /// Sell percentages to try.
    pub sell_percentages: Vec<Decimal>,
    /// Hard cap on generated candidates.
    pub max_candidates: usize,
}

impl LatticeConfig {
    /// Full lattice for single-symbol optimization.
    #[must_use]
    pub fn default_profile() -> Self {
        Self {
            grid_levels: vec![3, 5, 7, 10, 15, 20],
            sell_percentages: vec![
                dec!(0.5),
                dec!(1.0),
                dec!(1.5),
                dec!(2.0),
                dec!(3.0),
                dec!(5.0),
            ],
            max_candidates: 1024,
        }
    }

    /// Reduced lattice for market-wide screening (speed over depth).
    #[must_use]
    pub fn screening_profile() -> Self {
        Self {
            grid_levels: vec![5, 10, 15],
            sell_percentages: vec![dec!(1.0), dec!(2.0), dec!(3.0), dec!(5.0)],
            max_candidates: 1024,
        }
    }
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self::default_profile()
    }
}

/// Enumerate candidate parameter sets over the training closes.
///
/// Candidates are produced in a fixed nested order (min price, max
/// price, grid levels, sell percentage) so generation index is a stable
/// ranking tie-breaker. Combinations that fail `StrategyParams`
/// validation are skipped rather than aborting the search.
#[must_use]
pub fn generate_candidates(
    train_closes: &[Decimal],
    total_amount: Decimal,
    config: &LatticeConfig,
) -> Vec<StrategyParams> {
    if train_closes.is_empty() {
        return Vec::new();
    }

    let mut sorted = train_closes.to_vec();
    sorted.sort_unstable();

    let min_candidates = dedup_sorted(
        MIN_PRICE_PERCENTILES
            .iter()
            .map(|p| percentile(&sorted, *p))
            .collect(),
    );
    let max_candidates = dedup_sorted(
        MAX_PRICE_PERCENTILES
            .iter()
            .map(|p| percentile(&sorted, *p))
            .collect(),
    );

    let mut candidates = Vec::new();
    'outer: for min_price in &min_candidates {
        for max_price in &max_candidates {
            if *max_price <= *min_price * MIN_RANGE_RATIO {
                continue;
            }
            for grid_levels in &config.grid_levels {
                for sell_pct in &config.sell_percentages {
                    if candidates.len() >= config.max_candidates {
                        break 'outer;
                    }
                    if let Ok(params) = StrategyParams::new(
                        *min_price,
                        *max_price,
                        *grid_levels,
                        *sell_pct,
                        total_amount,
                    ) {
                        candidates.push(params);
                    }
                }
            }
        }
    }

    candidates
}

/// Nearest-rank percentile of an ascending-sorted slice.
fn percentile(sorted: &[Decimal], p: u32) -> Decimal {
    let n = sorted.len();
    let idx = (n * p as usize / 100).min(n - 1);
    sorted[idx]
}

fn dedup_sorted(mut values: Vec<Decimal>) -> Vec<Decimal> {
    values.sort_unstable();
    values.dedup();
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_closes(n: usize) -> Vec<Decimal> {
        // 100, 101, ..., ascending ramp.
        (0..n)
            .map(|i| Decimal::from(100 + i as u64))
            .collect()
    }

    #[test]
    fn lattice_is_bounded_and_nonempty() {
        let cfg = LatticeConfig::default_profile();
        let candidates = generate_candidates(&ramp_closes(500), dec!(1000), &cfg);

        assert!(!candidates.is_empty());
        // 4 min x 4 max x 6 levels x 6 percentages at most.
        assert!(candidates.len() <= 4 * 4 * 6 * 6);
        assert!(candidates.len() <= cfg.max_candidates);
    }

    #[test]
    fn every_candidate_is_valid() {
        let cfg = LatticeConfig::screening_profile();
        for c in generate_candidates(&ramp_closes(300), dec!(1000), &cfg) {
            assert!(c.min_price < c.max_price);
            assert!(c.grid_levels >= 2);
            assert_eq!(c.total_amount, dec!(1000));
        }
    }

    #[test]
    fn narrow_ranges_are_discarded() {
        // Constant prices: every percentile collapses to the same value,
        // so no min/max pair clears the 2% spread requirement.
        let closes = vec![dec!(100); 200];
        let candidates =
            generate_candidates(&closes, dec!(1000), &LatticeConfig::default_profile());
        assert!(candidates.is_empty());
    }

    #[test]
    fn cap_truncates_generation() {
        let cfg = LatticeConfig {
            max_candidates: 7,
            ..LatticeConfig::default_profile()
        };
        let candidates = generate_candidates(&ramp_closes(500), dec!(1000), &cfg);
        assert_eq!(candidates.len(), 7);
    }

    #[test]
    fn empty_closes_yield_no_candidates() {
        let candidates =
            generate_candidates(&[], dec!(1000), &LatticeConfig::default_profile());
        assert!(candidates.is_empty());
    }

    #[test]
    fn generation_order_is_deterministic() {
        let cfg = LatticeConfig::default_profile();
        let a = generate_candidates(&ramp_closes(400), dec!(1000), &cfg);
        let b = generate_candidates(&ramp_closes(400), dec!(1000), &cfg);
        assert_eq!(a, b);
    }
}
