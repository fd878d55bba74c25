//! Train/test parameter search over the candidate lattice.

use std::cmp::Ordering;
use std::time::Instant;

use rayon::prelude::*;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use tracing::{debug, info};

use crate::error::EngineError;
use crate::market::{Bar, KlineInterval};
use crate::sim::{GridSimulator, PerformanceMetrics};

use super::lattice::{LatticeConfig, generate_candidates};
use super::result::SearchResult;

/// Fraction of bars assigned to the train segment.
pub const DEFAULT_TRAIN_RATIO: Decimal = dec!(0.7);

/// Minimum bar count for a meaningful train/test split.
pub const MIN_SEARCH_BARS: usize = 100;

/// Number of ranked train results retained in [`SearchResult::top_results`].
pub const DEFAULT_TOP_N: usize = 10;

/// Fits grid-strategy parameters on a train window and validates the
/// winner on the held-out test window.
#[derive(Debug, Clone)]
pub struct ParameterSearchEngine {
    lattice: LatticeConfig,
    train_ratio: Decimal,
    top_n: usize,
}

impl ParameterSearchEngine {
    /// Engine with the full single-symbol lattice.
    #[must_use]
    pub fn new(lattice: LatticeConfig) -> Self {
        Self {
            lattice,
            train_ratio: DEFAULT_TRAIN_RATIO,
            top_n: DEFAULT_TOP_N,
        }
    }

    /// Engine with the reduced screening lattice.
    #[must_use]
    pub fn screening() -> Self {
        Self::new(LatticeConfig::screening_profile())
    }

    /// Override the train fraction (callers validate the range at the edge).
    #[must_use]
    pub fn with_train_ratio(mut self, ratio: Decimal) -> Self {
        self.train_ratio = ratio;
        self
    }

    /// Search the lattice against `bars`.
    ///
    /// Bars are split chronologically, never shuffled: the first
    /// `train_ratio` of bars train, the remainder tests. Candidates are
    /// ranked by train `total_pnl_pct` descending, ties broken by lower
    /// `max_drawdown`, then more trades, then generation order, which
    /// makes the ranking a deterministic total order.
    ///
    /// # Errors
    ///
    /// [`EngineError::InsufficientData`] when fewer than
    /// [`MIN_SEARCH_BARS`] bars are supplied or a segment would be
    /// empty; [`EngineError::InvalidParams`] when the lattice produces
    /// no viable candidate (e.g. a flat price history).
    pub fn search(
        &self,
        symbol: &str,
        bars: &[Bar],
        interval: KlineInterval,
        total_amount: Decimal,
    ) -> Result<SearchResult, EngineError> {
        let started = Instant::now();

        if bars.len() < MIN_SEARCH_BARS {
            return Err(EngineError::InsufficientData {
                required: MIN_SEARCH_BARS,
                actual: bars.len(),
            });
        }

        let split = self.split_index(bars.len());
        let (train, test) = bars.split_at(split);
        if train.is_empty() || test.is_empty() {
            return Err(EngineError::InsufficientData {
                required: MIN_SEARCH_BARS,
                actual: bars.len(),
            });
        }

        let train_closes: Vec<Decimal> = train.iter().map(|b| b.close).collect();
        let candidates = generate_candidates(&train_closes, total_amount, &self.lattice);
        if candidates.is_empty() {
            return Err(EngineError::invalid_params(format!(
                "no viable parameter candidates for {symbol}"
            )));
        }

        info!(
            symbol,
            candidates = candidates.len(),
            train_bars = train.len(),
            test_bars = test.len(),
            "Starting parameter search"
        );

        let mut ranked: Vec<(usize, PerformanceMetrics)> = candidates
            .par_iter()
            .enumerate()
            .map(|(idx, params)| (idx, GridSimulator::simulate(train, params, interval)))
            .collect();
        ranked.sort_by(|a, b| rank(&a.1, &b.1).then_with(|| a.0.cmp(&b.0)));

        let top_results: Vec<PerformanceMetrics> = ranked
            .iter()
            .take(self.top_n)
            .map(|(_, m)| m.clone())
            .collect();
        // Ranking guarantees at least one entry: candidates was non-empty.
        let best = top_results[0].clone();

        let test_result = GridSimulator::simulate(test, &best.params, interval);

        let computed_in_ms = started.elapsed().as_millis() as u64;
        debug!(
            symbol,
            best_pnl_pct = %best.total_pnl_pct,
            test_pnl_pct = %test_result.total_pnl_pct,
            computed_in_ms,
            "Parameter search complete"
        );

        Ok(SearchResult {
            best,
            test_result,
            top_results,
            train_size: train.len(),
            test_size: test.len(),
            interval,
            computed_in_ms,
        })
    }

    fn split_index(&self, total: usize) -> usize {
        (Decimal::from(total as u64) * self.train_ratio)
            .floor()
            .to_usize()
            .unwrap_or(0)
            .clamp(1, total.saturating_sub(1))
    }
}

impl Default for ParameterSearchEngine {
    fn default() -> Self {
        Self::new(LatticeConfig::default_profile())
    }
}

/// Ranking order between two train results (best first).
fn rank(a: &PerformanceMetrics, b: &PerformanceMetrics) -> Ordering {
    b.total_pnl_pct
        .cmp(&a.total_pnl_pct)
        .then_with(|| a.max_drawdown.cmp(&b.max_drawdown))
        .then_with(|| b.num_trades.cmp(&a.num_trades))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::market::Bar;

    use super::*;

    fn oscillating_bars(n: usize) -> Vec<Bar> {
        // A price path that cycles through 100..140, giving the grid
        // plenty of crossings to trade on.
        (0..n)
            .map(|i| {
                let phase = (i % 40) as u64;
                let price = Decimal::from(100 + if phase < 20 { phase } else { 40 - phase });
                Bar {
                    open_time: i as i64,
                    open: price,
                    high: price + dec!(1),
                    low: price - dec!(1),
                    close: price,
                    volume: dec!(10),
                }
            })
            .collect()
    }

    #[test]
    fn too_few_bars_is_insufficient_data() {
        let engine = ParameterSearchEngine::default();
        let bars = oscillating_bars(MIN_SEARCH_BARS - 1);
        let err = engine
            .search("TESTUSDC", &bars, KlineInterval::OneHour, dec!(1000))
            .unwrap_err();
        assert!(matches!(err, EngineError::InsufficientData { .. }));
    }

    #[test]
    fn flat_history_yields_invalid_params() {
        let engine = ParameterSearchEngine::default();
        let bars: Vec<Bar> = (0..200)
            .map(|i| Bar {
                open_time: i,
                open: dec!(100),
                high: dec!(100),
                low: dec!(100),
                close: dec!(100),
                volume: dec!(1),
            })
            .collect();
        let err = engine
            .search("FLATUSDC", &bars, KlineInterval::OneHour, dec!(1000))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidParams { .. }));
    }

    #[test]
    fn split_is_chronological_seventy_thirty() {
        let engine = ParameterSearchEngine::default();
        let bars = oscillating_bars(200);
        let result = engine
            .search("TESTUSDC", &bars, KlineInterval::OneHour, dec!(1000))
            .unwrap();
        assert_eq!(result.train_size, 140);
        assert_eq!(result.test_size, 60);
    }

    #[test]
    fn top_results_are_rank_ordered_and_capped() {
        let engine = ParameterSearchEngine::default();
        let bars = oscillating_bars(300);
        let result = engine
            .search("TESTUSDC", &bars, KlineInterval::OneHour, dec!(1000))
            .unwrap();

        assert!(!result.top_results.is_empty());
        assert!(result.top_results.len() <= DEFAULT_TOP_N);
        for w in result.top_results.windows(2) {
            assert!(w[0].total_pnl_pct >= w[1].total_pnl_pct);
        }
        assert_eq!(result.best.params, result.top_results[0].params);
    }

    #[test]
    fn test_result_uses_winning_params() {
        let engine = ParameterSearchEngine::screening();
        let bars = oscillating_bars(250);
        let result = engine
            .search("TESTUSDC", &bars, KlineInterval::OneHour, dec!(1000))
            .unwrap();
        assert_eq!(result.test_result.params, result.best.params);
    }

    #[test]
    fn search_is_deterministic() {
        let engine = ParameterSearchEngine::default();
        let bars = oscillating_bars(240);
        let a = engine
            .search("TESTUSDC", &bars, KlineInterval::OneHour, dec!(1000))
            .unwrap();
        let b = engine
            .search("TESTUSDC", &bars, KlineInterval::OneHour, dec!(1000))
            .unwrap();
        assert_eq!(a.best, b.best);
        assert_eq!(a.top_results, b.top_results);
        assert_eq!(a.test_result, b.test_result);
    }

    #[test]
    fn custom_train_ratio_moves_the_split() {
        let engine = ParameterSearchEngine::default().with_train_ratio(dec!(0.8));
        let bars = oscillating_bars(200);
        let result = engine
            .search("TESTUSDC", &bars, KlineInterval::OneHour, dec!(1000))
            .unwrap();
        assert_eq!(result.train_size, 160);
        assert_eq!(result.test_size, 40);
    }
}
