//! Deterministic grid-strategy backtest over a bar sequence.

use rust_decimal::Decimal;

use crate::market::{Bar, KlineInterval};

use super::metrics::{MetricsAccumulator, PerformanceMetrics};
use super::params::StrategyParams;
use super::position::GridPosition;
use super::trade::{TradeEvent, TradeSide};

/// Full output of one run: derived metrics plus the trade log.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    /// Derived performance summary.
    pub metrics: PerformanceMetrics,
    /// Append-only buy/sell log in bar order.
    pub trades: Vec<TradeEvent>,
}

/// Pure backtest of a grid strategy.
///
/// `simulate` has no side effects and is deterministic for identical
/// inputs: the same bars, parameters, and interval always produce
/// byte-identical metrics.
pub struct GridSimulator;

impl GridSimulator {
    /// Run a backtest and return only the derived metrics.
    #[must_use]
    pub fn simulate(
        bars: &[Bar],
        params: &StrategyParams,
        interval: KlineInterval,
    ) -> PerformanceMetrics {
        Self::run(bars, params, interval).metrics
    }

    /// Run a backtest keeping the full trade log.
    ///
    /// Grid geometry: with `step = (max - min) / grid_levels`, buy
    /// trigger lines sit at `max - i * step` for `i = 0..grid_levels`
    /// (line 0 is the top boundary, `min_price` is the floor and not a
    /// line). Each level holds at most one open lot funded with
    /// `total_amount / grid_levels`.
    ///
    /// Per bar, in fixed order: take-profit sells against the bar high,
    /// then line-crossing buys against the `[low, high]` range, then the
    /// cycle-entry buy at the close when the book is flat and the close
    /// is inside the grid. A level never both sells and re-buys within
    /// the same bar.
    #[must_use]
    pub fn run(bars: &[Bar], params: &StrategyParams, interval: KlineInterval) -> SimulationReport {
        let lines = grid_lines(params);
        let levels = lines.len();
        let allocation = params.level_allocation();
        let tp_multiplier = params.take_profit_multiplier();

        let mut positions: Vec<Option<GridPosition>> = vec![None; levels];
        let mut open_count: usize = 0;
        let mut trades: Vec<TradeEvent> = Vec::new();
        let mut acc = MetricsAccumulator::new(params.total_amount);

        for bar in bars {
            let mut sold_this_bar = vec![false; levels];

            // Take-profit sells against the bar high.
            for level in 0..levels {
                let Some(pos) = &positions[level] else {
                    continue;
                };
                let tp = pos.take_profit_price(tp_multiplier);
                if bar.high >= tp {
                    let pnl = (tp - pos.entry_price) * pos.quantity;
                    trades.push(TradeEvent {
                        side: TradeSide::Sell,
                        price: tp,
                        quantity: pos.quantity,
                        bar_time: bar.open_time,
                    });
                    acc.record_sell(pnl);
                    positions[level] = None;
                    open_count -= 1;
                    sold_this_bar[level] = true;
                }
            }

            // Downward crossings: any free line inside the bar's range opens
            // a lot at exactly the line price.
            for level in 0..levels {
                if positions[level].is_some() || sold_this_bar[level] {
                    continue;
                }
                let line = lines[level];
                if bar.low <= line && line <= bar.high {
                    let pos = GridPosition::open(level, line, allocation);
                    trades.push(TradeEvent {
                        side: TradeSide::Buy,
                        price: line,
                        quantity: pos.quantity,
                        bar_time: bar.open_time,
                    });
                    acc.record_buy();
                    positions[level] = Some(pos);
                    open_count += 1;
                }
            }

            // Cycle entry: a flat book buys immediately at the close when the
            // close sits inside the grid, assigned to the band containing it.
            if open_count == 0 && params.min_price <= bar.close && bar.close <= params.max_price {
                let level = band_of(&lines, bar.close);
                if !sold_this_bar[level] {
                    let pos = GridPosition::open(level, bar.close, allocation);
                    trades.push(TradeEvent {
                        side: TradeSide::Buy,
                        price: bar.close,
                        quantity: pos.quantity,
                        bar_time: bar.open_time,
                    });
                    acc.record_buy();
                    positions[level] = Some(pos);
                    open_count += 1;
                }
            }

            let open_unrealized: Decimal = positions
                .iter()
                .flatten()
                .map(|p| p.unrealized_at(bar.close))
                .sum();
            acc.record_equity(open_unrealized);
        }

        // Remaining lots are marked at the last close, never force-closed.
        let last_close = bars.last().map_or(Decimal::ZERO, |b| b.close);
        let unrealized_pnl: Decimal = positions
            .iter()
            .flatten()
            .map(|p| p.unrealized_at(last_close))
            .sum();
        let final_open_positions = positions.iter().flatten().count() as u64;

        let metrics = acc.finish(
            unrealized_pnl,
            final_open_positions,
            interval.bars_per_year(),
            params.clone(),
        );

        SimulationReport { metrics, trades }
    }
}

/// Buy trigger lines, descending: `max - i * step` for `i = 0..grid_levels`.
///
/// Line 0 is the top boundary; the remaining `grid_levels - 1` lines are
/// the interior boundaries, a strictly decreasing arithmetic sequence
/// between `max_price` and `min_price`.
fn grid_lines(params: &StrategyParams) -> Vec<Decimal> {
    let step = params.step();
    (0..params.grid_levels)
        .map(|i| params.max_price - step * Decimal::from(i))
        .collect()
}

/// Index of the level band containing `price` (deepest line at or above it).
fn band_of(lines: &[Decimal], price: Decimal) -> usize {
    let mut band = 0;
    for (i, line) in lines.iter().enumerate() {
        if *line >= price {
            band = i;
        } else {
            break;
        }
    }
    band
}
