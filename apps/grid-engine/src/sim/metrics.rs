//! Performance metrics derived from one simulation run.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::constants::HUNDRED;
use super::math::{mean, population_std_dev, sqrt_decimal};
use super::params::StrategyParams;

/// Read-only performance summary of a single run.
///
/// Computed once per run and never mutated afterwards. The parameters
/// that produced the run are echoed (flattened) so a result is fully
/// self-describing on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Realized plus unrealized profit.
    pub total_pnl: Decimal,
    /// `total_pnl` as a percentage of the budget.
    pub total_pnl_pct: Decimal,
    /// `num_buys + num_sells`.
    pub num_trades: u64,
    /// Number of opening buys.
    pub num_buys: u64,
    /// Number of take-profit sells.
    pub num_sells: u64,
    /// Closed trades with positive pnl over total closed trades (0-1).
    pub win_rate: Decimal,
    /// Largest peak-to-trough equity decline as a fraction of the peak (0-1).
    pub max_drawdown: Decimal,
    /// Annualized Sharpe ratio of per-bar equity returns.
    pub sharpe_ratio: Decimal,
    /// Positions still open after the final bar.
    pub final_open_positions: u64,
    /// Mark-to-market profit of the remaining open positions at the last close.
    pub unrealized_pnl: Decimal,
    /// Parameters that produced this run.
    #[serde(flatten)]
    pub params: StrategyParams,
}

/// Accumulates equity and trade statistics while the simulator walks bars.
#[derive(Debug)]
pub struct MetricsAccumulator {
    initial_equity: Decimal,
    equity_curve: Vec<Decimal>,
    peak_equity: Decimal,
    max_drawdown: Decimal,
    realized_pnl: Decimal,
    winning_sells: u64,
    num_buys: u64,
    num_sells: u64,
}

impl MetricsAccumulator {
    /// Start tracking a run funded with `initial_equity`.
    ///
    /// The drawdown peak is re-based at the period start capital, so a
    /// run that only loses money still reports a drawdown against the
    /// starting budget.
    #[must_use]
    pub fn new(initial_equity: Decimal) -> Self {
        Self {
            initial_equity,
            equity_curve: Vec::new(),
            peak_equity: initial_equity,
            max_drawdown: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            winning_sells: 0,
            num_buys: 0,
            num_sells: 0,
        }
    }

    /// Record an opening buy.
    pub fn record_buy(&mut self) {
        self.num_buys += 1;
    }

    /// Record a closing sell with its realized pnl.
    pub fn record_sell(&mut self, pnl: Decimal) {
        self.num_sells += 1;
        self.realized_pnl += pnl;
        if pnl > Decimal::ZERO {
            self.winning_sells += 1;
        }
    }

    /// Append one bar's mark-to-market equity and update the drawdown.
    pub fn record_equity(&mut self, open_unrealized: Decimal) {
        let equity = self.initial_equity + self.realized_pnl + open_unrealized;
        self.equity_curve.push(equity);

        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
        if self.peak_equity > Decimal::ZERO {
            let drawdown = (self.peak_equity - equity) / self.peak_equity;
            if drawdown > self.max_drawdown {
                self.max_drawdown = drawdown;
            }
        }
    }

    /// Realized pnl accumulated so far.
    #[must_use]
    pub fn realized_pnl(&self) -> Decimal {
        self.realized_pnl
    }

    /// Finish the run and derive the metrics.
    ///
    /// `bars_per_year` is the fixed annualization constant for the bar
    /// interval; the Sharpe ratio is `mean / std * sqrt(bars_per_year)`
    /// over per-bar simple equity returns.
    #[must_use]
    pub fn finish(
        self,
        unrealized_pnl: Decimal,
        final_open_positions: u64,
        bars_per_year: u64,
        params: StrategyParams,
    ) -> PerformanceMetrics {
        let total_pnl = self.realized_pnl + unrealized_pnl;
        let total_pnl_pct = if params.total_amount > Decimal::ZERO {
            total_pnl / params.total_amount * HUNDRED
        } else {
            Decimal::ZERO
        };

        let win_rate = if self.num_sells > 0 {
            Decimal::from(self.winning_sells) / Decimal::from(self.num_sells)
        } else {
            Decimal::ZERO
        };

        let sharpe_ratio = sharpe(&self.equity_curve, bars_per_year);

        PerformanceMetrics {
            total_pnl,
            total_pnl_pct,
            num_trades: self.num_buys + self.num_sells,
            num_buys: self.num_buys,
            num_sells: self.num_sells,
            win_rate,
            max_drawdown: self.max_drawdown,
            sharpe_ratio,
            final_open_positions,
            unrealized_pnl,
            params,
        }
    }
}

/// Annualized Sharpe ratio from a mark-to-market equity curve.
///
/// Returns zero when fewer than two equity points exist or the return
/// series has no volatility.
fn sharpe(equity_curve: &[Decimal], bars_per_year: u64) -> Decimal {
    if equity_curve.len() < 2 {
        return Decimal::ZERO;
    }

    let returns: Vec<Decimal> = equity_curve
        .windows(2)
        .filter(|w| w[0] != Decimal::ZERO)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect();

    let Some(avg) = mean(&returns) else {
        return Decimal::ZERO;
    };
    let Some(std) = population_std_dev(&returns) else {
        return Decimal::ZERO;
    };
    if std == Decimal::ZERO {
        return Decimal::ZERO;
    }

    let annualizer = sqrt_decimal(Decimal::from(bars_per_year)).unwrap_or(Decimal::ONE);
    avg / std * annualizer
}
