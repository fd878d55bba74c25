//! Grid-strategy simulation engine.
//!
//! One deterministic backtest of a fixed-price grid strategy over a bar
//! sequence:
//!
//! - **Grid geometry**: evenly spaced buy lines between the configured
//!   price boundaries, one lot of `total_amount / grid_levels` per level
//! - **Matching**: open/closed position bookkeeping lives here and only
//!   here; each sell closes exactly the lot its level opened
//! - **Metrics**: pnl, win rate, max drawdown, and annualized Sharpe
//!   from the per-bar mark-to-market equity curve

mod constants;
mod engine;
mod math;
mod metrics;
mod params;
mod position;
mod trade;

pub use engine::{GridSimulator, SimulationReport};
pub use metrics::{MetricsAccumulator, PerformanceMetrics};
pub use params::StrategyParams;
pub use position::GridPosition;
pub use trade::{TradeEvent, TradeSide};
