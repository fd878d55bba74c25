//! Screening task state and per-symbol results.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::search::SearchResult;

/// Lifecycle of a screening task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Registered, universe not yet fetched.
    Pending,
    /// Symbols are being processed.
    Running,
    /// All symbols settled (including cancelled runs).
    Completed,
    /// The run aborted before processing symbols.
    Failed,
}

impl TaskStatus {
    /// Whether the task will never change state again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Reduced per-symbol record kept by a screening run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolScreenResult {
    /// Symbol that was screened.
    pub symbol: String,
    /// Train pnl percentage of the winning candidate.
    pub best_pnl_pct: Decimal,
    /// Winning lower grid boundary.
    pub best_min_price: Decimal,
    /// Winning upper grid boundary.
    pub best_max_price: Decimal,
    /// Winning grid level count.
    pub best_grid_levels: u32,
    /// Winning take-profit percentage.
    pub best_sell_percentage: Decimal,
    /// Trades executed by the winner on the train segment.
    pub num_trades: u64,
    /// Train win rate of the winner (0-1).
    pub win_rate: Decimal,
    /// Train max drawdown of the winner (0-1).
    pub max_drawdown: Decimal,
    /// Train annualized Sharpe ratio of the winner.
    pub sharpe_ratio: Decimal,
    /// Out-of-sample pnl percentage of the winner.
    pub test_pnl_pct: Decimal,
    /// Out-of-sample win rate of the winner.
    pub test_win_rate: Decimal,
}

impl SymbolScreenResult {
    /// Condense a full search outcome into the screening record.
    #[must_use]
    pub fn from_search(symbol: impl Into<String>, search: &SearchResult) -> Self {
        let best = &search.best;
        Self {
            symbol: symbol.into(),
            best_pnl_pct: best.total_pnl_pct,
            best_min_price: best.params.min_price,
            best_max_price: best.params.max_price,
            best_grid_levels: best.params.grid_levels,
            best_sell_percentage: best.params.sell_percentage,
            num_trades: best.num_trades,
            win_rate: best.win_rate,
            max_drawdown: best.max_drawdown,
            sharpe_ratio: best.sharpe_ratio,
            test_pnl_pct: search.test_result.total_pnl_pct,
            test_win_rate: search.test_result.win_rate,
        }
    }
}

/// Snapshot of one screening run.
///
/// Values are immutable once published to the registry; progress is
/// derived from the symbol counters so it can never run backwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreeningTask {
    /// Task identifier.
    pub id: Uuid,
    /// Current lifecycle state.
    pub status: TaskStatus,
    /// Universe size (0 until the universe is fetched).
    pub total_symbols: usize,
    /// Symbols settled so far, with or without a result.
    pub processed_symbols: usize,
    /// Successful per-symbol outcomes, in completion order.
    pub results: Vec<SymbolScreenResult>,
    /// Human-readable failure cause for `Failed` tasks.
    pub error: Option<String>,
    /// When the task was registered.
    pub started_at: DateTime<Utc>,
    /// When the task reached a terminal state.
    pub completed_at: Option<DateTime<Utc>>,
}

impl ScreeningTask {
    /// Fresh `Pending` task.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            status: TaskStatus::Pending,
            total_symbols: 0,
            processed_symbols: 0,
            results: Vec::new(),
            error: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Completion percentage, one decimal place.
    #[must_use]
    pub fn progress(&self) -> Decimal {
        if self.total_symbols == 0 {
            return Decimal::ZERO;
        }
        (Decimal::from(self.processed_symbols as u64) * Decimal::ONE_HUNDRED
            / Decimal::from(self.total_symbols as u64))
        .round_dp(1)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn progress_is_zero_before_universe_is_known() {
        let task = ScreeningTask::new(Uuid::new_v4());
        assert_eq!(task.progress(), Decimal::ZERO);
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn progress_tracks_processed_fraction() {
        let mut task = ScreeningTask::new(Uuid::new_v4());
        task.total_symbols = 3;
        task.processed_symbols = 1;
        assert_eq!(task.progress(), dec!(33.3));

        task.processed_symbols = 3;
        assert_eq!(task.progress(), dec!(100.0));
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_value(TaskStatus::Running).unwrap();
        assert_eq!(json, serde_json::json!("running"));
        assert!(TaskStatus::Completed.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
    }
}
