//! Result types for parameter search.

use serde::{Deserialize, Serialize};

use crate::market::KlineInterval;
use crate::sim::PerformanceMetrics;

/// Outcome of one train/test parameter search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Train-segment metrics of the rank-1 candidate (params echoed).
    pub best: PerformanceMetrics,
    /// The rank-1 candidate re-evaluated on the held-out test segment.
    pub test_result: PerformanceMetrics,
    /// Top-ranked train results, best first.
    pub top_results: Vec<PerformanceMetrics>,
    /// Number of bars in the train segment.
    pub train_size: usize,
    /// Number of bars in the test segment.
    pub test_size: usize,
    /// Bar interval the search ran against.
    pub interval: KlineInterval,
    /// Wall-clock duration of the search in milliseconds.
    pub computed_in_ms: u64,
}
