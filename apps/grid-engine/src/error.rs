//! Core error taxonomy for simulation and parameter search.
//!
//! Market-data and screening errors live next to their modules
//! (`market::MarketDataError`, `screening::ScreeningError`); this module
//! holds the errors the deterministic engine itself can produce.

use thiserror::Error;

/// Errors from the simulation and parameter-search engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Strategy parameters failed validation.
    ///
    /// Raised at construction time so invalid values never reach the
    /// simulator.
    #[error("Invalid strategy parameters: {message}")]
    InvalidParams {
        /// What failed validation.
        message: String,
    },

    /// Too few bars to form non-empty train and test segments.
    #[error("Insufficient historical data: {actual} bars, need at least {required}")]
    InsufficientData {
        /// Minimum number of bars required.
        required: usize,
        /// Number of bars actually supplied.
        actual: usize,
    },
}

impl EngineError {
    /// Build an `InvalidParams` error from any message.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }
}
