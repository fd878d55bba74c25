//! Error types for upstream market-data providers.

use thiserror::Error;

/// Errors from the bar-history and symbol-universe collaborators.
#[derive(Debug, Error)]
pub enum MarketDataError {
    /// Transport-level failure talking to the exchange.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Exchange answered with a non-success status.
    #[error("{endpoint} returned status {status}")]
    Status {
        /// Endpoint path that failed.
        endpoint: String,
        /// HTTP status code.
        status: u16,
    },

    /// Response body did not match the expected shape.
    #[error("failed to decode {endpoint} response: {message}")]
    Decode {
        /// Endpoint path that failed.
        endpoint: String,
        /// What went wrong.
        message: String,
    },

    /// Bounded retries were exhausted without a success.
    #[error("giving up on {endpoint} after {attempts} attempts: {message}")]
    ExhaustedRetries {
        /// Endpoint path that failed.
        endpoint: String,
        /// Attempts made before surfacing.
        attempts: u32,
        /// Last error observed.
        message: String,
    },

    /// Interval string is not one the engine supports.
    #[error("unknown kline interval '{0}'")]
    UnknownInterval(String),

    /// Test double was told to fail for this symbol.
    #[error("no data available for symbol '{0}'")]
    SymbolUnavailable(String),
}
