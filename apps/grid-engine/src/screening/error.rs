//! Error types for screening runs.

use thiserror::Error;
use uuid::Uuid;

use crate::error::EngineError;
use crate::market::MarketDataError;

/// Errors surfaced by the screening orchestrator.
#[derive(Debug, Error)]
pub enum ScreeningError {
    /// A launch was attempted while another task is still active.
    #[error("screening task {task_id} is already running")]
    AlreadyRunning {
        /// The task blocking the launch.
        task_id: Uuid,
    },

    /// No task registered under this id.
    #[error("screening task {0} not found")]
    TaskNotFound(Uuid),

    /// The symbol universe could not be fetched; the run is fatal.
    #[error("symbol universe unavailable: {0}")]
    UniverseUnavailable(#[source] MarketDataError),

    /// Upstream market data failure for one symbol.
    #[error(transparent)]
    Market(#[from] MarketDataError),

    /// Simulation or search failure for one symbol.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A blocking search worker was lost.
    #[error("screening worker failed: {0}")]
    Worker(String),
}
