//! Asynchronous market-wide screening: task state, registry, orchestrator.

mod error;
mod orchestrator;
mod registry;
mod task;

pub use error::ScreeningError;
pub use orchestrator::{ScreeningConfig, ScreeningOrchestrator, ScreeningRequest};
pub use registry::TaskRegistry;
pub use task::{ScreeningTask, SymbolScreenResult, TaskStatus};
