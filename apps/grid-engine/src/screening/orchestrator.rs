//! Market-wide screening runs over a bounded worker pool.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::market::{KlineInterval, KlineSource, SymbolUniverse};
use crate::search::ParameterSearchEngine;

use super::error::ScreeningError;
use super::registry::TaskRegistry;
use super::task::{ScreeningTask, SymbolScreenResult, TaskStatus};

/// Tuning knobs for a screening run.
#[derive(Debug, Clone)]
pub struct ScreeningConfig {
    /// Symbols screened concurrently.
    pub max_concurrency: usize,
    /// Wall-clock cap on one symbol's fetch plus search.
    pub symbol_timeout: Duration,
    /// Symbols with fewer bars are skipped without searching.
    pub min_bars: usize,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            symbol_timeout: Duration::from_secs(60),
            min_bars: 200,
        }
    }
}

/// What to screen every symbol against.
#[derive(Debug, Clone, Copy)]
pub struct ScreeningRequest {
    /// Bar interval for every symbol.
    pub interval: KlineInterval,
    /// Bars requested per symbol.
    pub limit: usize,
    /// Strategy budget per symbol.
    pub total_amount: Decimal,
}

struct ActiveRun {
    task_id: Uuid,
    cancel: Arc<AtomicBool>,
}

/// Runs screening tasks: one at a time, each fanning out over the
/// symbol universe with bounded concurrency and per-symbol timeouts.
pub struct ScreeningOrchestrator {
    klines: Arc<dyn KlineSource>,
    universe: Arc<dyn SymbolUniverse>,
    registry: Arc<TaskRegistry>,
    config: ScreeningConfig,
    active: Mutex<Option<ActiveRun>>,
}

impl ScreeningOrchestrator {
    /// Orchestrator over the given market collaborators and registry.
    #[must_use]
    pub fn new(
        klines: Arc<dyn KlineSource>,
        universe: Arc<dyn SymbolUniverse>,
        registry: Arc<TaskRegistry>,
        config: ScreeningConfig,
    ) -> Self {
        Self {
            klines,
            universe,
            registry,
            config,
            active: Mutex::new(None),
        }
    }

    /// Register a task and start its run in the background.
    ///
    /// Returns immediately with the task id; poll the registry for
    /// progress.
    ///
    /// # Errors
    ///
    /// [`ScreeningError::AlreadyRunning`] while a previous task has not
    /// reached a terminal state.
    pub fn launch(self: &Arc<Self>, request: ScreeningRequest) -> Result<Uuid, ScreeningError> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(run) = active.as_ref()
            && let Some(task) = self.registry.get(run.task_id)
            && !task.status.is_terminal()
        {
            return Err(ScreeningError::AlreadyRunning {
                task_id: run.task_id,
            });
        }

        let task_id = Uuid::new_v4();
        let cancel = Arc::new(AtomicBool::new(false));
        self.registry.insert(ScreeningTask::new(task_id));
        *active = Some(ActiveRun {
            task_id,
            cancel: Arc::clone(&cancel),
        });

        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.run_task(task_id, request, cancel).await;
        });

        Ok(task_id)
    }

    /// Request cancellation of a running task.
    ///
    /// In-flight symbols finish; queued symbols are skipped but still
    /// counted as processed, so the task settles `Completed`. Cancelling
    /// an already-terminal task is a no-op.
    ///
    /// # Errors
    ///
    /// [`ScreeningError::TaskNotFound`] for unknown ids.
    pub fn cancel(&self, task_id: Uuid) -> Result<(), ScreeningError> {
        let active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(run) = active.as_ref()
            && run.task_id == task_id
        {
            info!(%task_id, "Screening cancellation requested");
            run.cancel.store(true, Ordering::Relaxed);
            return Ok(());
        }

        if self.registry.get(task_id).is_some() {
            return Ok(());
        }
        Err(ScreeningError::TaskNotFound(task_id))
    }

    async fn run_task(&self, task_id: Uuid, request: ScreeningRequest, cancel: Arc<AtomicBool>) {
        info!(%task_id, interval = %request.interval, "Screening run started");

        let symbols = match self.universe.list_symbols().await {
            Ok(symbols) => symbols,
            Err(e) => {
                let error = ScreeningError::UniverseUnavailable(e);
                warn!(%task_id, error = %error, "Screening run failed");
                self.registry.update(task_id, |t| {
                    t.status = TaskStatus::Failed;
                    t.error = Some(error.to_string());
                    t.completed_at = Some(Utc::now());
                });
                return;
            }
        };

        let total = symbols.len();
        self.registry.update(task_id, |t| {
            t.status = TaskStatus::Running;
            t.total_symbols = total;
        });

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let mut workers = JoinSet::new();
        for symbol in symbols {
            let semaphore = Arc::clone(&semaphore);
            let klines = Arc::clone(&self.klines);
            let cancel = Arc::clone(&cancel);
            let config = self.config.clone();
            workers.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return None;
                };
                if cancel.load(Ordering::Relaxed) {
                    debug!(symbol, "Skipping symbol, run cancelled");
                    return None;
                }

                let screened = tokio::time::timeout(
                    config.symbol_timeout,
                    screen_symbol(klines, &symbol, request, config.min_bars),
                )
                .await;

                match screened {
                    Ok(Ok(result)) => Some(result),
                    Ok(Err(e)) => {
                        debug!(symbol, error = %e, "Skipping symbol");
                        None
                    }
                    Err(_) => {
                        warn!(symbol, "Symbol screening timed out");
                        None
                    }
                }
            });
        }

        // join_next serializes registry writes, so every poll sees one
        // consistent (processed, results) pair.
        while let Some(joined) = workers.join_next().await {
            let result = match joined {
                Ok(result) => result,
                Err(e) => {
                    warn!(%task_id, error = %e, "Screening worker lost");
                    None
                }
            };
            self.registry.update(task_id, |t| {
                if let Some(result) = result {
                    t.results.push(result);
                }
                t.processed_symbols += 1;
            });
        }

        self.registry.update(task_id, |t| {
            t.status = TaskStatus::Completed;
            t.completed_at = Some(Utc::now());
        });
        info!(%task_id, total_symbols = total, "Screening run complete");
    }
}

/// Fetch bars and run the screening-profile search for one symbol.
async fn screen_symbol(
    klines: Arc<dyn KlineSource>,
    symbol: &str,
    request: ScreeningRequest,
    min_bars: usize,
) -> Result<SymbolScreenResult, ScreeningError> {
    let bars = klines
        .get_bars(symbol, request.interval, request.limit)
        .await?;
    if bars.len() < min_bars {
        return Err(ScreeningError::Engine(
            crate::error::EngineError::InsufficientData {
                required: min_bars,
                actual: bars.len(),
            },
        ));
    }

    let owned_symbol = symbol.to_string();
    let search = tokio::task::spawn_blocking(move || {
        ParameterSearchEngine::screening().search(
            &owned_symbol,
            &bars,
            request.interval,
            request.total_amount,
        )
    })
    .await
    .map_err(|e| ScreeningError::Worker(e.to_string()))??;

    Ok(SymbolScreenResult::from_search(symbol, &search))
}
