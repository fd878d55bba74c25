//! In-process task registry with atomic snapshots.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use uuid::Uuid;

use super::task::ScreeningTask;

/// Shared map of screening tasks.
///
/// Writers build a replacement task value and swap the `Arc` inside one
/// write lock, so readers always observe a complete snapshot and polls
/// see monotonic progress. Tasks live for the process lifetime.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: RwLock<HashMap<Uuid, Arc<ScreeningTask>>>,
}

impl TaskRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a new task.
    pub fn insert(&self, task: ScreeningTask) {
        let mut tasks = self.tasks.write().unwrap_or_else(PoisonError::into_inner);
        tasks.insert(task.id, Arc::new(task));
    }

    /// Snapshot of the task, if known.
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<Arc<ScreeningTask>> {
        let tasks = self.tasks.read().unwrap_or_else(PoisonError::into_inner);
        tasks.get(&id).cloned()
    }

    /// Apply `mutate` to a cloned task value and swap it in atomically.
    ///
    /// Unknown ids are ignored; the orchestrator is the only writer.
    pub fn update(&self, id: Uuid, mutate: impl FnOnce(&mut ScreeningTask)) {
        let mut tasks = self.tasks.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = tasks.get(&id) {
            let mut next = ScreeningTask::clone(current);
            mutate(&mut next);
            tasks.insert(id, Arc::new(next));
        }
    }
}
