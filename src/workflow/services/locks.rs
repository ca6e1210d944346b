//! Per-task mutual exclusion with a bounded wait.

use crate::workflow::domain::TaskId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;

/// Exclusive hold on one task, released on drop.
#[derive(Debug)]
pub struct TaskLockGuard {
    task_id: TaskId,
    _guard: OwnedMutexGuard<()>,
}

impl TaskLockGuard {
    /// Returns the locked task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }
}

/// Registry of per-task locks.
///
/// Tasks never contend with each other; only requests for the same task id
/// queue behind one another.
#[derive(Debug, Default)]
pub struct TaskLocks {
    slots: Mutex<HashMap<TaskId, Arc<tokio::sync::Mutex<()>>>>,
}

impl TaskLocks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits up to `wait` for exclusive access to `task_id`.
    ///
    /// Returns `None` when the wait elapses first.
    pub async fn acquire(&self, task_id: TaskId, wait: Duration) -> Option<TaskLockGuard> {
        let slot = self.slot(task_id);
        let guard = tokio::time::timeout(wait, slot.lock_owned()).await.ok()?;
        Some(TaskLockGuard {
            task_id,
            _guard: guard,
        })
    }

    /// Returns the number of tasks currently holding a lock slot.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn slot(&self, task_id: TaskId) -> Arc<tokio::sync::Mutex<()>> {
        // The map only stores handles, so a panic elsewhere leaves it usable.
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        // A slot referenced only by the map has no holder and no waiter.
        slots.retain(|_, slot| Arc::strong_count(slot) > 1);
        Arc::clone(slots.entry(task_id).or_default())
    }
}
