//! Transition coordinator: the single writer of workflow statuses.
//!
//! Every status change runs the same read-decide-write cycle under the
//! task's lock:
//!
//! 1. load the task snapshot and verify it against the transition table,
//! 2. look up any receipt stored under the request's idempotency key,
//! 3. ask [`decide`] for a verdict,
//! 4. materialise the plan and hand it to [`WorkflowStore::commit`].
//!
//! A commit that loses an optimistic version race is re-run from step 1.

use super::{
    error::{ParentRef, WorkflowError, WorkflowResult},
    locks::TaskLocks,
};
use crate::config::WorkflowConfig;
use crate::workflow::{
    domain::{
        TaskId, TaskSnapshot, TransitionCommit, TransitionEvent, TransitionReceipt,
        TransitionRequest, Verdict, decide,
    },
    ports::{WorkflowStore, WorkflowStoreError},
};
use mockable::Clock;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, instrument, warn};

/// Result of an applied or replayed transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    snapshot: TaskSnapshot,
    receipt: TransitionReceipt,
    replayed: bool,
}

impl TransitionOutcome {
    /// Returns the task snapshot after the request.
    ///
    /// For a replay this is the task's current snapshot, which may have moved
    /// on since the original transition.
    #[must_use]
    pub const fn snapshot(&self) -> &TaskSnapshot {
        &self.snapshot
    }

    /// Returns the receipt recording the transition.
    #[must_use]
    pub const fn receipt(&self) -> &TransitionReceipt {
        &self.receipt
    }

    /// Returns `true` when the request matched an earlier receipt and nothing
    /// was written.
    #[must_use]
    pub const fn is_replay(&self) -> bool {
        self.replayed
    }

    /// Consumes the outcome, returning the snapshot.
    #[must_use]
    pub fn into_snapshot(self) -> TaskSnapshot {
        self.snapshot
    }
}

enum AttemptError {
    Conflict(WorkflowStoreError),
    Failed(WorkflowError),
}

impl From<WorkflowError> for AttemptError {
    fn from(err: WorkflowError) -> Self {
        Self::Failed(err)
    }
}

/// Applies transitions atomically and idempotently.
pub struct TransitionCoordinator<S, C>
where
    S: WorkflowStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    locks: Arc<TaskLocks>,
    config: WorkflowConfig,
    events: broadcast::Sender<TransitionEvent>,
}

impl<S, C> Clone for TransitionCoordinator<S, C>
where
    S: WorkflowStore,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            locks: Arc::clone(&self.locks),
            config: self.config,
            events: self.events.clone(),
        }
    }
}

impl<S, C> TransitionCoordinator<S, C>
where
    S: WorkflowStore,
    C: Clock + Send + Sync,
{
    /// Creates a coordinator over `store`.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>, config: WorkflowConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity());
        Self {
            store,
            clock,
            locks: Arc::new(TaskLocks::new()),
            config,
            events,
        }
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Subscribes to events for transitions committed after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TransitionEvent> {
        self.events.subscribe()
    }

    /// Applies `request` to its task.
    ///
    /// A request whose idempotency key already has a matching receipt
    /// returns the earlier result without writing anything.
    ///
    /// # Errors
    ///
    /// - [`WorkflowError::InvalidParent`] when the task does not exist.
    /// - [`WorkflowError::InvalidTransition`], [`WorkflowError::AlreadySubmitted`],
    ///   [`WorkflowError::Forbidden`], [`WorkflowError::Validation`] or
    ///   [`WorkflowError::IdempotencyConflict`] when the state machine
    ///   refuses the request. Nothing is written.
    /// - [`WorkflowError::Busy`] when the task's lock is not granted within
    ///   the configured wait, or concurrent writers keep winning.
    /// - [`WorkflowError::StorageFailure`] when the store fails or holds an
    ///   inconsistent snapshot.
    #[instrument(
        skip(self, request),
        fields(task_id = %request.task_id(), action = %request.action())
    )]
    pub async fn apply_transition(
        &self,
        request: TransitionRequest,
    ) -> WorkflowResult<TransitionOutcome> {
        let task_id = request.task_id();
        let Some(guard) = self
            .locks
            .acquire(task_id, self.config.lock_timeout())
            .await
        else {
            warn!(
                wait_ms = self.config.lock_timeout_ms,
                "timed out waiting for task lock"
            );
            return Err(WorkflowError::Busy(task_id));
        };
        debug!(task_id = %guard.task_id(), "task lock acquired");

        let mut conflicts = 0;
        loop {
            match self.attempt(&request).await {
                Ok(outcome) => return Ok(outcome),
                Err(AttemptError::Failed(err)) => return Err(err),
                Err(AttemptError::Conflict(err)) if conflicts < self.config.max_conflict_retries => {
                    conflicts += 1;
                    warn!(error = %err, attempt = conflicts, "commit lost a race; re-reading task");
                }
                Err(AttemptError::Conflict(err)) => {
                    warn!(error = %err, "conflict retries exhausted");
                    return Err(WorkflowError::Busy(task_id));
                }
            }
        }
    }

    async fn attempt(&self, request: &TransitionRequest) -> Result<TransitionOutcome, AttemptError> {
        let task_id = request.task_id();
        let snapshot = self.load_snapshot(task_id).await?;
        let prior = self
            .store
            .find_receipt(task_id, request.idempotency_key())
            .await
            .map_err(|err| storage_failure(task_id, err))?;

        let verdict = decide(&snapshot, request, prior.as_ref()).map_err(WorkflowError::from)?;
        let plan = match verdict {
            Verdict::Replay(receipt) => {
                info!(
                    key = %receipt.idempotency_key(),
                    "replaying previously applied transition"
                );
                return Ok(TransitionOutcome {
                    snapshot,
                    receipt,
                    replayed: true,
                });
            }
            Verdict::Apply(plan) => plan,
        };
        debug!(from = %plan.from(), to = %plan.to(), "transition accepted");

        let commit = TransitionCommit::prepare(&snapshot, request, plan, self.clock.utc())
            .map_err(|err| {
                storage_failure(task_id, WorkflowStoreError::persistence(err))
            })?;
        match self.store.commit(&commit).await {
            Ok(()) => {}
            Err(err) if err.is_conflict() => return Err(AttemptError::Conflict(err)),
            Err(err) => return Err(storage_failure(task_id, err).into()),
        }

        let receipt = commit.receipt().clone();
        let event = TransitionEvent::from_receipt(commit.from(), &receipt);
        info!(
            from = %event.from,
            to = %event.to,
            actor = %event.actor_id,
            "transition committed"
        );
        if self.events.send(event).is_err() {
            debug!("no transition subscribers");
        }
        Ok(TransitionOutcome {
            snapshot: commit.resulting_snapshot().clone(),
            receipt,
            replayed: false,
        })
    }

    async fn load_snapshot(&self, task_id: TaskId) -> WorkflowResult<TaskSnapshot> {
        let snapshot = self
            .store
            .load_snapshot(task_id)
            .await
            .map_err(|err| storage_failure(task_id, err))?
            .ok_or(WorkflowError::InvalidParent(ParentRef::Task(task_id)))?;
        snapshot.check_consistency().map_err(|err| {
            storage_failure(task_id, WorkflowStoreError::persistence(err))
        })?;
        Ok(snapshot)
    }
}

fn storage_failure(task_id: TaskId, err: WorkflowStoreError) -> WorkflowError {
    error!(%task_id, error = %err, "workflow store failure");
    WorkflowError::StorageFailure(err)
}
