//! Receipts of committed transitions, used to answer retried requests.

use super::{
    Action, FinalId, IdempotencyKey, ResponseId, ReviewId, Status, TaskId, TransitionRequest,
    UserId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Records touched by a committed transition and the state it produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptOutcome {
    /// Task status after the transition.
    pub task_status: Status,
    /// Task version after the transition.
    pub task_version: u64,
    /// Response created or updated, if any.
    pub response_id: Option<ResponseId>,
    /// Review created or updated, if any.
    pub review_id: Option<ReviewId>,
    /// Final record created, if any.
    pub final_id: Option<FinalId>,
}

/// Durable proof that a keyed request was applied to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionReceipt {
    task_id: TaskId,
    idempotency_key: IdempotencyKey,
    action: Action,
    actor_id: UserId,
    fingerprint: String,
    outcome: ReceiptOutcome,
    applied_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedReceiptData {
    /// Task the key is scoped to.
    pub task_id: TaskId,
    /// Caller-supplied key.
    pub idempotency_key: IdempotencyKey,
    /// Applied action.
    pub action: Action,
    /// Acting user.
    pub actor_id: UserId,
    /// Payload fingerprint.
    pub fingerprint: String,
    /// Resulting state.
    pub outcome: ReceiptOutcome,
    /// Commit timestamp.
    pub applied_at: DateTime<Utc>,
}

impl TransitionReceipt {
    pub(crate) fn issue(
        request: &TransitionRequest,
        outcome: ReceiptOutcome,
        applied_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id: request.task_id(),
            idempotency_key: request.idempotency_key().clone(),
            action: request.action(),
            actor_id: request.actor().id().clone(),
            fingerprint: request.payload().fingerprint(),
            outcome,
            applied_at,
        }
    }

    /// Reconstructs a receipt from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedReceiptData) -> Self {
        Self {
            task_id: data.task_id,
            idempotency_key: data.idempotency_key,
            action: data.action,
            actor_id: data.actor_id,
            fingerprint: data.fingerprint,
            outcome: data.outcome,
            applied_at: data.applied_at,
        }
    }

    /// Returns `true` when `request` is a retry of the request this receipt
    /// records: same task, key, action, actor and payload.
    #[must_use]
    pub fn matches(&self, request: &TransitionRequest) -> bool {
        self.task_id == request.task_id()
            && &self.idempotency_key == request.idempotency_key()
            && self.action == request.action()
            && &self.actor_id == request.actor().id()
            && self.fingerprint == request.payload().fingerprint()
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the idempotency key.
    #[must_use]
    pub const fn idempotency_key(&self) -> &IdempotencyKey {
        &self.idempotency_key
    }

    /// Returns the applied action.
    #[must_use]
    pub const fn action(&self) -> Action {
        self.action
    }

    /// Returns the acting user.
    #[must_use]
    pub const fn actor_id(&self) -> &UserId {
        &self.actor_id
    }

    /// Returns the payload fingerprint.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Returns the recorded outcome.
    #[must_use]
    pub const fn outcome(&self) -> ReceiptOutcome {
        self.outcome
    }

    /// Returns the commit timestamp.
    #[must_use]
    pub const fn applied_at(&self) -> DateTime<Utc> {
        self.applied_at
    }
}
