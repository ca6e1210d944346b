//! Error types for workflow domain validation and transition decisions.

use super::{Action, ActorRole, IdempotencyKey, Status, TaskId, UserId};
use thiserror::Error;

/// Errors returned while constructing or validating workflow domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowDomainError {
    /// A user identifier is blank.
    #[error("user identifier must not be empty")]
    EmptyUserId,

    /// An idempotency key is blank or too long.
    #[error("invalid idempotency key '{0}'")]
    InvalidIdempotencyKey(String),

    /// A task title is blank.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// A task has no assignees.
    #[error("a task requires at least one assignee")]
    NoAssignees,

    /// A rejection was submitted without a justification.
    #[error("rejecting requires non-empty comments")]
    EmptyRejectionComments,

    /// A structured list field arrived in an unusable shape.
    #[error("malformed {field}: {reason}")]
    MalformedList {
        /// Name of the offending field.
        field: &'static str,
        /// What was wrong with the value.
        reason: String,
    },

    /// The persisted records of a task disagree with the transition table.
    #[error("inconsistent snapshot for task {task_id}: {reason}")]
    InconsistentSnapshot {
        /// Task whose records disagree.
        task_id: TaskId,
        /// Which relation was violated.
        reason: String,
    },
}

impl WorkflowDomainError {
    /// Creates a malformed-list error.
    #[must_use]
    pub fn malformed_list(field: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedList {
            field,
            reason: reason.into(),
        }
    }

    /// Creates an inconsistent-snapshot error.
    #[must_use]
    pub fn inconsistent(task_id: TaskId, reason: impl Into<String>) -> Self {
        Self::InconsistentSnapshot {
            task_id,
            reason: reason.into(),
        }
    }
}

/// Error returned while parsing statuses from persistence or input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown status: {0}")]
pub struct ParseStatusError(pub String);

/// Error returned while parsing action names from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown action: {0}")]
pub struct ParseActionError(pub String);

/// Reasons the state machine refuses a requested action.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionRejection {
    /// The action is not legal from the task's current status.
    #[error("cannot {action} task {task_id} while it is {from}")]
    InvalidTransition {
        /// Task the action targeted.
        task_id: TaskId,
        /// Status observed in the snapshot.
        from: Status,
        /// Requested action.
        action: Action,
    },

    /// Another response already won the submission race.
    #[error("a response for task {0} has already been submitted")]
    AlreadySubmitted(TaskId),

    /// The actor's role may not perform the action.
    #[error("{role} may not {action}")]
    RoleNotPermitted {
        /// Role of the acting user.
        role: ActorRole,
        /// Requested action.
        action: Action,
    },

    /// The actor is not one of the task's assignees.
    #[error("user {actor} is not assigned to task {task_id} and may not {action}")]
    NotAssigned {
        /// Task the action targeted.
        task_id: TaskId,
        /// Acting user.
        actor: UserId,
        /// Requested action.
        action: Action,
    },

    /// The idempotency key was already used for a different request.
    #[error("idempotency key '{key}' was already used for a different request on task {task_id}")]
    IdempotencyConflict {
        /// Task the key is scoped to.
        task_id: TaskId,
        /// Reused key.
        key: IdempotencyKey,
    },

    /// The request payload failed validation.
    #[error(transparent)]
    Validation(#[from] WorkflowDomainError),
}
