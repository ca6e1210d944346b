//! Errors surfaced by workflow services.

use crate::workflow::{
    domain::{
        Action, IdempotencyKey, ProjectId, ResponseId, ReviewId, Status, TaskId,
        TransitionRejection, WorkflowDomainError,
    },
    ports::WorkflowStoreError,
};
use std::fmt;
use thiserror::Error;

/// A referenced record that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentRef {
    /// Missing project.
    Project(ProjectId),
    /// Missing task.
    Task(TaskId),
    /// Missing response.
    Response(ResponseId),
    /// Missing review.
    Review(ReviewId),
}

impl fmt::Display for ParentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project(id) => write!(f, "project {id}"),
            Self::Task(id) => write!(f, "task {id}"),
            Self::Response(id) => write!(f, "response {id}"),
            Self::Review(id) => write!(f, "review {id}"),
        }
    }
}

/// Service-level errors for workflow operations.
#[derive(Debug, Clone, Error)]
pub enum WorkflowError {
    /// The referenced parent record does not exist.
    #[error("{0} does not exist")]
    InvalidParent(ParentRef),

    /// The action is illegal from the task's current status.
    #[error("cannot {action} task {task_id} from status {from}")]
    InvalidTransition {
        /// Task the action targeted.
        task_id: TaskId,
        /// Status the task was in.
        from: Status,
        /// Refused action.
        action: Action,
    },

    /// Another response already holds the task.
    #[error("task {0} already has a submitted response")]
    AlreadySubmitted(TaskId),

    /// The task's lock could not be taken in time.
    #[error("task {0} is busy; retry later")]
    Busy(TaskId),

    /// The store failed or returned records it should not hold.
    #[error("storage failure: {0}")]
    StorageFailure(#[source] WorkflowStoreError),

    /// Input failed validation.
    #[error(transparent)]
    Validation(#[from] WorkflowDomainError),

    /// The caller may not perform the operation.
    #[error("{operation} forbidden: {reason}")]
    Forbidden {
        /// Refused operation.
        operation: &'static str,
        /// Why it was refused.
        reason: String,
    },

    /// The idempotency key was already used for a different request.
    #[error("idempotency key '{key}' was already used for a different request on task {task_id}")]
    IdempotencyConflict {
        /// Task the key belongs to.
        task_id: TaskId,
        /// Reused key.
        key: IdempotencyKey,
    },
}

impl WorkflowError {
    /// Returns `true` when retrying the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy(_) | Self::StorageFailure(_))
    }
}

impl From<WorkflowStoreError> for WorkflowError {
    fn from(err: WorkflowStoreError) -> Self {
        Self::StorageFailure(err)
    }
}

impl From<TransitionRejection> for WorkflowError {
    fn from(rejection: TransitionRejection) -> Self {
        match rejection {
            TransitionRejection::InvalidTransition {
                task_id,
                from,
                action,
            } => Self::InvalidTransition {
                task_id,
                from,
                action,
            },
            TransitionRejection::AlreadySubmitted(task_id) => Self::AlreadySubmitted(task_id),
            TransitionRejection::RoleNotPermitted { role, action } => Self::Forbidden {
                operation: action.as_str(),
                reason: format!("the {role} role may not perform it"),
            },
            TransitionRejection::NotAssigned {
                task_id,
                actor,
                action,
            } => Self::Forbidden {
                operation: action.as_str(),
                reason: format!("{actor} is not assigned to task {task_id}"),
            },
            TransitionRejection::IdempotencyConflict { task_id, key } => {
                Self::IdempotencyConflict { task_id, key }
            }
            TransitionRejection::Validation(err) => Self::Validation(err),
        }
    }
}

/// Result type for workflow service operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;
