//! Entity store port for workflow records.
//!
//! The store owns durable copies of projects, tasks and their dependent
//! records. Record creation outside task setup goes exclusively through
//! [`WorkflowStore::commit`], which receives a [`TransitionCommit`] that only
//! the transition coordinator can build; there are no raw status setters.

use crate::workflow::domain::{
    FinalApproval, FinalId, FinalStatus, IdempotencyKey, Project, ProjectId, Response, ResponseId,
    Review, ReviewId, Status, Task, TaskId, TaskSnapshot, TransitionCommit, TransitionReceipt,
    UserId,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for workflow store operations.
pub type WorkflowStoreResult<T> = Result<T, WorkflowStoreError>;

/// Workflow record persistence contract.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Stores a new project.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowStoreError::DuplicateRecord`] when the project ID
    /// already exists.
    async fn store_project(&self, project: &Project) -> WorkflowStoreResult<()>;

    /// Finds a project by identifier.
    async fn find_project(&self, id: ProjectId) -> WorkflowStoreResult<Option<Project>>;

    /// Stores a newly created task.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowStoreError::DuplicateRecord`] when the task ID
    /// already exists.
    async fn insert_task(&self, task: &Task) -> WorkflowStoreResult<()>;

    /// Finds a task by identifier.
    async fn find_task(&self, id: TaskId) -> WorkflowStoreResult<Option<Task>>;

    /// Finds a response by identifier.
    async fn find_response(&self, id: ResponseId) -> WorkflowStoreResult<Option<Response>>;

    /// Finds a review by identifier.
    async fn find_review(&self, id: ReviewId) -> WorkflowStoreResult<Option<Review>>;

    /// Finds a final-approval record by identifier.
    async fn find_final(&self, id: FinalId) -> WorkflowStoreResult<Option<FinalApproval>>;

    /// Reads a task and its active records in one consistent read.
    ///
    /// Returns `None` when the task does not exist.
    async fn load_snapshot(&self, task_id: TaskId) -> WorkflowStoreResult<Option<TaskSnapshot>>;

    /// Finds the receipt stored for a key on a task.
    async fn find_receipt(
        &self,
        task_id: TaskId,
        key: &IdempotencyKey,
    ) -> WorkflowStoreResult<Option<TransitionReceipt>>;

    /// Applies every write of a transition atomically.
    ///
    /// Readers observe either none or all of the commit's writes.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowStoreError::VersionConflict`] when the stored task
    /// version differs from [`TransitionCommit::expected_version`], and
    /// [`WorkflowStoreError::DuplicateRecord`] when the receipt key is
    /// already taken. Nothing is written in either case.
    async fn commit(&self, commit: &TransitionCommit) -> WorkflowStoreResult<()>;

    /// Lists tasks in a status, oldest first.
    async fn tasks_with_status(&self, status: Status) -> WorkflowStoreResult<Vec<Task>>;

    /// Lists responses in a status, oldest first.
    async fn responses_with_status(&self, status: Status) -> WorkflowStoreResult<Vec<Response>>;

    /// Lists reviews in a status, oldest first.
    async fn reviews_with_status(&self, status: Status) -> WorkflowStoreResult<Vec<Review>>;

    /// Lists final-approval records with a verdict, oldest first.
    async fn finals_with_status(
        &self,
        status: FinalStatus,
    ) -> WorkflowStoreResult<Vec<FinalApproval>>;

    /// Lists the tasks of a project, oldest first.
    async fn tasks_for_project(&self, project_id: ProjectId) -> WorkflowStoreResult<Vec<Task>>;

    /// Lists the tasks naming a user among their assignees, oldest first.
    async fn tasks_for_assignee(&self, user: &UserId) -> WorkflowStoreResult<Vec<Task>>;

    /// Lists every response recorded against a task, oldest first.
    async fn responses_for_task(&self, task_id: TaskId) -> WorkflowStoreResult<Vec<Response>>;

    /// Lists every review recorded against a task, oldest first.
    async fn reviews_for_task(&self, task_id: TaskId) -> WorkflowStoreResult<Vec<Review>>;

    /// Lists every final-approval record written against a task, oldest
    /// first.
    async fn finals_for_task(&self, task_id: TaskId) -> WorkflowStoreResult<Vec<FinalApproval>>;
}

/// Errors returned by workflow store implementations.
#[derive(Debug, Clone, Error)]
pub enum WorkflowStoreError {
    /// A record with the same key already exists.
    #[error("duplicate {kind} record: {key}")]
    DuplicateRecord {
        /// Record kind.
        kind: &'static str,
        /// Conflicting key.
        key: String,
    },

    /// The record to update was not found.
    #[error("{kind} record not found: {key}")]
    NotFound {
        /// Record kind.
        kind: &'static str,
        /// Missing key.
        key: String,
    },

    /// The task changed since it was read.
    #[error("task {task_id} is no longer at version {expected}")]
    VersionConflict {
        /// Task whose version moved.
        task_id: TaskId,
        /// Version the commit expected.
        expected: u64,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl WorkflowStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Creates a duplicate-record error.
    #[must_use]
    pub fn duplicate(kind: &'static str, key: impl ToString) -> Self {
        Self::DuplicateRecord {
            kind,
            key: key.to_string(),
        }
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(kind: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    /// Returns `true` when another writer won a race for the same task and
    /// re-reading may let the request proceed.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::VersionConflict { .. } | Self::DuplicateRecord { .. }
        )
    }
}
