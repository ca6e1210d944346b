//! Read-only projections for role dashboards.
//!
//! Views read straight from the store without taking task locks, so their
//! results may trail a transition that is committing concurrently.

use super::error::{ParentRef, WorkflowError, WorkflowResult};
use crate::workflow::{
    domain::{
        FinalApproval, FinalStatus, ProjectId, Response, Review, Status, Task, TaskHistory,
        TaskId, TaskSnapshot, UserId,
    },
    ports::WorkflowStore,
};
use std::sync::Arc;

/// Entity kind and status to filter by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusQuery {
    /// Tasks in a status.
    Tasks(Status),
    /// Responses in a status.
    Responses(Status),
    /// Reviews in a status.
    Reviews(Status),
    /// Final records with a verdict.
    Finals(FinalStatus),
}

/// One record returned by [`QueryViews::list_by_status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowRecord {
    /// A task.
    Task(Task),
    /// A response.
    Response(Response),
    /// A review.
    Review(Review),
    /// A final-approval record.
    Final(FinalApproval),
}

/// Dashboard queries over a workflow store.
#[derive(Debug)]
pub struct QueryViews<S>
where
    S: WorkflowStore,
{
    store: Arc<S>,
}

impl<S> Clone for QueryViews<S>
where
    S: WorkflowStore,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> QueryViews<S>
where
    S: WorkflowStore,
{
    /// Creates views over `store`.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Lists records of one kind in one status, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::StorageFailure`] when the store fails.
    pub async fn list_by_status(&self, query: StatusQuery) -> WorkflowResult<Vec<WorkflowRecord>> {
        let records = match query {
            StatusQuery::Tasks(status) => wrap(
                self.store.tasks_with_status(status).await?,
                WorkflowRecord::Task,
            ),
            StatusQuery::Responses(status) => wrap(
                self.store.responses_with_status(status).await?,
                WorkflowRecord::Response,
            ),
            StatusQuery::Reviews(status) => wrap(
                self.store.reviews_with_status(status).await?,
                WorkflowRecord::Review,
            ),
            StatusQuery::Finals(status) => wrap(
                self.store.finals_with_status(status).await?,
                WorkflowRecord::Final,
            ),
        };
        Ok(records)
    }

    /// Returns the task with its active records.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidParent`] when the task does not exist
    /// and [`WorkflowError::StorageFailure`] when the store fails.
    pub async fn snapshot(&self, task_id: TaskId) -> WorkflowResult<TaskSnapshot> {
        self.store
            .load_snapshot(task_id)
            .await?
            .ok_or(WorkflowError::InvalidParent(ParentRef::Task(task_id)))
    }

    /// Lists tasks naming `user` among their assignees.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::StorageFailure`] when the store fails.
    pub async fn tasks_for_assignee(&self, user: &UserId) -> WorkflowResult<Vec<Task>> {
        Ok(self.store.tasks_for_assignee(user).await?)
    }

    /// Lists the tasks of a project.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidParent`] when the project does not
    /// exist and [`WorkflowError::StorageFailure`] when the store fails.
    pub async fn tasks_for_project(&self, project_id: ProjectId) -> WorkflowResult<Vec<Task>> {
        if self.store.find_project(project_id).await?.is_none() {
            return Err(WorkflowError::InvalidParent(ParentRef::Project(project_id)));
        }
        Ok(self.store.tasks_for_project(project_id).await?)
    }

    /// Returns every record ever written against a task, including rejected
    /// and superseded ones.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidParent`] when the task does not exist
    /// and [`WorkflowError::StorageFailure`] when the store fails.
    pub async fn history(&self, task_id: TaskId) -> WorkflowResult<TaskHistory> {
        let task = self
            .store
            .find_task(task_id)
            .await?
            .ok_or(WorkflowError::InvalidParent(ParentRef::Task(task_id)))?;
        Ok(TaskHistory {
            task,
            responses: self.store.responses_for_task(task_id).await?,
            reviews: self.store.reviews_for_task(task_id).await?,
            finals: self.store.finals_for_task(task_id).await?,
        })
    }
}

fn wrap<T>(records: Vec<T>, into: fn(T) -> WorkflowRecord) -> Vec<WorkflowRecord> {
    records.into_iter().map(into).collect()
}
