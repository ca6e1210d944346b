//! Shared test helpers for in-memory workflow integration tests.

use async_trait::async_trait;
use mockable::DefaultClock;
use rstest::fixture;
use signoff::{
    config::WorkflowConfig,
    workflow::{
        adapters::memory::InMemoryWorkflowStore,
        domain::{
            Actor, ActorRole, FinalApproval, FinalId, FinalStatus, IdempotencyKey, Project,
            ProjectId, Response, ResponseId, Review, ReviewId, Status, StringList, Task, TaskId,
            TaskSnapshot, TransitionCommit, TransitionReceipt, UserId,
        },
        ports::{WorkflowStore, WorkflowStoreError, WorkflowStoreResult},
        services::{CreateProjectRequest, CreateTaskRequest, WorkflowService},
    },
};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

/// Service over the plain in-memory store.
pub type MemoryService = WorkflowService<InMemoryWorkflowStore, DefaultClock>;

/// Provides a service over a fresh in-memory store.
#[fixture]
pub fn service() -> MemoryService {
    WorkflowService::new(
        Arc::new(InMemoryWorkflowStore::new()),
        Arc::new(DefaultClock),
        WorkflowConfig::default(),
    )
}

/// Parses a user ID.
///
/// # Panics
///
/// Panics when `name` is blank.
pub fn user(name: &str) -> UserId {
    UserId::new(name).expect("valid user id")
}

/// Returns an actor with the technical role.
pub fn technician() -> Actor {
    Actor::new(user("tech"), ActorRole::Technical)
}

/// Creates a project and a task assigned to `assignees`.
///
/// # Errors
///
/// Returns an error if either record cannot be created.
pub async fn seed_task<S>(
    service: &WorkflowService<S, DefaultClock>,
    assignees: &[&str],
) -> Result<Task, eyre::Report>
where
    S: WorkflowStore,
{
    let project = service
        .create_project(CreateProjectRequest::new("Substation upgrade", technician()))
        .await?;
    let task = service
        .create_task(
            CreateTaskRequest::new(
                project.id(),
                "Prepare site survey",
                StringList::new(assignees.iter().copied())?,
                technician(),
            )
            .with_description("Walk the site and record the switchgear layout"),
        )
        .await?;
    Ok(task)
}

/// Failure injected by [`FaultyStore`].
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    /// The first commit is persisted but reported as failed.
    LoseFirstCommitAck,
    /// Every commit is delayed before it is applied.
    SlowCommit(Duration),
}

/// In-memory store that misbehaves on commit.
#[derive(Debug, Clone)]
pub struct FaultyStore {
    inner: InMemoryWorkflowStore,
    fault: Fault,
    tripped: Arc<AtomicBool>,
    commits: Arc<AtomicUsize>,
}

impl FaultyStore {
    /// Wraps a fresh in-memory store.
    pub fn new(fault: Fault) -> Self {
        Self {
            inner: InMemoryWorkflowStore::new(),
            fault,
            tripped: Arc::new(AtomicBool::new(false)),
            commits: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns how many commits reached the inner store.
    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkflowStore for FaultyStore {
    async fn store_project(&self, project: &Project) -> WorkflowStoreResult<()> {
        self.inner.store_project(project).await
    }

    async fn find_project(&self, id: ProjectId) -> WorkflowStoreResult<Option<Project>> {
        self.inner.find_project(id).await
    }

    async fn insert_task(&self, task: &Task) -> WorkflowStoreResult<()> {
        self.inner.insert_task(task).await
    }

    async fn find_task(&self, id: TaskId) -> WorkflowStoreResult<Option<Task>> {
        self.inner.find_task(id).await
    }

    async fn find_response(&self, id: ResponseId) -> WorkflowStoreResult<Option<Response>> {
        self.inner.find_response(id).await
    }

    async fn find_review(&self, id: ReviewId) -> WorkflowStoreResult<Option<Review>> {
        self.inner.find_review(id).await
    }

    async fn find_final(&self, id: FinalId) -> WorkflowStoreResult<Option<FinalApproval>> {
        self.inner.find_final(id).await
    }

    async fn load_snapshot(&self, task_id: TaskId) -> WorkflowStoreResult<Option<TaskSnapshot>> {
        self.inner.load_snapshot(task_id).await
    }

    async fn find_receipt(
        &self,
        task_id: TaskId,
        key: &IdempotencyKey,
    ) -> WorkflowStoreResult<Option<TransitionReceipt>> {
        self.inner.find_receipt(task_id, key).await
    }

    async fn commit(&self, commit: &TransitionCommit) -> WorkflowStoreResult<()> {
        match self.fault {
            Fault::LoseFirstCommitAck => {
                self.inner.commit(commit).await?;
                self.commits.fetch_add(1, Ordering::SeqCst);
                if self.tripped.swap(true, Ordering::SeqCst) {
                    return Ok(());
                }
                Err(WorkflowStoreError::persistence(std::io::Error::other(
                    "connection reset before acknowledgement",
                )))
            }
            Fault::SlowCommit(delay) => {
                tokio::time::sleep(delay).await;
                self.inner.commit(commit).await?;
                self.commits.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }
    }

    async fn tasks_with_status(&self, status: Status) -> WorkflowStoreResult<Vec<Task>> {
        self.inner.tasks_with_status(status).await
    }

    async fn responses_with_status(&self, status: Status) -> WorkflowStoreResult<Vec<Response>> {
        self.inner.responses_with_status(status).await
    }

    async fn reviews_with_status(&self, status: Status) -> WorkflowStoreResult<Vec<Review>> {
        self.inner.reviews_with_status(status).await
    }

    async fn finals_with_status(
        &self,
        status: FinalStatus,
    ) -> WorkflowStoreResult<Vec<FinalApproval>> {
        self.inner.finals_with_status(status).await
    }

    async fn tasks_for_project(&self, project_id: ProjectId) -> WorkflowStoreResult<Vec<Task>> {
        self.inner.tasks_for_project(project_id).await
    }

    async fn tasks_for_assignee(&self, user: &UserId) -> WorkflowStoreResult<Vec<Task>> {
        self.inner.tasks_for_assignee(user).await
    }

    async fn responses_for_task(&self, task_id: TaskId) -> WorkflowStoreResult<Vec<Response>> {
        self.inner.responses_for_task(task_id).await
    }

    async fn reviews_for_task(&self, task_id: TaskId) -> WorkflowStoreResult<Vec<Review>> {
        self.inner.reviews_for_task(task_id).await
    }

    async fn finals_for_task(&self, task_id: TaskId) -> WorkflowStoreResult<Vec<FinalApproval>> {
        self.inner.finals_for_task(task_id).await
    }
}

/// Builds a service over a shared faulty store.
pub fn faulty_service(
    store: &Arc<FaultyStore>,
    config: WorkflowConfig,
) -> WorkflowService<FaultyStore, DefaultClock> {
    WorkflowService::new(Arc::clone(store), Arc::new(DefaultClock), config)
}
