//! In-memory workflow store for tests and single-process deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::workflow::{
    domain::{
        FinalApproval, FinalId, FinalStatus, IdempotencyKey, Project, ProjectId, RecordWrite,
        Response, ResponseId, Review, ReviewId, Status, Task, TaskId, TaskSnapshot,
        TransitionCommit, TransitionReceipt, UserId,
    },
    ports::{WorkflowStore, WorkflowStoreError, WorkflowStoreResult},
};

/// Thread-safe in-memory workflow store.
///
/// Every commit is applied under a single write lock after all of its
/// preconditions have been checked, so readers never see half a transition.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkflowStore {
    state: Arc<RwLock<InMemoryWorkflowState>>,
}

#[derive(Debug, Default)]
struct InMemoryWorkflowState {
    projects: HashMap<ProjectId, Project>,
    tasks: HashMap<TaskId, Task>,
    responses: HashMap<ResponseId, Response>,
    reviews: HashMap<ReviewId, Review>,
    finals: HashMap<FinalId, FinalApproval>,
    receipts: HashMap<(TaskId, IdempotencyKey), TransitionReceipt>,
    responses_by_task: HashMap<TaskId, Vec<ResponseId>>,
    reviews_by_task: HashMap<TaskId, Vec<ReviewId>>,
    finals_by_task: HashMap<TaskId, Vec<FinalId>>,
}

impl InMemoryWorkflowStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> WorkflowStoreResult<RwLockReadGuard<'_, InMemoryWorkflowState>> {
        self.state.read().map_err(|err| {
            WorkflowStoreError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> WorkflowStoreResult<RwLockWriteGuard<'_, InMemoryWorkflowState>> {
        self.state.write().map_err(|err| {
            WorkflowStoreError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

impl InMemoryWorkflowState {
    fn ordered_tasks(&self, keep: impl Fn(&Task) -> bool) -> Vec<Task> {
        let mut found: Vec<Task> = self
            .tasks
            .values()
            .filter(|task| keep(task))
            .cloned()
            .collect();
        found.sort_by_key(|task| (task.created_at(), task.id()));
        found
    }

    fn responses_in(&self, status: Status) -> Vec<Response> {
        let mut found: Vec<Response> = self
            .responses
            .values()
            .filter(|response| response.status() == status)
            .cloned()
            .collect();
        found.sort_by_key(|response| (response.responded_at(), response.id()));
        found
    }

    fn reviews_in(&self, status: Status) -> Vec<Review> {
        let mut found: Vec<Review> = self
            .reviews
            .values()
            .filter(|review| review.status() == status)
            .cloned()
            .collect();
        found.sort_by_key(|review| (review.reviewed_at(), review.id()));
        found
    }

    fn finals_in(&self, status: FinalStatus) -> Vec<FinalApproval> {
        let mut found: Vec<FinalApproval> = self
            .finals
            .values()
            .filter(|final_approval| final_approval.status() == status)
            .cloned()
            .collect();
        found.sort_by_key(|final_approval| (final_approval.approved_at(), final_approval.id()));
        found
    }

    fn snapshot(&self, task_id: TaskId) -> Option<TaskSnapshot> {
        let task = self.tasks.get(&task_id)?.clone();
        let links = task.links();
        let response = links
            .active_response_id
            .and_then(|id| self.responses.get(&id))
            .cloned();
        let review = links
            .active_review_id
            .and_then(|id| self.reviews.get(&id))
            .cloned();
        let final_approval = links.final_id.and_then(|id| self.finals.get(&id)).cloned();
        Some(TaskSnapshot::new(task, response, review, final_approval))
    }

    fn check_commit(&self, commit: &TransitionCommit) -> WorkflowStoreResult<()> {
        let task = commit.task();
        let stored = self
            .tasks
            .get(&task.id())
            .ok_or_else(|| WorkflowStoreError::not_found("task", task.id()))?;
        if stored.version() != commit.expected_version() {
            return Err(WorkflowStoreError::VersionConflict {
                task_id: task.id(),
                expected: commit.expected_version(),
            });
        }

        let receipt = commit.receipt();
        if self
            .receipts
            .contains_key(&(receipt.task_id(), receipt.idempotency_key().clone()))
        {
            return Err(WorkflowStoreError::duplicate(
                "receipt",
                receipt.idempotency_key(),
            ));
        }

        match commit.response() {
            Some(RecordWrite::Insert(response)) if self.responses.contains_key(&response.id()) => {
                return Err(WorkflowStoreError::duplicate("response", response.id()));
            }
            Some(RecordWrite::Update(response)) if !self.responses.contains_key(&response.id()) => {
                return Err(WorkflowStoreError::not_found("response", response.id()));
            }
            _ => {}
        }
        match commit.review() {
            Some(RecordWrite::Insert(review)) if self.reviews.contains_key(&review.id()) => {
                return Err(WorkflowStoreError::duplicate("review", review.id()));
            }
            Some(RecordWrite::Update(review)) if !self.reviews.contains_key(&review.id()) => {
                return Err(WorkflowStoreError::not_found("review", review.id()));
            }
            _ => {}
        }
        if let Some(final_approval) = commit.final_approval()
            && self.finals.contains_key(&final_approval.id())
        {
            return Err(WorkflowStoreError::duplicate("final", final_approval.id()));
        }
        Ok(())
    }

    fn apply_commit(&mut self, commit: &TransitionCommit) {
        let task = commit.task();
        let task_id = task.id();

        if let Some(write) = commit.response() {
            let response = write.record();
            if matches!(write, RecordWrite::Insert(_)) {
                self.responses_by_task
                    .entry(task_id)
                    .or_default()
                    .push(response.id());
            }
            self.responses.insert(response.id(), response.clone());
        }
        if let Some(write) = commit.review() {
            let review = write.record();
            if matches!(write, RecordWrite::Insert(_)) {
                self.reviews_by_task
                    .entry(task_id)
                    .or_default()
                    .push(review.id());
            }
            self.reviews.insert(review.id(), review.clone());
        }
        if let Some(final_approval) = commit.final_approval() {
            self.finals_by_task
                .entry(task_id)
                .or_default()
                .push(final_approval.id());
            self.finals
                .insert(final_approval.id(), final_approval.clone());
        }

        let receipt = commit.receipt();
        self.receipts.insert(
            (receipt.task_id(), receipt.idempotency_key().clone()),
            receipt.clone(),
        );
        self.tasks.insert(task_id, task.clone());
    }
}

fn collect_by_ids<K, V>(ids: Option<&Vec<K>>, records: &HashMap<K, V>) -> Vec<V>
where
    K: std::hash::Hash + Eq,
    V: Clone,
{
    ids.map(|list| {
        list.iter()
            .filter_map(|id| records.get(id).cloned())
            .collect()
    })
    .unwrap_or_default()
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn store_project(&self, project: &Project) -> WorkflowStoreResult<()> {
        let mut state = self.write()?;
        if state.projects.contains_key(&project.id()) {
            return Err(WorkflowStoreError::duplicate("project", project.id()));
        }
        state.projects.insert(project.id(), project.clone());
        Ok(())
    }

    async fn find_project(&self, id: ProjectId) -> WorkflowStoreResult<Option<Project>> {
        Ok(self.read()?.projects.get(&id).cloned())
    }

    async fn insert_task(&self, task: &Task) -> WorkflowStoreResult<()> {
        let mut state = self.write()?;
        if state.tasks.contains_key(&task.id()) {
            return Err(WorkflowStoreError::duplicate("task", task.id()));
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn find_task(&self, id: TaskId) -> WorkflowStoreResult<Option<Task>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    async fn find_response(&self, id: ResponseId) -> WorkflowStoreResult<Option<Response>> {
        Ok(self.read()?.responses.get(&id).cloned())
    }

    async fn find_review(&self, id: ReviewId) -> WorkflowStoreResult<Option<Review>> {
        Ok(self.read()?.reviews.get(&id).cloned())
    }

    async fn find_final(&self, id: FinalId) -> WorkflowStoreResult<Option<FinalApproval>> {
        Ok(self.read()?.finals.get(&id).cloned())
    }

    async fn load_snapshot(&self, task_id: TaskId) -> WorkflowStoreResult<Option<TaskSnapshot>> {
        Ok(self.read()?.snapshot(task_id))
    }

    async fn find_receipt(
        &self,
        task_id: TaskId,
        key: &IdempotencyKey,
    ) -> WorkflowStoreResult<Option<TransitionReceipt>> {
        Ok(self.read()?.receipts.get(&(task_id, key.clone())).cloned())
    }

    async fn commit(&self, commit: &TransitionCommit) -> WorkflowStoreResult<()> {
        let mut state = self.write()?;
        state.check_commit(commit)?;
        state.apply_commit(commit);
        Ok(())
    }

    async fn tasks_with_status(&self, status: Status) -> WorkflowStoreResult<Vec<Task>> {
        Ok(self.read()?.ordered_tasks(|task| task.status() == status))
    }

    async fn responses_with_status(&self, status: Status) -> WorkflowStoreResult<Vec<Response>> {
        Ok(self.read()?.responses_in(status))
    }

    async fn reviews_with_status(&self, status: Status) -> WorkflowStoreResult<Vec<Review>> {
        Ok(self.read()?.reviews_in(status))
    }

    async fn finals_with_status(
        &self,
        status: FinalStatus,
    ) -> WorkflowStoreResult<Vec<FinalApproval>> {
        Ok(self.read()?.finals_in(status))
    }

    async fn tasks_for_project(&self, project_id: ProjectId) -> WorkflowStoreResult<Vec<Task>> {
        Ok(self
            .read()?
            .ordered_tasks(|task| task.project_id() == project_id))
    }

    async fn tasks_for_assignee(&self, user: &UserId) -> WorkflowStoreResult<Vec<Task>> {
        Ok(self.read()?.ordered_tasks(|task| task.is_assigned_to(user)))
    }

    async fn responses_for_task(&self, task_id: TaskId) -> WorkflowStoreResult<Vec<Response>> {
        let state = self.read()?;
        Ok(collect_by_ids(
            state.responses_by_task.get(&task_id),
            &state.responses,
        ))
    }

    async fn reviews_for_task(&self, task_id: TaskId) -> WorkflowStoreResult<Vec<Review>> {
        let state = self.read()?;
        Ok(collect_by_ids(
            state.reviews_by_task.get(&task_id),
            &state.reviews,
        ))
    }

    async fn finals_for_task(&self, task_id: TaskId) -> WorkflowStoreResult<Vec<FinalApproval>> {
        let state = self.read()?;
        Ok(collect_by_ids(state.finals_by_task.get(&task_id), &state.finals))
    }
}
