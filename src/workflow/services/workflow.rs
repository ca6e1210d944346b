//! Boundary operations for each pipeline role.
//!
//! The service resolves the records a caller names, builds the matching
//! [`TransitionRequest`] and hands it to the [`TransitionCoordinator`]. It
//! never writes a status itself.

use super::{
    coordinator::{TransitionCoordinator, TransitionOutcome},
    error::{ParentRef, WorkflowError, WorkflowResult},
    queries::QueryViews,
};
use crate::config::WorkflowConfig;
use crate::workflow::{
    domain::{
        ActionPayload, Actor, ActorRole, FinalApproval, IdempotencyKey, Project, ProjectId,
        Response, ResponseId, Review, ReviewId, StringList, Task, TaskId, TaskSnapshot,
        TransitionRequest, UserId,
    },
    ports::{WorkflowStore, WorkflowStoreError},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use tracing::{info, instrument};

/// Verdict carried by a review or final-approval submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    /// Accept the judged record.
    Approve,
    /// Send the judged record back.
    Reject,
}

/// Request payload for creating a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProjectRequest {
    title: String,
    created_by: Actor,
}

impl CreateProjectRequest {
    /// Creates a request for a project titled `title`.
    #[must_use]
    pub fn new(title: impl Into<String>, created_by: Actor) -> Self {
        Self {
            title: title.into(),
            created_by,
        }
    }
}

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    project_id: ProjectId,
    title: String,
    description: Option<String>,
    due_date: Option<DateTime<Utc>>,
    assignees: StringList,
    created_by: Actor,
}

impl CreateTaskRequest {
    /// Creates a request with required task fields.
    #[must_use]
    pub fn new(
        project_id: ProjectId,
        title: impl Into<String>,
        assignees: StringList,
        created_by: Actor,
    ) -> Self {
        Self {
            project_id,
            title: title.into(),
            description: None,
            due_date: None,
            assignees,
            created_by,
        }
    }

    /// Sets the task description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the task due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

/// Request payload for an assignee's response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResponseRequest {
    task_id: TaskId,
    responded_by: UserId,
    comments: String,
    attachments: StringList,
    idempotency_key: Option<IdempotencyKey>,
}

impl SubmitResponseRequest {
    /// Creates a response submission without attachments.
    #[must_use]
    pub fn new(task_id: TaskId, responded_by: UserId, comments: impl Into<String>) -> Self {
        Self {
            task_id,
            responded_by,
            comments: comments.into(),
            attachments: StringList::empty(),
            idempotency_key: None,
        }
    }

    /// Sets the attachment references.
    #[must_use]
    pub fn with_attachments(mut self, attachments: StringList) -> Self {
        self.attachments = attachments;
        self
    }

    /// Sets the idempotency key guarding retries.
    #[must_use]
    pub fn with_idempotency_key(mut self, key: IdempotencyKey) -> Self {
        self.idempotency_key = Some(key);
        self
    }
}

/// Request payload for a reviewer's decision on a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReviewRequest {
    response_id: ResponseId,
    reviewed_by: UserId,
    decision: ReviewDecision,
    comments: String,
    idempotency_key: Option<IdempotencyKey>,
}

impl SubmitReviewRequest {
    /// Creates a review submission.
    #[must_use]
    pub fn new(
        response_id: ResponseId,
        reviewed_by: UserId,
        decision: ReviewDecision,
        comments: impl Into<String>,
    ) -> Self {
        Self {
            response_id,
            reviewed_by,
            decision,
            comments: comments.into(),
            idempotency_key: None,
        }
    }

    /// Sets the idempotency key guarding retries.
    #[must_use]
    pub fn with_idempotency_key(mut self, key: IdempotencyKey) -> Self {
        self.idempotency_key = Some(key);
        self
    }
}

/// Request payload for a final approver's verdict on a review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitFinalRequest {
    review_id: ReviewId,
    approved_by: UserId,
    decision: ReviewDecision,
    comments: String,
    idempotency_key: Option<IdempotencyKey>,
}

impl SubmitFinalRequest {
    /// Creates a final-approval submission.
    #[must_use]
    pub fn new(
        review_id: ReviewId,
        approved_by: UserId,
        decision: ReviewDecision,
        comments: impl Into<String>,
    ) -> Self {
        Self {
            review_id,
            approved_by,
            decision,
            comments: comments.into(),
            idempotency_key: None,
        }
    }

    /// Sets the idempotency key guarding retries.
    #[must_use]
    pub fn with_idempotency_key(mut self, key: IdempotencyKey) -> Self {
        self.idempotency_key = Some(key);
        self
    }
}

/// Workflow boundary service.
pub struct WorkflowService<S, C>
where
    S: WorkflowStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    coordinator: TransitionCoordinator<S, C>,
}

impl<S, C> Clone for WorkflowService<S, C>
where
    S: WorkflowStore,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            coordinator: self.coordinator.clone(),
        }
    }
}

impl<S, C> WorkflowService<S, C>
where
    S: WorkflowStore,
    C: Clock + Send + Sync,
{
    /// Creates a service and its coordinator over `store`.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>, config: WorkflowConfig) -> Self {
        let coordinator = TransitionCoordinator::new(Arc::clone(&store), Arc::clone(&clock), config);
        Self {
            store,
            clock,
            coordinator,
        }
    }

    /// Returns the coordinator behind this service.
    #[must_use]
    pub const fn coordinator(&self) -> &TransitionCoordinator<S, C> {
        &self.coordinator
    }

    /// Returns dashboard views over the same store.
    #[must_use]
    pub fn queries(&self) -> QueryViews<S> {
        QueryViews::new(Arc::clone(&self.store))
    }

    /// Creates a project.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Forbidden`] unless the caller has the
    /// technical role, [`WorkflowError::Validation`] for a blank title and
    /// [`WorkflowError::StorageFailure`] when the store fails.
    pub async fn create_project(&self, request: CreateProjectRequest) -> WorkflowResult<Project> {
        require_technical("create_project", &request.created_by)?;
        let project = Project::new(
            request.title,
            request.created_by.id().clone(),
            &*self.clock,
        )?;
        self.store.store_project(&project).await?;
        info!(project_id = %project.id(), "project created");
        Ok(project)
    }

    /// Creates a pending task in an existing project.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidParent`] when the project does not
    /// exist, [`WorkflowError::Forbidden`] unless the caller has the
    /// technical role, [`WorkflowError::Validation`] for a blank title or no
    /// assignees and [`WorkflowError::StorageFailure`] when the store fails.
    #[instrument(skip(self, request), fields(project_id = %request.project_id))]
    pub async fn create_task(&self, request: CreateTaskRequest) -> WorkflowResult<Task> {
        require_technical("create_task", &request.created_by)?;
        if self.store.find_project(request.project_id).await?.is_none() {
            return Err(WorkflowError::InvalidParent(ParentRef::Project(
                request.project_id,
            )));
        }

        let mut task = Task::new(
            request.project_id,
            request.title,
            request.assignees,
            request.created_by.id().clone(),
            &*self.clock,
        )?;
        if let Some(description) = request.description {
            task = task.with_description(description);
        }
        if let Some(due_date) = request.due_date {
            task = task.with_due_date(due_date);
        }
        self.store.insert_task(&task).await?;
        info!(task_id = %task.id(), "task created");
        Ok(task)
    }

    /// Moves a pending task into progress.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`TransitionCoordinator::apply_transition`].
    pub async fn start_work(
        &self,
        task_id: TaskId,
        assignee: UserId,
        idempotency_key: Option<IdempotencyKey>,
    ) -> WorkflowResult<TaskSnapshot> {
        let request = with_key(
            TransitionRequest::new(task_id, Actor::assignee(assignee), ActionPayload::StartWork),
            idempotency_key,
        );
        let outcome = self.coordinator.apply_transition(request).await?;
        Ok(outcome.into_snapshot())
    }

    /// Records an assignee's response and moves the task into review.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::AlreadySubmitted`] when another response is
    /// already under review, plus the errors of
    /// [`TransitionCoordinator::apply_transition`].
    pub async fn submit_response(&self, request: SubmitResponseRequest) -> WorkflowResult<Response> {
        let SubmitResponseRequest {
            task_id,
            responded_by,
            comments,
            attachments,
            idempotency_key,
        } = request;
        let transition = with_key(
            TransitionRequest::new(
                task_id,
                Actor::assignee(responded_by),
                ActionPayload::SubmitResponse {
                    comments,
                    attachments,
                },
            ),
            idempotency_key,
        );
        let outcome = self.coordinator.apply_transition(transition).await?;
        let id = written(outcome.receipt().outcome().response_id, "response")?;
        self.store
            .find_response(id)
            .await?
            .ok_or_else(|| WorkflowError::StorageFailure(WorkflowStoreError::not_found("response", id)))
    }

    /// Records a reviewer's decision on a response.
    ///
    /// Rejecting requires non-empty comments.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidParent`] when the response does not
    /// exist, plus the errors of [`TransitionCoordinator::apply_transition`].
    pub async fn submit_review(&self, request: SubmitReviewRequest) -> WorkflowResult<Review> {
        let SubmitReviewRequest {
            response_id,
            reviewed_by,
            decision,
            comments,
            idempotency_key,
        } = request;
        let response = self
            .store
            .find_response(response_id)
            .await?
            .ok_or(WorkflowError::InvalidParent(ParentRef::Response(response_id)))?;
        let judged = Some(response.id());
        let payload = match decision {
            ReviewDecision::Approve => ActionPayload::ApproveResponse {
                response_id: judged,
                comments,
            },
            ReviewDecision::Reject => ActionPayload::RejectResponse {
                response_id: judged,
                comments,
            },
        };
        let transition = with_key(
            TransitionRequest::new(response.task_id(), Actor::reviewer(reviewed_by), payload),
            idempotency_key,
        );
        let outcome = self.coordinator.apply_transition(transition).await?;
        let id = written(outcome.receipt().outcome().review_id, "review")?;
        self.store
            .find_review(id)
            .await?
            .ok_or_else(|| WorkflowError::StorageFailure(WorkflowStoreError::not_found("review", id)))
    }

    /// Records a final approver's verdict on a review.
    ///
    /// Rejecting requires non-empty comments.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidParent`] when the review does not
    /// exist, plus the errors of [`TransitionCoordinator::apply_transition`].
    pub async fn submit_final(&self, request: SubmitFinalRequest) -> WorkflowResult<FinalApproval> {
        let SubmitFinalRequest {
            review_id,
            approved_by,
            decision,
            comments,
            idempotency_key,
        } = request;
        let review = self
            .store
            .find_review(review_id)
            .await?
            .ok_or(WorkflowError::InvalidParent(ParentRef::Review(review_id)))?;
        let judged = Some(review.id());
        let payload = match decision {
            ReviewDecision::Approve => ActionPayload::ApproveFinal {
                review_id: judged,
                comments,
            },
            ReviewDecision::Reject => ActionPayload::RejectFinal {
                review_id: judged,
                comments,
            },
        };
        let transition = with_key(
            TransitionRequest::new(review.task_id(), Actor::final_approver(approved_by), payload),
            idempotency_key,
        );
        let outcome = self.coordinator.apply_transition(transition).await?;
        let id = written(outcome.receipt().outcome().final_id, "final")?;
        self.store
            .find_final(id)
            .await?
            .ok_or_else(|| WorkflowError::StorageFailure(WorkflowStoreError::not_found("final", id)))
    }

    /// Returns the task with its active records. Never writes.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidParent`] when the task does not exist
    /// and [`WorkflowError::StorageFailure`] when the store fails.
    pub async fn get_snapshot(&self, task_id: TaskId) -> WorkflowResult<TaskSnapshot> {
        self.queries().snapshot(task_id).await
    }

    /// Applies an already-built transition request.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`TransitionCoordinator::apply_transition`].
    pub async fn apply(&self, request: TransitionRequest) -> WorkflowResult<TransitionOutcome> {
        self.coordinator.apply_transition(request).await
    }
}

fn require_technical(operation: &'static str, actor: &Actor) -> WorkflowResult<()> {
    if actor.role() == ActorRole::Technical {
        return Ok(());
    }
    Err(WorkflowError::Forbidden {
        operation,
        reason: format!("the {} role may not perform it", actor.role()),
    })
}

fn with_key(request: TransitionRequest, key: Option<IdempotencyKey>) -> TransitionRequest {
    let Some(supplied) = key else {
        return request;
    };
    request.with_idempotency_key(supplied)
}

fn written<T>(id: Option<T>, kind: &'static str) -> WorkflowResult<T> {
    id.ok_or_else(|| {
        WorkflowError::StorageFailure(WorkflowStoreError::not_found(kind, "transition receipt"))
    })
}
