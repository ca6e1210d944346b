//! State machine core of the approval pipeline.
//!
//! [`decide`] maps a task snapshot and a requested action to a verdict
//! without performing any I/O. The task status is canonical; every other
//! status follows from this table:
//!
//! | From           | Action          | To             | Response     | Review               | Final              |
//! |----------------|-----------------|----------------|--------------|----------------------|--------------------|
//! | `pending`      | startWork       | `in-progress`  |              |                      |                    |
//! | `pending`, `in-progress` | submitResponse | `review` | `review` (new) |                 |                    |
//! | `review`       | approveResponse | `final-review` | `final-review` | `final-review` (new) |                  |
//! | `review`       | rejectResponse  | `in-progress`  | `rejected`   | `rejected` (new)     |                    |
//! | `final-review` | approveFinal    | `closed`       | `closed`     | `closed`             | `approved` (new)   |
//! | `final-review` | rejectFinal     | `review`       | `review`     | `rejected`           | `rejected` (new)   |

use super::{
    Action, ActionPayload, Actor, FinalStatus, ResponseId, ReviewId, Status, Task, TaskSnapshot,
    TransitionReceipt, TransitionRejection, TransitionRequest, WorkflowDomainError,
};

/// What a transition does to one dependent record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordChange {
    /// Write a new record with the given status.
    Create(Status),
    /// Move the existing active record to the given status.
    Update(Status),
}

impl RecordChange {
    /// Returns the status the record ends up in.
    #[must_use]
    pub const fn status(self) -> Status {
        match self {
            Self::Create(status) | Self::Update(status) => status,
        }
    }
}

/// Accepted transition, expressed as status changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionPlan {
    action: Action,
    from: Status,
    to: Status,
    response: Option<RecordChange>,
    review: Option<RecordChange>,
    final_approval: Option<FinalStatus>,
}

impl TransitionPlan {
    /// Returns the applied action.
    #[must_use]
    pub const fn action(&self) -> Action {
        self.action
    }

    /// Returns the task status before the transition.
    #[must_use]
    pub const fn from(&self) -> Status {
        self.from
    }

    /// Returns the task status after the transition.
    #[must_use]
    pub const fn to(&self) -> Status {
        self.to
    }

    /// Returns the change to the active response, if any.
    #[must_use]
    pub const fn response(&self) -> Option<RecordChange> {
        self.response
    }

    /// Returns the change to the active review, if any.
    #[must_use]
    pub const fn review(&self) -> Option<RecordChange> {
        self.review
    }

    /// Returns the verdict of the final record to create, if any.
    #[must_use]
    pub const fn final_approval(&self) -> Option<FinalStatus> {
        self.final_approval
    }
}

/// Outcome of [`decide`] for a legal request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Apply the plan.
    Apply(TransitionPlan),
    /// The request was already applied; answer with the prior result.
    Replay(TransitionReceipt),
}

/// Decides whether `request` may move the task in `snapshot`, and how.
///
/// `prior` is the receipt already stored under the request's idempotency
/// key for this task, if any.
///
/// # Errors
///
/// Returns a [`TransitionRejection`] describing why the request is refused.
/// A refused request must leave every record untouched.
pub fn decide(
    snapshot: &TaskSnapshot,
    request: &TransitionRequest,
    prior: Option<&TransitionReceipt>,
) -> Result<Verdict, TransitionRejection> {
    let task = snapshot.task();
    let action = request.action();
    let actor = request.actor();
    // Receipts record the actor id only, so the role gate runs before replay.
    if actor.role() != action.required_role() {
        return Err(TransitionRejection::RoleNotPermitted {
            role: actor.role(),
            action,
        });
    }

    if let Some(receipt) = prior {
        if receipt.matches(request) {
            return Ok(Verdict::Replay(receipt.clone()));
        }
        return Err(TransitionRejection::IdempotencyConflict {
            task_id: task.id(),
            key: request.idempotency_key().clone(),
        });
    }

    validate_payload(request.payload())?;

    let from = task.status();
    let invalid = || TransitionRejection::InvalidTransition {
        task_id: task.id(),
        from,
        action,
    };
    let plan = |to, response, review, final_approval| {
        Ok(Verdict::Apply(TransitionPlan {
            action,
            from,
            to,
            response,
            review,
            final_approval,
        }))
    };

    match request.payload() {
        ActionPayload::StartWork => {
            require_assignee(task, actor, action)?;
            match from {
                Status::Pending => plan(Status::InProgress, None, None, None),
                _ => Err(invalid()),
            }
        }
        ActionPayload::SubmitResponse { .. } => {
            require_assignee(task, actor, action)?;
            match from {
                Status::Pending | Status::InProgress => plan(
                    Status::Review,
                    Some(RecordChange::Create(Status::Review)),
                    None,
                    None,
                ),
                Status::Review | Status::FinalReview => {
                    Err(TransitionRejection::AlreadySubmitted(task.id()))
                }
                Status::Closed | Status::Rejected => Err(invalid()),
            }
        }
        ActionPayload::ApproveResponse { response_id, .. } => {
            if !response_under_review(snapshot, *response_id) {
                return Err(invalid());
            }
            plan(
                Status::FinalReview,
                Some(RecordChange::Update(Status::FinalReview)),
                Some(RecordChange::Create(Status::FinalReview)),
                None,
            )
        }
        ActionPayload::RejectResponse { response_id, .. } => {
            if !response_under_review(snapshot, *response_id) {
                return Err(invalid());
            }
            plan(
                Status::InProgress,
                Some(RecordChange::Update(Status::Rejected)),
                Some(RecordChange::Create(Status::Rejected)),
                None,
            )
        }
        ActionPayload::ApproveFinal { review_id, .. } => {
            if !review_awaiting_final(snapshot, *review_id) {
                return Err(invalid());
            }
            plan(
                Status::Closed,
                Some(RecordChange::Update(Status::Closed)),
                Some(RecordChange::Update(Status::Closed)),
                Some(FinalStatus::Approved),
            )
        }
        ActionPayload::RejectFinal { review_id, .. } => {
            if !review_awaiting_final(snapshot, *review_id) {
                return Err(invalid());
            }
            plan(
                Status::Review,
                Some(RecordChange::Update(Status::Review)),
                Some(RecordChange::Update(Status::Rejected)),
                Some(FinalStatus::Rejected),
            )
        }
    }
}

fn validate_payload(payload: &ActionPayload) -> Result<(), WorkflowDomainError> {
    match payload {
        ActionPayload::RejectResponse { comments, .. } | ActionPayload::RejectFinal { comments, .. }
            if comments.trim().is_empty() =>
        {
            Err(WorkflowDomainError::EmptyRejectionComments)
        }
        _ => Ok(()),
    }
}

fn require_assignee(task: &Task, actor: &Actor, action: Action) -> Result<(), TransitionRejection> {
    if task.is_assigned_to(actor.id()) {
        return Ok(());
    }
    Err(TransitionRejection::NotAssigned {
        task_id: task.id(),
        actor: actor.id().clone(),
        action,
    })
}

/// A review may only be recorded against the task's active response while
/// both the task and that response are in `review`.
fn response_under_review(snapshot: &TaskSnapshot, expected: Option<ResponseId>) -> bool {
    snapshot.task().status() == Status::Review
        && snapshot.response().is_some_and(|response| {
            response.status() == Status::Review && expected.is_none_or(|id| id == response.id())
        })
}

/// A final record may only be written against the active review while it is
/// in `final-review`.
fn review_awaiting_final(snapshot: &TaskSnapshot, expected: Option<ReviewId>) -> bool {
    snapshot.task().status() == Status::FinalReview
        && snapshot.review().is_some_and(|review| {
            review.status() == Status::FinalReview && expected.is_none_or(|id| id == review.id())
        })
}
