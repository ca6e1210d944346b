//! Materialisation of an accepted plan into the records a store must write.

use super::{
    ActionPayload, FinalApproval, FinalStatus, ReceiptOutcome, RecordChange, Response, Review,
    Status, StringList, Task, TaskLinks, TaskSnapshot, TransitionPlan, TransitionReceipt,
    TransitionRequest, WorkflowDomainError,
};
use chrono::{DateTime, Utc};

/// A dependent record to insert or to overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordWrite<T> {
    /// The record is new.
    Insert(T),
    /// The record exists; its status changed.
    Update(T),
}

impl<T> RecordWrite<T> {
    /// Returns the record to write.
    #[must_use]
    pub const fn record(&self) -> &T {
        match self {
            Self::Insert(record) | Self::Update(record) => record,
        }
    }
}

/// Every write one transition implies, to be applied all-or-nothing.
///
/// Only the transition coordinator can build a commit, so stores never see
/// a status change that the state machine did not accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionCommit {
    expected_version: u64,
    from: Status,
    task: Task,
    response: Option<RecordWrite<Response>>,
    review: Option<RecordWrite<Review>>,
    final_approval: Option<FinalApproval>,
    receipt: TransitionReceipt,
    resulting: TaskSnapshot,
}

impl TransitionCommit {
    /// Applies `plan` to `snapshot`, producing the records to persist.
    pub(crate) fn prepare(
        snapshot: &TaskSnapshot,
        request: &TransitionRequest,
        plan: TransitionPlan,
        at: DateTime<Utc>,
    ) -> Result<Self, WorkflowDomainError> {
        let task_id = snapshot.task().id();
        let missing = |what: &str| {
            WorkflowDomainError::inconsistent(
                task_id,
                format!("{} requires an active {what}", plan.action()),
            )
        };
        let actor_id = request.actor().id().clone();
        let comments = request.payload().comments().trim().to_owned();

        let response = match plan.response() {
            None => None,
            Some(RecordChange::Create(_)) => {
                let attachments = match request.payload() {
                    ActionPayload::SubmitResponse { attachments, .. } => attachments.clone(),
                    _ => StringList::empty(),
                };
                Some(RecordWrite::Insert(Response::submit(
                    snapshot.task(),
                    actor_id.clone(),
                    comments.clone(),
                    attachments,
                    at,
                )))
            }
            Some(RecordChange::Update(status)) => {
                let mut current = snapshot.response().cloned().ok_or_else(|| missing("response"))?;
                current.set_status(status);
                Some(RecordWrite::Update(current))
            }
        };
        let response_after = response
            .as_ref()
            .map(|write| write.record().clone())
            .or_else(|| snapshot.response().cloned());

        let review = match plan.review() {
            None => None,
            Some(RecordChange::Create(status)) => {
                let reviewed = response_after.as_ref().ok_or_else(|| missing("response"))?;
                Some(RecordWrite::Insert(Review::record(
                    reviewed,
                    actor_id.clone(),
                    comments.clone(),
                    status,
                    at,
                )))
            }
            Some(RecordChange::Update(status)) => {
                let mut current = snapshot.review().cloned().ok_or_else(|| missing("review"))?;
                current.set_status(status);
                Some(RecordWrite::Update(current))
            }
        };
        let review_after = review
            .as_ref()
            .map(|write| write.record().clone())
            .or_else(|| snapshot.review().cloned());

        let final_approval = match plan.final_approval() {
            None => None,
            Some(status) => {
                let judged = review_after.as_ref().ok_or_else(|| missing("review"))?;
                Some(FinalApproval::record(judged, actor_id, comments, status, at))
            }
        };
        let final_after = final_approval
            .clone()
            .or_else(|| snapshot.final_approval().cloned());

        let active_response = response_after.filter(|record| record.status() != Status::Rejected);
        let active_review = review_after.filter(|record| record.status() != Status::Rejected);
        let active_final = final_after.filter(|record| record.status() == FinalStatus::Approved);
        let links = TaskLinks {
            active_response_id: active_response.as_ref().map(Response::id),
            active_review_id: active_review.as_ref().map(Review::id),
            final_id: active_final.as_ref().map(FinalApproval::id),
        };

        let mut task = snapshot.task().clone();
        task.advance(plan.to(), links, at);

        let outcome = ReceiptOutcome {
            task_status: task.status(),
            task_version: task.version(),
            response_id: response.as_ref().map(|write| write.record().id()),
            review_id: review.as_ref().map(|write| write.record().id()),
            final_id: final_approval.as_ref().map(FinalApproval::id),
        };
        let receipt = TransitionReceipt::issue(request, outcome, at);
        let resulting = TaskSnapshot::new(task.clone(), active_response, active_review, active_final);
        resulting.check_consistency()?;

        Ok(Self {
            expected_version: snapshot.task().version(),
            from: plan.from(),
            task,
            response,
            review,
            final_approval,
            receipt,
            resulting,
        })
    }

    /// Returns the task version the store must still hold for the commit to
    /// apply.
    #[must_use]
    pub const fn expected_version(&self) -> u64 {
        self.expected_version
    }

    /// Returns the task status before the transition.
    #[must_use]
    pub const fn from(&self) -> Status {
        self.from
    }

    /// Returns the updated task.
    #[must_use]
    pub const fn task(&self) -> &Task {
        &self.task
    }

    /// Returns the response write, if any.
    #[must_use]
    pub const fn response(&self) -> Option<&RecordWrite<Response>> {
        self.response.as_ref()
    }

    /// Returns the review write, if any.
    #[must_use]
    pub const fn review(&self) -> Option<&RecordWrite<Review>> {
        self.review.as_ref()
    }

    /// Returns the final record to insert, if any.
    #[must_use]
    pub const fn final_approval(&self) -> Option<&FinalApproval> {
        self.final_approval.as_ref()
    }

    /// Returns the receipt to store alongside the records.
    #[must_use]
    pub const fn receipt(&self) -> &TransitionReceipt {
        &self.receipt
    }

    /// Returns the snapshot the task will have once the commit applies.
    #[must_use]
    pub const fn resulting_snapshot(&self) -> &TaskSnapshot {
        &self.resulting
    }
}
