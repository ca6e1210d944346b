//! Consistent views of a task and its active dependent records.

use super::{FinalApproval, FinalStatus, Response, Review, Status, Task, WorkflowDomainError};
use serde::{Deserialize, Serialize};

/// A task together with its active response, review and final record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    task: Task,
    response: Option<Response>,
    review: Option<Review>,
    final_approval: Option<FinalApproval>,
}

impl TaskSnapshot {
    /// Assembles a snapshot from records read in one consistent read.
    #[must_use]
    pub const fn new(
        task: Task,
        response: Option<Response>,
        review: Option<Review>,
        final_approval: Option<FinalApproval>,
    ) -> Self {
        Self {
            task,
            response,
            review,
            final_approval,
        }
    }

    /// Returns the task.
    #[must_use]
    pub const fn task(&self) -> &Task {
        &self.task
    }

    /// Returns the active response, if any.
    #[must_use]
    pub const fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    /// Returns the active review, if any.
    #[must_use]
    pub const fn review(&self) -> Option<&Review> {
        self.review.as_ref()
    }

    /// Returns the approving final record, if any.
    #[must_use]
    pub const fn final_approval(&self) -> Option<&FinalApproval> {
        self.final_approval.as_ref()
    }

    /// Splits the snapshot into its records.
    #[must_use]
    pub fn into_parts(
        self,
    ) -> (
        Task,
        Option<Response>,
        Option<Review>,
        Option<FinalApproval>,
    ) {
        (self.task, self.response, self.review, self.final_approval)
    }

    /// Verifies that the task status and the active record statuses agree
    /// with the pipeline transition table, and that the records chain to
    /// each other and to the task's links.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::InconsistentSnapshot`] naming the first
    /// violated relation.
    pub fn check_consistency(&self) -> Result<(), WorkflowDomainError> {
        let task_id = self.task.id();
        let fail = |reason: String| Err(WorkflowDomainError::inconsistent(task_id, reason));

        let expected = expected_statuses(self.task.status());
        let Some((response_status, review_status, final_status)) = expected else {
            return fail(format!("task status {} is unreachable", self.task.status()));
        };

        let actual_response = self.response.as_ref().map(Response::status);
        if actual_response != response_status {
            return fail(format!(
                "task is {} but response is {}",
                self.task.status(),
                describe(actual_response.map(Status::as_str)),
            ));
        }
        let actual_review = self.review.as_ref().map(Review::status);
        if actual_review != review_status {
            return fail(format!(
                "task is {} but review is {}",
                self.task.status(),
                describe(actual_review.map(Status::as_str)),
            ));
        }
        let actual_final = self.final_approval.as_ref().map(FinalApproval::status);
        if actual_final != final_status {
            return fail(format!(
                "task is {} but final record is {}",
                self.task.status(),
                describe(actual_final.map(FinalStatus::as_str)),
            ));
        }

        self.check_links()
    }

    fn check_links(&self) -> Result<(), WorkflowDomainError> {
        let task_id = self.task.id();
        let links = self.task.links();
        let fail = |reason: &str| Err(WorkflowDomainError::inconsistent(task_id, reason));

        if links.active_response_id != self.response.as_ref().map(Response::id) {
            return fail("active response link does not match the loaded response");
        }
        if links.active_review_id != self.review.as_ref().map(Review::id) {
            return fail("active review link does not match the loaded review");
        }
        if links.final_id != self.final_approval.as_ref().map(FinalApproval::id) {
            return fail("final link does not match the loaded final record");
        }
        if self
            .response
            .as_ref()
            .is_some_and(|response| response.task_id() != task_id)
        {
            return fail("response belongs to another task");
        }
        if let (Some(review), Some(response)) = (&self.review, &self.response)
            && review.response_id() != response.id()
        {
            return fail("review does not reference the active response");
        }
        if let (Some(final_approval), Some(review)) = (&self.final_approval, &self.review)
            && final_approval.review_id() != review.id()
        {
            return fail("final record does not reference the active review");
        }
        Ok(())
    }
}

type ExpectedStatuses = (Option<Status>, Option<Status>, Option<FinalStatus>);

/// Active record statuses implied by a task status, or `None` when a task
/// can never hold that status.
const fn expected_statuses(task_status: Status) -> Option<ExpectedStatuses> {
    match task_status {
        Status::Pending | Status::InProgress => Some((None, None, None)),
        Status::Review => Some((Some(Status::Review), None, None)),
        Status::FinalReview => Some((Some(Status::FinalReview), Some(Status::FinalReview), None)),
        Status::Closed => Some((
            Some(Status::Closed),
            Some(Status::Closed),
            Some(FinalStatus::Approved),
        )),
        Status::Rejected => None,
    }
}

fn describe(status: Option<&str>) -> &str {
    status.unwrap_or("absent")
}

/// Every record ever written against a task, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskHistory {
    /// The task as currently stored.
    pub task: Task,
    /// All responses, including rejected ones.
    pub responses: Vec<Response>,
    /// All reviews, including rejected ones.
    pub reviews: Vec<Review>,
    /// All final-approval records, approving or rejecting.
    pub finals: Vec<FinalApproval>,
}
