//! Final-approval records; immutable once written.

use super::{FinalId, FinalStatus, ProjectId, ResponseId, Review, ReviewId, TaskId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The final approver's verdict on a review. Terminal record of a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalApproval {
    id: FinalId,
    review_id: ReviewId,
    response_id: ResponseId,
    task_id: TaskId,
    project_id: ProjectId,
    comments: String,
    approved_by: UserId,
    approved_at: DateTime<Utc>,
    status: FinalStatus,
}

/// Parameter object for reconstructing a persisted final-approval record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedFinalData {
    /// Persisted record identifier.
    pub id: FinalId,
    /// Judged review.
    pub review_id: ReviewId,
    /// Response the review judged.
    pub response_id: ResponseId,
    /// Task of the response.
    pub task_id: TaskId,
    /// Project owning the task.
    pub project_id: ProjectId,
    /// Final approver comments.
    pub comments: String,
    /// Final approver.
    pub approved_by: UserId,
    /// Verdict timestamp.
    pub approved_at: DateTime<Utc>,
    /// Verdict.
    pub status: FinalStatus,
}

impl FinalApproval {
    pub(crate) fn record(
        review: &Review,
        approved_by: UserId,
        comments: String,
        status: FinalStatus,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: FinalId::new(),
            review_id: review.id(),
            response_id: review.response_id(),
            task_id: review.task_id(),
            project_id: review.project_id(),
            comments,
            approved_by,
            approved_at: at,
            status,
        }
    }

    /// Reconstructs a final-approval record from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedFinalData) -> Self {
        Self {
            id: data.id,
            review_id: data.review_id,
            response_id: data.response_id,
            task_id: data.task_id,
            project_id: data.project_id,
            comments: data.comments,
            approved_by: data.approved_by,
            approved_at: data.approved_at,
            status: data.status,
        }
    }

    /// Returns the record identifier.
    #[must_use]
    pub const fn id(&self) -> FinalId {
        self.id
    }

    /// Returns the judged review identifier.
    #[must_use]
    pub const fn review_id(&self) -> ReviewId {
        self.review_id
    }

    /// Returns the response identifier.
    #[must_use]
    pub const fn response_id(&self) -> ResponseId {
        self.response_id
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the project identifier.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the final approver comments.
    #[must_use]
    pub fn comments(&self) -> &str {
        &self.comments
    }

    /// Returns the final approver.
    #[must_use]
    pub const fn approved_by(&self) -> &UserId {
        &self.approved_by
    }

    /// Returns the verdict timestamp.
    #[must_use]
    pub const fn approved_at(&self) -> DateTime<Utc> {
        self.approved_at
    }

    /// Returns the verdict.
    #[must_use]
    pub const fn status(&self) -> FinalStatus {
        self.status
    }
}
