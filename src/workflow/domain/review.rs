//! Reviewer verdicts on responses.

use super::{ProjectId, Response, ResponseId, ReviewId, Status, TaskId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The reviewer's verdict on a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    id: ReviewId,
    response_id: ResponseId,
    task_id: TaskId,
    project_id: ProjectId,
    comments: String,
    reviewed_by: UserId,
    reviewed_at: DateTime<Utc>,
    status: Status,
}

/// Parameter object for reconstructing a persisted review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedReviewData {
    /// Persisted review identifier.
    pub id: ReviewId,
    /// Reviewed response.
    pub response_id: ResponseId,
    /// Task the response answers.
    pub task_id: TaskId,
    /// Project owning the task.
    pub project_id: ProjectId,
    /// Reviewer comments.
    pub comments: String,
    /// Reviewing user.
    pub reviewed_by: UserId,
    /// Review timestamp.
    pub reviewed_at: DateTime<Utc>,
    /// Persisted status.
    pub status: Status,
}

impl Review {
    pub(crate) fn record(
        response: &Response,
        reviewed_by: UserId,
        comments: String,
        status: Status,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ReviewId::new(),
            response_id: response.id(),
            task_id: response.task_id(),
            project_id: response.project_id(),
            comments,
            reviewed_by,
            reviewed_at: at,
            status,
        }
    }

    /// Reconstructs a review from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedReviewData) -> Self {
        Self {
            id: data.id,
            response_id: data.response_id,
            task_id: data.task_id,
            project_id: data.project_id,
            comments: data.comments,
            reviewed_by: data.reviewed_by,
            reviewed_at: data.reviewed_at,
            status: data.status,
        }
    }

    /// Returns the review identifier.
    #[must_use]
    pub const fn id(&self) -> ReviewId {
        self.id
    }

    /// Returns the reviewed response identifier.
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

    /// Returns the reviewer comments.
    #[must_use]
    pub fn comments(&self) -> &str {
        &self.comments
    }

    /// Returns the reviewing user.
    #[must_use]
    pub const fn reviewed_by(&self) -> &UserId {
        &self.reviewed_by
    }

    /// Returns the review timestamp.
    #[must_use]
    pub const fn reviewed_at(&self) -> DateTime<Utc> {
        self.reviewed_at
    }

    /// Returns the review status.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    pub(crate) const fn set_status(&mut self, status: Status) {
        self.status = status;
    }
}
