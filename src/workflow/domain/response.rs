//! Assignee responses to a task.

use super::{ProjectId, ResponseId, Status, StringList, Task, TaskId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An assignee's submitted answer to a task.
///
/// A rejected response is never edited back into play: the assignee submits
/// a new response, and the rejected one remains readable as history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    id: ResponseId,
    task_id: TaskId,
    project_id: ProjectId,
    comments: String,
    attachments: StringList,
    responded_by: UserId,
    responded_at: DateTime<Utc>,
    status: Status,
}

/// Parameter object for reconstructing a persisted response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedResponseData {
    /// Persisted response identifier.
    pub id: ResponseId,
    /// Task the response answers.
    pub task_id: TaskId,
    /// Project owning the task.
    pub project_id: ProjectId,
    /// Free-form comments.
    pub comments: String,
    /// Attachment references.
    pub attachments: StringList,
    /// Responding assignee.
    pub responded_by: UserId,
    /// Submission timestamp.
    pub responded_at: DateTime<Utc>,
    /// Persisted status.
    pub status: Status,
}

impl Response {
    pub(crate) fn submit(
        task: &Task,
        responded_by: UserId,
        comments: String,
        attachments: StringList,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ResponseId::new(),
            task_id: task.id(),
            project_id: task.project_id(),
            comments,
            attachments,
            responded_by,
            responded_at: at,
            status: Status::Review,
        }
    }

    /// Reconstructs a response from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedResponseData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            project_id: data.project_id,
            comments: data.comments,
            attachments: data.attachments,
            responded_by: data.responded_by,
            responded_at: data.responded_at,
            status: data.status,
        }
    }

    /// Returns the response identifier.
    #[must_use]
    pub const fn id(&self) -> ResponseId {
        self.id
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

    /// Returns the response comments.
    #[must_use]
    pub fn comments(&self) -> &str {
        &self.comments
    }

    /// Returns the attachment references.
    #[must_use]
    pub const fn attachments(&self) -> &StringList {
        &self.attachments
    }

    /// Returns the responding assignee.
    #[must_use]
    pub const fn responded_by(&self) -> &UserId {
        &self.responded_by
    }

    /// Returns the submission timestamp.
    #[must_use]
    pub const fn responded_at(&self) -> DateTime<Utc> {
        self.responded_at
    }

    /// Returns the response status.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    pub(crate) const fn set_status(&mut self, status: Status) {
        self.status = status;
    }
}
