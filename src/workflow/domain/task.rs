//! Task aggregate root and the links to its active dependent records.

use super::{
    FinalId, ProjectId, ResponseId, ReviewId, Status, StringList, TaskId, UserId,
    WorkflowDomainError,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Pointers from a task to its currently active dependent records.
///
/// Superseded records stay in storage as history; only the records named
/// here take part in the task's snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLinks {
    /// The active (non-rejected) response, if any.
    pub active_response_id: Option<ResponseId>,
    /// The active (non-rejected) review of the active response, if any.
    pub active_review_id: Option<ReviewId>,
    /// The approving final record once the task is closed.
    pub final_id: Option<FinalId>,
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    project_id: ProjectId,
    title: String,
    description: Option<String>,
    due_date: Option<DateTime<Utc>>,
    assignees: StringList,
    created_by: UserId,
    status: Status,
    links: TaskLinks,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Persisted title.
    pub title: String,
    /// Persisted description, if any.
    pub description: Option<String>,
    /// Persisted due date, if any.
    pub due_date: Option<DateTime<Utc>>,
    /// Persisted assignee set.
    pub assignees: StringList,
    /// User of the technical role who created the task.
    pub created_by: UserId,
    /// Persisted pipeline status.
    pub status: Status,
    /// Persisted active-record links.
    pub links: TaskLinks,
    /// Optimistic concurrency version.
    pub version: u64,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest transition timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new pending task in a project.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::EmptyTitle`] for a blank title and
    /// [`WorkflowDomainError::NoAssignees`] for an empty assignee set.
    pub fn new(
        project_id: ProjectId,
        title: impl Into<String>,
        assignees: StringList,
        created_by: UserId,
        clock: &impl Clock,
    ) -> Result<Self, WorkflowDomainError> {
        let raw_title = title.into();
        let trimmed = raw_title.trim();
        if trimmed.is_empty() {
            return Err(WorkflowDomainError::EmptyTitle);
        }
        if assignees.is_empty() {
            return Err(WorkflowDomainError::NoAssignees);
        }

        let timestamp = clock.utc();
        Ok(Self {
            id: TaskId::new(),
            project_id,
            title: trimmed.to_owned(),
            description: None,
            due_date: None,
            assignees,
            created_by,
            status: Status::Pending,
            links: TaskLinks::default(),
            version: 0,
            created_at: timestamp,
            updated_at: timestamp,
        })
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

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            project_id: data.project_id,
            title: data.title,
            description: data.description,
            due_date: data.due_date,
            assignees: data.assignees,
            created_by: data.created_by,
            status: data.status,
            links: data.links,
            version: data.version,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning project identifier.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the task title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the task description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the due date, if any.
    #[must_use]
    pub const fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    /// Returns the assignee set.
    #[must_use]
    pub const fn assignees(&self) -> &StringList {
        &self.assignees
    }

    /// Returns `true` when `user` is one of the task's assignees.
    #[must_use]
    pub fn is_assigned_to(&self, user: &UserId) -> bool {
        self.assignees.contains(user.as_str())
    }

    /// Returns the user who created the task.
    #[must_use]
    pub const fn created_by(&self) -> &UserId {
        &self.created_by
    }

    /// Returns the canonical pipeline status.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Returns the active-record links.
    #[must_use]
    pub const fn links(&self) -> TaskLinks {
        self.links
    }

    /// Returns the optimistic concurrency version.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest transition timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Moves the task to a new status and relinks its active records.
    ///
    /// Only the transition coordinator calls this, after the state machine
    /// has accepted the move.
    pub(crate) fn advance(&mut self, to: Status, links: TaskLinks, at: DateTime<Utc>) {
        self.status = to;
        self.links = links;
        self.version += 1;
        self.updated_at = at;
    }
}
