//! Project records that own tasks.

use super::{ProjectId, UserId, WorkflowDomainError};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// A project created by the sales role; parent of every task.
///
/// Project attributes beyond the title are managed outside the workflow
/// engine, which only needs to know that a project exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    id: ProjectId,
    title: String,
    created_by: UserId,
    created_at: DateTime<Utc>,
}

impl Project {
    /// Creates a new project.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::EmptyTitle`] when the title is blank.
    pub fn new(
        title: impl Into<String>,
        created_by: UserId,
        clock: &impl Clock,
    ) -> Result<Self, WorkflowDomainError> {
        let raw = title.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(WorkflowDomainError::EmptyTitle);
        }
        Ok(Self {
            id: ProjectId::new(),
            title: trimmed.to_owned(),
            created_by,
            created_at: clock.utc(),
        })
    }

    /// Reconstructs a project from persisted storage.
    #[must_use]
    pub const fn from_persisted(
        id: ProjectId,
        title: String,
        created_by: UserId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            created_by,
            created_at,
        }
    }

    /// Returns the project identifier.
    #[must_use]
    pub const fn id(&self) -> ProjectId {
        self.id
    }

    /// Returns the project title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the user who created the project.
    #[must_use]
    pub const fn created_by(&self) -> &UserId {
        &self.created_by
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
