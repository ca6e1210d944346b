//! Diesel row models for workflow persistence.

use super::schema::{finals, projects, responses, reviews, tasks, transition_receipts};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Row for project records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = projects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProjectRow {
    /// Project identifier.
    pub id: uuid::Uuid,
    /// Project title.
    pub title: String,
    /// Creating user.
    pub created_by: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Row for task records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning project.
    pub project_id: uuid::Uuid,
    /// Task title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Assigned users.
    pub assignees: Vec<String>,
    /// Creating user.
    pub created_by: String,
    /// Canonical status.
    pub status: String,
    /// Response under review.
    pub active_response_id: Option<uuid::Uuid>,
    /// Review awaiting final approval.
    pub active_review_id: Option<uuid::Uuid>,
    /// Approving final record.
    pub final_id: Option<uuid::Uuid>,
    /// Optimistic concurrency version.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last transition timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Row for response records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = responses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ResponseRow {
    /// Response identifier.
    pub id: uuid::Uuid,
    /// Parent task.
    pub task_id: uuid::Uuid,
    /// Project of the parent task.
    pub project_id: uuid::Uuid,
    /// Submission comments.
    pub comments: String,
    /// Attachment references.
    pub attachments: Vec<String>,
    /// Submitting user.
    pub responded_by: String,
    /// Submission timestamp.
    pub responded_at: DateTime<Utc>,
    /// Derived status.
    pub status: String,
}

/// Row for review records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = reviews)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReviewRow {
    /// Review identifier.
    pub id: uuid::Uuid,
    /// Reviewed response.
    pub response_id: uuid::Uuid,
    /// Parent task.
    pub task_id: uuid::Uuid,
    /// Project of the parent task.
    pub project_id: uuid::Uuid,
    /// Reviewer comments.
    pub comments: String,
    /// Reviewing user.
    pub reviewed_by: String,
    /// Decision timestamp.
    pub reviewed_at: DateTime<Utc>,
    /// Derived status.
    pub status: String,
}

/// Row for final-approval records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = finals)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FinalRow {
    /// Final record identifier.
    pub id: uuid::Uuid,
    /// Judged review.
    pub review_id: uuid::Uuid,
    /// Response under the judged review.
    pub response_id: uuid::Uuid,
    /// Parent task.
    pub task_id: uuid::Uuid,
    /// Project of the parent task.
    pub project_id: uuid::Uuid,
    /// Approver comments.
    pub comments: String,
    /// Deciding user.
    pub approved_by: String,
    /// Verdict timestamp.
    pub approved_at: DateTime<Utc>,
    /// Verdict.
    pub status: String,
}

/// Row for transition receipts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = transition_receipts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReceiptRow {
    /// Task the transition applied to.
    pub task_id: uuid::Uuid,
    /// Caller-supplied key.
    pub idempotency_key: String,
    /// Applied action.
    pub action: String,
    /// Acting user.
    pub actor_id: String,
    /// Payload fingerprint.
    pub fingerprint: String,
    /// Task status after the transition.
    pub task_status: String,
    /// Task version after the transition.
    pub task_version: i64,
    /// Response written by the transition.
    pub response_id: Option<uuid::Uuid>,
    /// Review written by the transition.
    pub review_id: Option<uuid::Uuid>,
    /// Final record written by the transition.
    pub final_id: Option<uuid::Uuid>,
    /// Application timestamp.
    pub applied_at: DateTime<Utc>,
}
