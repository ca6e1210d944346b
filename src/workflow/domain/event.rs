//! Events published after a transition commits.

use super::{Action, FinalId, ResponseId, ReviewId, Status, TaskId, TransitionReceipt, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notification that a task moved through the pipeline.
///
/// Subscribers (mailers, dashboards) react to these after the fact; the
/// transition itself never waits on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEvent {
    /// Task that moved.
    pub task_id: TaskId,
    /// Applied action.
    pub action: Action,
    /// Status before the transition.
    pub from: Status,
    /// Status after the transition.
    pub to: Status,
    /// User who performed the action.
    pub actor_id: UserId,
    /// Response touched by the transition, if any.
    pub response_id: Option<ResponseId>,
    /// Review touched by the transition, if any.
    pub review_id: Option<ReviewId>,
    /// Final record created by the transition, if any.
    pub final_id: Option<FinalId>,
    /// Commit timestamp.
    pub occurred_at: DateTime<Utc>,
}

impl TransitionEvent {
    /// Builds the event for a freshly committed receipt.
    #[must_use]
    pub fn from_receipt(from: Status, receipt: &TransitionReceipt) -> Self {
        let outcome = receipt.outcome();
        Self {
            task_id: receipt.task_id(),
            action: receipt.action(),
            from,
            to: outcome.task_status,
            actor_id: receipt.actor_id().clone(),
            response_id: outcome.response_id,
            review_id: outcome.review_id,
            final_id: outcome.final_id,
            occurred_at: receipt.applied_at(),
        }
    }
}
