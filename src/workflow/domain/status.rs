//! Status vocabulary shared by tasks, responses and reviews, and the final
//! approval verdict.

use super::ParseStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline status.
///
/// The task status is canonical; response and review statuses are derived
/// from it by the transition table and reuse the same vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    /// Task created, no work started.
    Pending,
    /// Assignee is working on the task.
    InProgress,
    /// A response awaits the reviewer.
    Review,
    /// A reviewed response awaits the final approver.
    FinalReview,
    /// The pipeline completed; nothing further may be recorded.
    Closed,
    /// The record was rejected and superseded.
    Rejected,
}

impl Status {
    /// Every status value, in pipeline order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::InProgress,
        Self::Review,
        Self::FinalReview,
        Self::Closed,
        Self::Rejected,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Review => "review",
            Self::FinalReview => "final-review",
            Self::Closed => "closed",
            Self::Rejected => "rejected",
        }
    }

    /// Returns `true` when no further transition may leave this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl TryFrom<&str> for Status {
    type Error = ParseStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "in-progress" => Ok(Self::InProgress),
            "review" => Ok(Self::Review),
            "final-review" => Ok(Self::FinalReview),
            "closed" => Ok(Self::Closed),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict carried by a final-approval record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FinalStatus {
    /// The final approver closed the task.
    Approved,
    /// The final approver bounced the task back to review.
    Rejected,
}

impl FinalStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl TryFrom<&str> for FinalStatus {
    type Error = ParseStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for FinalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
