//! Actors, actions and transition requests.

use super::{IdempotencyKey, ParseActionError, ResponseId, ReviewId, StringList, TaskId, UserId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Role a user acts in when requesting a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    /// Creates tasks inside projects.
    Technical,
    /// Works a task and submits responses.
    Assignee,
    /// Accepts or rejects responses.
    Reviewer,
    /// Closes or bounces reviewed responses.
    FinalApprover,
}

impl ActorRole {
    /// Returns the canonical role name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Technical => "technical",
            Self::Assignee => "assignee",
            Self::Reviewer => "reviewer",
            Self::FinalApprover => "final_approver",
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user acting in a specific role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    id: UserId,
    role: ActorRole,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub const fn new(id: UserId, role: ActorRole) -> Self {
        Self { id, role }
    }

    /// Creates an assignee actor.
    #[must_use]
    pub const fn assignee(id: UserId) -> Self {
        Self::new(id, ActorRole::Assignee)
    }

    /// Creates a reviewer actor.
    #[must_use]
    pub const fn reviewer(id: UserId) -> Self {
        Self::new(id, ActorRole::Reviewer)
    }

    /// Creates a final-approver actor.
    #[must_use]
    pub const fn final_approver(id: UserId) -> Self {
        Self::new(id, ActorRole::FinalApprover)
    }

    /// Returns the acting user.
    #[must_use]
    pub const fn id(&self) -> &UserId {
        &self.id
    }

    /// Returns the acting role.
    #[must_use]
    pub const fn role(&self) -> ActorRole {
        self.role
    }
}

/// Pipeline action kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Assignee starts working a pending task.
    StartWork,
    /// Assignee submits a response.
    SubmitResponse,
    /// Reviewer accepts the active response.
    ApproveResponse,
    /// Reviewer rejects the active response.
    RejectResponse,
    /// Final approver closes the task.
    ApproveFinal,
    /// Final approver bounces the task back to review.
    RejectFinal,
}

impl Action {
    /// Every action kind.
    pub const ALL: [Self; 6] = [
        Self::StartWork,
        Self::SubmitResponse,
        Self::ApproveResponse,
        Self::RejectResponse,
        Self::ApproveFinal,
        Self::RejectFinal,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StartWork => "start_work",
            Self::SubmitResponse => "submit_response",
            Self::ApproveResponse => "approve_response",
            Self::RejectResponse => "reject_response",
            Self::ApproveFinal => "approve_final",
            Self::RejectFinal => "reject_final",
        }
    }

    /// Returns the only role allowed to perform this action.
    #[must_use]
    pub const fn required_role(self) -> ActorRole {
        match self {
            Self::StartWork | Self::SubmitResponse => ActorRole::Assignee,
            Self::ApproveResponse | Self::RejectResponse => ActorRole::Reviewer,
            Self::ApproveFinal | Self::RejectFinal => ActorRole::FinalApprover,
        }
    }
}

impl TryFrom<&str> for Action {
    type Error = ParseActionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == value.trim())
            .ok_or_else(|| ParseActionError(value.to_owned()))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An action together with the data it carries.
///
/// Reviewer and final-approver payloads may name the record they judge; the
/// state machine refuses the action when that record is no longer active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionPayload {
    /// Start working a pending task.
    StartWork,
    /// Submit a response.
    SubmitResponse {
        /// Free-form comments.
        comments: String,
        /// Attachment references.
        attachments: StringList,
    },
    /// Accept the active response.
    ApproveResponse {
        /// Response the reviewer judged.
        response_id: Option<ResponseId>,
        /// Optional reviewer comments.
        comments: String,
    },
    /// Reject the active response.
    RejectResponse {
        /// Response the reviewer judged.
        response_id: Option<ResponseId>,
        /// Mandatory justification.
        comments: String,
    },
    /// Close the task.
    ApproveFinal {
        /// Review the final approver judged.
        review_id: Option<ReviewId>,
        /// Optional comments.
        comments: String,
    },
    /// Bounce the task back to review.
    RejectFinal {
        /// Review the final approver judged.
        review_id: Option<ReviewId>,
        /// Mandatory justification.
        comments: String,
    },
}

impl ActionPayload {
    /// Returns the action kind.
    #[must_use]
    pub const fn action(&self) -> Action {
        match self {
            Self::StartWork => Action::StartWork,
            Self::SubmitResponse { .. } => Action::SubmitResponse,
            Self::ApproveResponse { .. } => Action::ApproveResponse,
            Self::RejectResponse { .. } => Action::RejectResponse,
            Self::ApproveFinal { .. } => Action::ApproveFinal,
            Self::RejectFinal { .. } => Action::RejectFinal,
        }
    }

    /// Returns the comments carried by the payload.
    #[must_use]
    pub fn comments(&self) -> &str {
        match self {
            Self::StartWork => "",
            Self::SubmitResponse { comments, .. }
            | Self::ApproveResponse { comments, .. }
            | Self::RejectResponse { comments, .. }
            | Self::ApproveFinal { comments, .. }
            | Self::RejectFinal { comments, .. } => comments,
        }
    }

    /// Returns a stable SHA-256 digest of the action and its data.
    ///
    /// Two payloads share a fingerprint exactly when a retry of one would be
    /// indistinguishable from the other.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.action().as_str().as_bytes());
        hasher.update([0]);
        hasher.update(self.comments().trim().as_bytes());
        hasher.update([0]);
        match self {
            Self::SubmitResponse { attachments, .. } => {
                for attachment in attachments.iter() {
                    hasher.update(attachment.as_bytes());
                    hasher.update([0x1f]);
                }
            }
            Self::ApproveResponse { response_id, .. } | Self::RejectResponse { response_id, .. } => {
                if let Some(id) = response_id {
                    hasher.update(id.as_ref().as_bytes());
                }
            }
            Self::ApproveFinal { review_id, .. } | Self::RejectFinal { review_id, .. } => {
                if let Some(id) = review_id {
                    hasher.update(id.as_ref().as_bytes());
                }
            }
            Self::StartWork => {}
        }
        hasher
            .finalize()
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect()
    }
}

/// A request to move a task through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    task_id: TaskId,
    actor: Actor,
    payload: ActionPayload,
    idempotency_key: IdempotencyKey,
}

impl TransitionRequest {
    /// Creates a request with a freshly generated idempotency key.
    #[must_use]
    pub fn new(task_id: TaskId, actor: Actor, payload: ActionPayload) -> Self {
        Self {
            task_id,
            actor,
            payload,
            idempotency_key: IdempotencyKey::generate(),
        }
    }

    /// Sets the caller-supplied idempotency key.
    #[must_use]
    pub fn with_idempotency_key(mut self, key: IdempotencyKey) -> Self {
        self.idempotency_key = key;
        self
    }

    /// Returns the targeted task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the acting user and role.
    #[must_use]
    pub const fn actor(&self) -> &Actor {
        &self.actor
    }

    /// Returns the action payload.
    #[must_use]
    pub const fn payload(&self) -> &ActionPayload {
        &self.payload
    }

    /// Returns the action kind.
    #[must_use]
    pub const fn action(&self) -> Action {
        self.payload.action()
    }

    /// Returns the idempotency key.
    #[must_use]
    pub const fn idempotency_key(&self) -> &IdempotencyKey {
        &self.idempotency_key
    }
}
