//! Identifier and validated scalar types for the workflow domain.
//!
//! Record identifiers wrap UUIDs so that a response identifier can never be
//! passed where a review identifier is expected. User identifiers and
//! idempotency keys are caller-supplied strings validated at construction.

use super::WorkflowDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the wrapped UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id! {
    /// Unique identifier for a project owning tasks.
    ProjectId
}

record_id! {
    /// Unique identifier for a task flowing through the approval pipeline.
    TaskId
}

record_id! {
    /// Unique identifier for an assignee response.
    ResponseId
}

record_id! {
    /// Unique identifier for a reviewer verdict.
    ReviewId
}

record_id! {
    /// Unique identifier for a final-approval record.
    FinalId
}

/// Identifier of a user acting in the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Creates a validated user identifier.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::EmptyUserId`] when the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, WorkflowDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(WorkflowDomainError::EmptyUserId);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = WorkflowDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller-supplied token that makes retried transitions safe.
///
/// Two requests against the same task carrying the same key are treated as
/// one logical request: the second observes the result of the first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Longest key accepted, matching the persisted column width.
    pub const MAX_LEN: usize = 255;

    /// Creates a validated idempotency key.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::InvalidIdempotencyKey`] when the key is
    /// blank or longer than [`Self::MAX_LEN`] bytes.
    pub fn new(value: impl Into<String>) -> Result<Self, WorkflowDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.len() > Self::MAX_LEN {
            return Err(WorkflowDomainError::InvalidIdempotencyKey(raw));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Generates a fresh random key for callers that do not deduplicate.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the key as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for IdempotencyKey {
    type Error = WorkflowDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IdempotencyKey> for String {
    fn from(value: IdempotencyKey) -> Self {
        value.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
