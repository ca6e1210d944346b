//! Structured list values for assignees and attachments.
//!
//! List fields are accepted only as real JSON arrays of strings. String
//! encodings of arrays, whether single or double encoded, are rejected at the
//! boundary instead of being re-parsed on a best-effort basis.

use super::WorkflowDomainError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered set of non-blank strings.
///
/// Entries are trimmed and de-duplicated, keeping first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct StringList(Vec<String>);

impl StringList {
    /// Field label used in errors when no better name is available.
    const DEFAULT_FIELD: &'static str = "list";

    /// Creates an empty list.
    #[must_use]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Builds a list from already-structured entries.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::MalformedList`] when an entry is blank.
    pub fn new<I, S>(entries: I) -> Result<Self, WorkflowDomainError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::collect(Self::DEFAULT_FIELD, entries.into_iter().map(Into::into))
    }

    /// Parses a list from a JSON value received at the boundary.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::MalformedList`] unless `value` is an
    /// array whose elements are all non-blank strings.
    pub fn from_json(field: &'static str, value: &Value) -> Result<Self, WorkflowDomainError> {
        let items = match value {
            Value::Array(items) => items,
            Value::String(_) => {
                return Err(WorkflowDomainError::malformed_list(
                    field,
                    "expected a JSON array, found a JSON-encoded string",
                ));
            }
            Value::Null => {
                return Err(WorkflowDomainError::malformed_list(
                    field,
                    "expected a JSON array, found null",
                ));
            }
            _ => {
                return Err(WorkflowDomainError::malformed_list(
                    field,
                    "expected a JSON array of strings",
                ));
            }
        };

        let mut entries = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let Value::String(entry) = item else {
                return Err(WorkflowDomainError::malformed_list(
                    field,
                    format!("element {index} is not a string"),
                ));
            };
            entries.push(entry.clone());
        }
        Self::collect(field, entries)
    }

    fn collect(
        field: &'static str,
        entries: impl IntoIterator<Item = String>,
    ) -> Result<Self, WorkflowDomainError> {
        let mut values: Vec<String> = Vec::new();
        for (index, entry) in entries.into_iter().enumerate() {
            let trimmed = entry.trim();
            if trimmed.is_empty() {
                return Err(WorkflowDomainError::malformed_list(
                    field,
                    format!("element {index} is blank"),
                ));
            }
            if !values.iter().any(|existing| existing == trimmed) {
                values.push(trimmed.to_owned());
            }
        }
        Ok(Self(values))
    }

    /// Returns `true` when `value` is an entry of the list.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|entry| entry == value)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when the list has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the entries in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Returns the entries as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Consumes the list, returning its entries.
    #[must_use]
    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl TryFrom<Vec<String>> for StringList {
    type Error = WorkflowDomainError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StringList> for Vec<String> {
    fn from(value: StringList) -> Self {
        value.0
    }
}
