//! Error types for the resource contract.
//!
//! The contract sorts every failure into a small taxonomy that the HTTP
//! layer maps one-to-one onto status codes:
//!
//! - **NotFound**: the id is well formed but matches nothing (404)
//! - **InvalidId**: the id is not an identifier this system could have issued (400)
//! - **Validation**: submitted fields break the resource's rules (400)
//! - **Unsupported**: the operation is outside the resource's capability set (405)
//! - **Store**: the backend failed (500)
//!
//! Message text is surfaced to end users verbatim, so the `Display` output of
//! these types is part of the public contract.

use std::fmt;

use thiserror::Error;

use crate::resource::ResourceOperation;
use crate::store::StoreError;

/// One broken rule on one submitted field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    field: &'static str,
    reason: String,
}

impl FieldIssue {
    /// The wire name of the offending field.
    pub const fn field(&self) -> &'static str {
        self.field
    }

    /// Human readable description of the problem.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.reason)
    }
}

/// Submitted fields failed validation.
///
/// Collects every issue found in a submission so a client learns about all
/// of them at once.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationError {
    issues: Vec<FieldIssue>,
}

impl ValidationError {
    /// A single-issue error.
    pub fn field(field: &'static str, reason: impl Into<String>) -> Self {
        let mut error = Self::default();
        error.push(field, reason);
        error
    }

    /// Record another issue.
    pub fn push(&mut self, field: &'static str, reason: impl Into<String>) {
        self.issues.push(FieldIssue {
            field,
            reason: reason.into(),
        });
    }

    /// Shorthand for a missing required field.
    pub fn required(field: &'static str) -> Self {
        Self::field(field, "is required")
    }

    /// All recorded issues, in the order they were found.
    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    /// Whether no issue has been recorded.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// `Ok(value)` when empty, `Err(self)` otherwise.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validation failed: ")?;
        for (index, issue) in self.issues.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Failure of a resource contract operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResourceError {
    /// No entity carries the requested id.
    #[error("{label} not found")]
    NotFound {
        /// Display label of the resource, e.g. "Course".
        label: &'static str,
    },

    /// The requested id is malformed.
    #[error("Invalid id: {raw}")]
    InvalidId {
        /// The id as received.
        raw: String,
    },

    /// Submitted fields failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The resource does not expose this operation.
    #[error("{operation} is not supported for {label}")]
    Unsupported {
        /// Display label of the resource.
        label: &'static str,
        /// Refused operation.
        operation: ResourceOperation,
    },

    /// The document store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_lists_every_issue() {
        let mut error = ValidationError::required("name");
        error.push("rating", "must be between 0 and 5");

        assert_eq!(
            error.to_string(),
            "Validation failed: name is required, rating must be between 0 and 5"
        );
    }

    #[test]
    fn into_result_passes_value_through_when_clean() {
        assert_eq!(ValidationError::default().into_result(7), Ok(7));
    }

    #[test]
    fn not_found_message_uses_label() {
        let error = ResourceError::NotFound { label: "Course" };

        assert_eq!(error.to_string(), "Course not found");
    }

    #[test]
    fn validation_errors_convert_transparently() {
        let error: ResourceError = ValidationError::required("title").into();

        assert_eq!(error.to_string(), "Validation failed: title is required");
    }
}
