//! Error types for leadflow.
//!
//! Every remote call made by the workflow can fail in one of a small number
//! of ways. The variants here are explicit so that callers can decide
//! whether to retry, surface a notice, or treat the failure as a bug in
//! their input.

use std::fmt;
use thiserror::Error;

/// The unified error type for leadflow operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Input rejected before it reached the store (missing required field,
    /// disallowed transition, malformed identifier).
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The store could not be reached or failed while serving the call.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(#[from] BackendError),

    /// The store or the caller's role rejected the call.
    #[error("permission denied: {0}")]
    PermissionDenied(#[from] PermissionError),

    /// The addressed record does not exist.
    #[error("record {id} not found in {collection}")]
    NotFound { collection: String, id: String },
}

impl Error {
    /// Whether retrying the same call may succeed.
    ///
    /// Only [`Error::BackendUnavailable`] is transient.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::BackendUnavailable(_))
    }

    /// Generic, user-facing text for a failure.
    ///
    /// The detailed error is logged; this is what a dashboard shows in its
    /// blocking notice.
    pub fn user_notice(&self) -> &'static str {
        match self {
            Error::Validation(_) => "Please check the highlighted fields and try again.",
            Error::BackendUnavailable(_) => {
                "The service is temporarily unavailable. Please try again."
            }
            Error::PermissionDenied(_) => "You do not have permission to perform this action.",
            Error::NotFound { .. } => "This item no longer exists.",
        }
    }

    pub(crate) fn not_found(collection: impl fmt::Display, id: impl fmt::Display) -> Self {
        Error::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

/// Validation errors raised before any remote call.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required form field was missing or blank.
    #[error("required field '{field}' is missing")]
    MissingField { field: String },

    /// The transition policy does not allow moving between the two statuses.
    #[error("transition from '{from}' to '{to}' is not allowed")]
    Transition { from: String, to: String },

    /// A payload key collides with a fixed record field.
    #[error("field '{field}' is managed by the workflow and cannot be set in the payload")]
    ReservedField { field: String },

    /// Invalid record identifier.
    #[error("invalid record id '{value}': {reason}")]
    RecordId { value: String, reason: String },

    /// Invalid collection name.
    #[error("invalid collection name '{value}': {reason}")]
    Collection { value: String, reason: String },

    /// Invalid actor identifier.
    #[error("invalid actor '{value}': {reason}")]
    Actor { value: String, reason: String },

    /// Invalid store URL.
    #[error("invalid store URL '{value}': {reason}")]
    StoreUrl { value: String, reason: String },

    /// Generic invalid input.
    #[error("{message}")]
    Other { message: String },
}

/// Transport or storage failure inside a backend.
#[derive(Debug)]
pub struct BackendError {
    /// Which store operation failed (e.g. `"add_document"`).
    pub operation: &'static str,
    /// Underlying failure description.
    pub message: String,
}

impl BackendError {
    /// Create a new backend error.
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.operation, self.message)
    }
}

impl std::error::Error for BackendError {}

/// Authorization rejection.
#[derive(Debug, Error)]
pub enum PermissionError {
    /// The store's own rules rejected the call.
    #[error("store rejected {operation}: {message}")]
    Store {
        operation: &'static str,
        message: String,
    },

    /// The actor's role does not permit the action.
    #[error("role '{role}' may not {action} record {id}")]
    Role {
        role: String,
        action: &'static str,
        id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_backend_errors_are_transient() {
        let backend: Error = BackendError::new("update_document", "connection reset").into();
        assert!(backend.is_transient());

        let denied: Error = PermissionError::Store {
            operation: "update_document",
            message: "rules".to_string(),
        }
        .into();
        assert!(!denied.is_transient());

        let invalid: Error = ValidationError::MissingField {
            field: "title".to_string(),
        }
        .into();
        assert!(!invalid.is_transient());
    }

    #[test]
    fn notices_do_not_leak_details() {
        let err: Error = BackendError::new("delete_document", "disk /var/x is full").into();
        assert!(!err.user_notice().contains("/var/x"));
        assert!(err.to_string().contains("/var/x"));
    }
}
