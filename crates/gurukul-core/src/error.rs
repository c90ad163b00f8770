//! Error types for store access and analytics operations.
//!
//! `StoreError` is what a `DocumentStore` implementation reports.
//! `AnalyticsError::OperationFailed` wraps it unchanged, naming the
//! operation that was in flight; callers never see a partially applied
//! result.

use thiserror::Error;

/// Failures reported by a document store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A document that was assumed to exist is missing.
    #[error("document not found: {0}")]
    NotFound(String),

    /// The collection or document id is empty or contains a path separator.
    #[error("invalid document key: {0}")]
    InvalidKey(String),

    /// The backend rejected the credentials or the caller lacks access.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The backend returned an error response.
    #[error("store error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// A stored document could not be read as the expected record.
    #[error("malformed document {key}: {message}")]
    Malformed { key: String, message: String },
}

impl StoreError {
    pub fn malformed(key: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::Malformed {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced by the analytics and grading operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// A store request failed; the underlying failure is carried unchanged.
    #[error("{operation} failed")]
    OperationFailed {
        operation: &'static str,
        source: StoreError,
    },

    /// The text generator failed to produce feedback.
    #[error("text generation failed: {0:#}")]
    Generation(anyhow::Error),

    /// A grade was NaN or infinite and would corrupt the running average.
    #[error("grade must be a finite number, got {0}")]
    InvalidGrade(f64),

    /// Generated feedback contained no recognisable score.
    #[error("could not extract a grade from the generated feedback")]
    GradeNotFound,
}

impl AnalyticsError {
    /// Adapter for `map_err` that tags a store failure with its operation.
    pub fn failed(operation: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| AnalyticsError::OperationFailed { operation, source }
    }

    /// The store failure behind this error, if there is one.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            AnalyticsError::OperationFailed { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Returns `true` if the operation failed because a document was missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self.store_error(), Some(StoreError::NotFound(_)))
    }
}

pub type Result<T, E = AnalyticsError> = std::result::Result<T, E>;
