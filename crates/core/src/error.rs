//! Error taxonomy for the review engine
//!
//! Validation and state errors gate UI affordances and are handled where
//! they occur; `Network` wraps any persistence-collaborator failure and is
//! surfaced as a transient notification by the host.

use crate::annotation::AnnotationId;
use crate::backend::BackendError;

/// Errors produced by the review engine
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    /// Draft or patch failed validation (empty content, degenerate bounds)
    #[error("validation failed: {0}")]
    Validation(String),

    /// No annotation with the given id is loaded
    #[error("annotation not found: {0}")]
    NotFound(AnnotationId),

    /// Content or geometry mutation attempted on a read-only version
    #[error("document version is read-only")]
    ReadOnly,

    /// Approval blocked by unresolved comments
    #[error("{unresolved} unresolved comment(s) must be resolved before approval")]
    PendingComments { unresolved: usize },

    /// Action requires a reviewer identity that has not been captured
    #[error("reviewer identity required")]
    MissingIdentity,

    /// A persistence-collaborator call failed
    #[error("backend request failed: {0}")]
    Network(String),
}

impl From<BackendError> for ReviewError {
    fn from(err: BackendError) -> Self {
        ReviewError::Network(err.to_string())
    }
}

/// Result type for review engine operations
pub type ReviewResult<T> = Result<T, ReviewError>;
