//! Annotation data model
//!
//! Annotations are persisted, positioned pieces of feedback on one page of
//! one document version. Positions use percentage-of-page coordinates (see
//! [`crate::geometry`]) so a record repaints at the same relative position
//! at any zoom level or device pixel ratio.

use crate::error::{ReviewError, ReviewResult};
use crate::geometry::{PercentPoint, PercentRect, HIT_TOLERANCE};
use crate::identity::ReviewerIdentity;

/// Unique identifier for an annotation
///
/// Assigned by the persistence collaborator when a draft is confirmed.
/// Drafts carry no identifier; creation is synchronous-pending rather than
/// optimistic-with-temporary-id.
pub type AnnotationId = uuid::Uuid;

/// Geometric shape of an annotation
///
/// A closed set of variants so that hit-testing and painting match
/// exhaustively; adding a shape is a compile-time-checked change.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnnotationShape {
    /// Point comment pinned at a single position
    Comment { at: PercentPoint },

    /// Rectangular highlight
    Highlight { rect: PercentRect },

    /// Rectangular strike-through
    Strike { rect: PercentRect },
}

impl AnnotationShape {
    /// Check if a percent-space point hits this shape
    ///
    /// Comment pins hit within [`HIT_TOLERANCE`]; rectangles hit inside
    /// their bounds.
    pub fn contains_point(&self, point: &PercentPoint) -> bool {
        match self {
            AnnotationShape::Comment { at } => {
                at.chebyshev_distance_to(point) <= HIT_TOLERANCE
            }
            AnnotationShape::Highlight { rect } | AnnotationShape::Strike { rect } => {
                rect.contains(point)
            }
        }
    }

    /// Check whether the shape encloses zero area
    ///
    /// Point comments are never degenerate.
    pub fn is_degenerate(&self) -> bool {
        match self {
            AnnotationShape::Comment { .. } => false,
            AnnotationShape::Highlight { rect } | AnnotationShape::Strike { rect } => {
                rect.is_degenerate()
            }
        }
    }

    /// Whether this is a comment pin
    pub fn is_comment(&self) -> bool {
        matches!(self, AnnotationShape::Comment { .. })
    }

    /// Translate the shape by a percent-space delta, clamped to the page
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        match self {
            AnnotationShape::Comment { at } => AnnotationShape::Comment {
                at: PercentPoint::new(at.x + dx, at.y + dy).clamped(),
            },
            AnnotationShape::Highlight { rect } => AnnotationShape::Highlight {
                rect: rect.translated(dx, dy),
            },
            AnnotationShape::Strike { rect } => AnnotationShape::Strike {
                rect: rect.translated(dx, dy),
            },
        }
    }

    /// Clamp the shape onto the page it was created in
    pub fn clamped(&self) -> Self {
        self.translated(0.0, 0.0)
    }
}

/// A persisted annotation on one page of one document version
///
/// Owned by its document version; switching versions replaces the loaded
/// set wholesale, so records never outlive their version in memory.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Annotation {
    /// Collaborator-assigned identifier
    pub id: AnnotationId,

    /// Page number, 1-indexed
    pub page: u16,

    /// Geometric shape in percent space
    pub shape: AnnotationShape,

    /// Comment body or label
    pub content: String,

    /// Display name of the author, captured from the acting identity
    pub author_name: String,

    /// Email of the author
    pub author_email: String,

    /// Resolved annotations paint muted and do not block approval
    pub is_resolved: bool,

    /// Creation time, Unix seconds
    pub created_at: i64,
}

impl Annotation {
    /// Check if a percent-space point hits this annotation
    pub fn hit_test(&self, point: &PercentPoint) -> bool {
        self.shape.contains_point(point)
    }

    #[cfg(test)]
    pub(crate) fn for_tests(page: u16, shape: AnnotationShape) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            page,
            shape,
            content: "note".to_string(),
            author_name: "Test Reviewer".to_string(),
            author_email: "reviewer@example.com".to_string(),
            is_resolved: false,
            created_at: now_unix(),
        }
    }
}

/// An annotation awaiting confirmation
///
/// Produced when a gesture completes; held until the user confirms the
/// content, then sent to the persistence collaborator which assigns the id.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnnotationDraft {
    pub page: u16,
    pub shape: AnnotationShape,
    pub content: String,
    pub author_name: String,
    pub author_email: String,
}

impl AnnotationDraft {
    /// Create a draft with empty content, attributed to the acting identity
    pub fn new(page: u16, shape: AnnotationShape, identity: &ReviewerIdentity) -> Self {
        Self {
            page,
            shape: shape.clamped(),
            content: String::new(),
            author_name: identity.display_name(),
            author_email: identity.email.clone(),
        }
    }

    /// Validate the draft before it is sent to the collaborator
    ///
    /// Comments require non-empty content; rectangle shapes must enclose
    /// a non-zero area.
    pub fn validate(&self) -> ReviewResult<()> {
        if self.shape.is_comment() && self.content.trim().is_empty() {
            return Err(ReviewError::Validation(
                "comment content must not be empty".to_string(),
            ));
        }
        if self.shape.is_degenerate() {
            return Err(ReviewError::Validation(
                "annotation bounds enclose zero area".to_string(),
            ));
        }
        if self.page == 0 {
            return Err(ReviewError::Validation(
                "page numbers are 1-indexed".to_string(),
            ));
        }
        Ok(())
    }
}

/// Current time as Unix seconds
pub(crate) fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
