//! Persistence collaborator interface
//!
//! The engine never talks to the network itself; hosts implement
//! [`ReviewBackend`] over their transport of choice. [`MemoryBackend`] is
//! a complete in-process implementation with JSON snapshot export, used by
//! the test suites and embeddable hosts.

use std::collections::HashMap;

use crate::annotation::{now_unix, Annotation, AnnotationDraft, AnnotationId};
use crate::identity::ReviewerIdentity;
use crate::version::{DocumentVersion, VersionId, VersionStatus};

/// Unique identifier for a review lineage
pub type ReviewId = uuid::Uuid;

/// How a review is addressed by the two front-ends
///
/// The public flow hands out opaque share tokens; the internal flow keys
/// reviews by numeric id.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ReviewKey {
    Token(String),
    Id(u64),
}

/// Review payload returned by the collaborator
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ReviewSnapshot {
    pub id: ReviewId,

    /// The version selected by the fetch (requested, or the lineage's
    /// current one)
    pub version: DocumentVersion,

    /// Every version in the lineage, ascending by version number
    pub all_versions: Vec<DocumentVersion>,
}

/// Partial update for a persisted comment
///
/// Resolution is a separate collaborator call, not a patch field.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CommentPatch {
    pub content: Option<String>,
    pub shape: Option<crate::annotation::AnnotationShape>,
}

impl CommentPatch {
    /// Patch that replaces the content
    pub fn content(content: &str) -> Self {
        Self {
            content: Some(content.to_string()),
            ..Self::default()
        }
    }

    /// Patch that replaces the position
    pub fn position(shape: crate::annotation::AnnotationShape) -> Self {
        Self {
            shape: Some(shape),
            ..Self::default()
        }
    }
}

/// Error reported by a persistence collaborator
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    /// Create a new backend error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Persistence collaborator for reviews and their annotations
///
/// All calls are synchronous from the engine's point of view; hosts that
/// talk to a remote service block or bridge as they see fit. Comment
/// ordering within a version is insertion order and must be preserved.
pub trait ReviewBackend {
    /// Fetch the review payload, selecting a specific version or the
    /// lineage's current one
    fn fetch_review(
        &self,
        key: &ReviewKey,
        version: Option<VersionId>,
    ) -> Result<ReviewSnapshot, BackendError>;

    /// Fetch all annotations for a version, in creation order
    fn fetch_comments(&self, version: VersionId) -> Result<Vec<Annotation>, BackendError>;

    /// Persist a draft; the collaborator assigns id and creation time
    fn create_comment(
        &mut self,
        version: VersionId,
        draft: &AnnotationDraft,
    ) -> Result<Annotation, BackendError>;

    /// Apply a partial update to a comment
    fn update_comment(&mut self, id: AnnotationId, patch: &CommentPatch)
        -> Result<(), BackendError>;

    /// Delete a comment
    fn delete_comment(&mut self, id: AnnotationId) -> Result<(), BackendError>;

    /// Toggle the resolved flag on a comment
    fn resolve_comment(&mut self, id: AnnotationId, resolved: bool) -> Result<(), BackendError>;

    /// Transition the version to approved
    fn approve(
        &mut self,
        review: ReviewId,
        version: VersionId,
        identity: Option<&ReviewerIdentity>,
    ) -> Result<(), BackendError>;

    /// Transition the version to changes-requested
    fn request_changes(
        &mut self,
        review: ReviewId,
        version: VersionId,
        identity: Option<&ReviewerIdentity>,
    ) -> Result<(), BackendError>;
}

/// In-process review store
///
/// Keeps the whole review lineage in memory and supports JSON snapshot
/// export/import so hosts can persist it as a sidecar file.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MemoryBackend {
    review_id: ReviewId,
    token: String,
    numeric_id: u64,
    versions: Vec<DocumentVersion>,
    comments: HashMap<VersionId, Vec<Annotation>>,
}

impl MemoryBackend {
    /// Create a backend holding a single pending version
    pub fn new(file_url: &str, revision_limit: u32) -> Self {
        let first = DocumentVersion {
            id: uuid::Uuid::new_v4(),
            version_number: 1,
            file_url: file_url.to_string(),
            is_current: true,
            status: VersionStatus::Pending,
            revisions_used: 1,
            revision_limit,
        };
        let mut comments = HashMap::new();
        comments.insert(first.id, Vec::new());
        Self {
            review_id: uuid::Uuid::new_v4(),
            token: uuid::Uuid::new_v4().to_string(),
            numeric_id: 1,
            versions: vec![first],
            comments,
        }
    }

    /// The review id
    pub fn review_id(&self) -> ReviewId {
        self.review_id
    }

    /// The public share token
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The internal numeric id
    pub fn numeric_id(&self) -> u64 {
        self.numeric_id
    }

    /// Id of the lineage's current version
    pub fn current_version_id(&self) -> Option<VersionId> {
        self.versions.iter().find(|v| v.is_current).map(|v| v.id)
    }

    /// Register an uploaded revision
    ///
    /// Mirrors the external upload path: rejects uploads past the revision
    /// budget, supersedes the current version, and starts the new one
    /// pending. Returns the new version number.
    pub fn push_version(&mut self, file_url: &str) -> Result<u32, BackendError> {
        let current = self
            .versions
            .iter()
            .find(|v| v.is_current)
            .ok_or_else(|| BackendError::new("review has no current version"))?;
        if current.revisions_used >= current.revision_limit {
            return Err(BackendError::new("revision limit reached"));
        }
        let next = DocumentVersion {
            id: uuid::Uuid::new_v4(),
            version_number: current.version_number + 1,
            file_url: file_url.to_string(),
            is_current: true,
            status: VersionStatus::Pending,
            revisions_used: current.revisions_used + 1,
            revision_limit: current.revision_limit,
        };
        for version in &mut self.versions {
            version.is_current = false;
        }
        let number = next.version_number;
        self.comments.insert(next.id, Vec::new());
        self.versions.push(next);
        Ok(number)
    }

    /// Serialize the whole review to JSON
    pub fn to_json(&self) -> Result<String, BackendError> {
        serde_json::to_string_pretty(self).map_err(|e| BackendError::new(e.to_string()))
    }

    /// Restore a review from a JSON snapshot
    pub fn from_json(json: &str) -> Result<Self, BackendError> {
        serde_json::from_str(json).map_err(|e| BackendError::new(e.to_string()))
    }

    fn key_matches(&self, key: &ReviewKey) -> bool {
        match key {
            ReviewKey::Token(token) => *token == self.token,
            ReviewKey::Id(id) => *id == self.numeric_id,
        }
    }

    fn version_mut(&mut self, id: VersionId) -> Result<&mut DocumentVersion, BackendError> {
        self.versions
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| BackendError::new(format!("unknown version {id}")))
    }

    fn comment_mut(&mut self, id: AnnotationId) -> Result<&mut Annotation, BackendError> {
        self.comments
            .values_mut()
            .flat_map(|list| list.iter_mut())
            .find(|a| a.id == id)
            .ok_or_else(|| BackendError::new(format!("unknown comment {id}")))
    }
}

impl ReviewBackend for MemoryBackend {
    fn fetch_review(
        &self,
        key: &ReviewKey,
        version: Option<VersionId>,
    ) -> Result<ReviewSnapshot, BackendError> {
        if !self.key_matches(key) {
            return Err(BackendError::new("unknown review"));
        }
        let selected = match version {
            Some(id) => self
                .versions
                .iter()
                .find(|v| v.id == id)
                .ok_or_else(|| BackendError::new(format!("unknown version {id}")))?,
            None => self
                .versions
                .iter()
                .find(|v| v.is_current)
                .ok_or_else(|| BackendError::new("review has no current version"))?,
        };
        let mut all_versions = self.versions.clone();
        all_versions.sort_by_key(|v| v.version_number);
        Ok(ReviewSnapshot {
            id: self.review_id,
            version: selected.clone(),
            all_versions,
        })
    }

    fn fetch_comments(&self, version: VersionId) -> Result<Vec<Annotation>, BackendError> {
        self.comments
            .get(&version)
            .cloned()
            .ok_or_else(|| BackendError::new(format!("unknown version {version}")))
    }

    fn create_comment(
        &mut self,
        version: VersionId,
        draft: &AnnotationDraft,
    ) -> Result<Annotation, BackendError> {
        let annotation = Annotation {
            id: uuid::Uuid::new_v4(),
            page: draft.page,
            shape: draft.shape.clone(),
            content: draft.content.clone(),
            author_name: draft.author_name.clone(),
            author_email: draft.author_email.clone(),
            is_resolved: false,
            created_at: now_unix(),
        };
        let list = self
            .comments
            .get_mut(&version)
            .ok_or_else(|| BackendError::new(format!("unknown version {version}")))?;
        list.push(annotation.clone());
        Ok(annotation)
    }

    fn update_comment(
        &mut self,
        id: AnnotationId,
        patch: &CommentPatch,
    ) -> Result<(), BackendError> {
        let comment = self.comment_mut(id)?;
        if let Some(content) = &patch.content {
            comment.content = content.clone();
        }
        if let Some(shape) = &patch.shape {
            comment.shape = shape.clone();
        }
        Ok(())
    }

    fn delete_comment(&mut self, id: AnnotationId) -> Result<(), BackendError> {
        for list in self.comments.values_mut() {
            if let Some(index) = list.iter().position(|a| a.id == id) {
                list.remove(index);
                return Ok(());
            }
        }
        Err(BackendError::new(format!("unknown comment {id}")))
    }

    fn resolve_comment(&mut self, id: AnnotationId, resolved: bool) -> Result<(), BackendError> {
        self.comment_mut(id)?.is_resolved = resolved;
        Ok(())
    }

    fn approve(
        &mut self,
        review: ReviewId,
        version: VersionId,
        _identity: Option<&ReviewerIdentity>,
    ) -> Result<(), BackendError> {
        if review != self.review_id {
            return Err(BackendError::new("unknown review"));
        }
        self.version_mut(version)?.status = VersionStatus::Approved;
        Ok(())
    }

    fn request_changes(
        &mut self,
        review: ReviewId,
        version: VersionId,
        _identity: Option<&ReviewerIdentity>,
    ) -> Result<(), BackendError> {
        if review != self.review_id {
            return Err(BackendError::new("unknown review"));
        }
        self.version_mut(version)?.status = VersionStatus::ChangesRequested;
        Ok(())
    }
}
