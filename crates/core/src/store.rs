//! In-memory annotation set for the loaded document version
//!
//! The store is the single mutable shared structure in the engine. It is
//! mutated by the tool state machine (create/update/delete) and by the
//! polling refresh (wholesale replacement); everything else only reads.
//! Every mutation is mirrored to the persistence collaborator before it is
//! considered committed, except the optimistic move-drag which keeps a
//! snapshot for rollback.

use std::collections::BTreeMap;

use crate::annotation::{Annotation, AnnotationDraft, AnnotationId};
use crate::backend::{CommentPatch, ReviewBackend};
use crate::error::{ReviewError, ReviewResult};
use crate::version::{DocumentVersion, VersionId};

/// Annotations for the currently loaded version, in creation order
#[derive(Debug, Default)]
pub struct AnnotationStore {
    version_id: Option<VersionId>,
    read_only: bool,
    annotations: Vec<Annotation>,

    /// Pre-drag state of the annotation being moved, kept until the
    /// collaborator acknowledges the new position
    move_snapshot: Option<Annotation>,
}

impl AnnotationStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the loaded set with the given version's annotations
    ///
    /// Wholesale replacement: nothing from a previously loaded version
    /// survives. Loading twice with no mutations in between yields an
    /// identical set.
    pub fn load(
        &mut self,
        backend: &dyn ReviewBackend,
        version: &DocumentVersion,
    ) -> ReviewResult<()> {
        let annotations = backend.fetch_comments(version.id)?;
        self.version_id = Some(version.id);
        self.read_only = version.read_only();
        self.annotations = annotations;
        self.move_snapshot = None;
        Ok(())
    }

    /// Id of the loaded version
    pub fn version_id(&self) -> Option<VersionId> {
        self.version_id
    }

    /// Whether the loaded version rejects content/geometry mutation
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// All loaded annotations, in creation order
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Look up an annotation by id
    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    /// Number of loaded annotations
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    /// Whether the store holds no annotations
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Annotations on one page, insertion order preserved
    pub fn by_page(&self, page: u16) -> Vec<&Annotation> {
        self.annotations.iter().filter(|a| a.page == page).collect()
    }

    /// Annotations grouped by page, pages ascending numerically
    pub fn group_by_page(&self) -> BTreeMap<u16, Vec<&Annotation>> {
        let mut groups: BTreeMap<u16, Vec<&Annotation>> = BTreeMap::new();
        for annotation in &self.annotations {
            groups.entry(annotation.page).or_default().push(annotation);
        }
        groups
    }

    /// Unresolved comment pins on the loaded version
    ///
    /// Only comments gate approval; highlights and strikes never block it.
    pub fn unresolved_comment_count(&self) -> usize {
        self.annotations
            .iter()
            .filter(|a| a.shape.is_comment() && !a.is_resolved)
            .count()
    }

    /// Persist a confirmed draft and append the collaborator's record
    pub fn create(
        &mut self,
        backend: &mut dyn ReviewBackend,
        draft: AnnotationDraft,
    ) -> ReviewResult<Annotation> {
        if self.read_only {
            return Err(ReviewError::ReadOnly);
        }
        draft.validate()?;
        let version_id = self.loaded_version()?;
        let annotation = backend.create_comment(version_id, &draft)?;
        self.annotations.push(annotation.clone());
        Ok(annotation)
    }

    /// Replace an annotation's content
    ///
    /// Edits are buffered by the caller and applied only after the
    /// collaborator acknowledges them.
    pub fn update_content(
        &mut self,
        backend: &mut dyn ReviewBackend,
        id: AnnotationId,
        content: &str,
    ) -> ReviewResult<()> {
        if self.read_only {
            return Err(ReviewError::ReadOnly);
        }
        let annotation = self.get(id).ok_or(ReviewError::NotFound(id))?;
        if annotation.shape.is_comment() && content.trim().is_empty() {
            return Err(ReviewError::Validation(
                "comment content must not be empty".to_string(),
            ));
        }
        backend.update_comment(id, &CommentPatch::content(content))?;
        if let Some(annotation) = self.annotations.iter_mut().find(|a| a.id == id) {
            annotation.content = content.to_string();
        }
        Ok(())
    }

    /// Toggle the resolved flag
    ///
    /// Permitted on read-only versions: resolution is reviewer
    /// bookkeeping, not a content edit.
    pub fn set_resolved(
        &mut self,
        backend: &mut dyn ReviewBackend,
        id: AnnotationId,
        resolved: bool,
    ) -> ReviewResult<()> {
        if self.get(id).is_none() {
            return Err(ReviewError::NotFound(id));
        }
        backend.resolve_comment(id, resolved)?;
        if let Some(annotation) = self.annotations.iter_mut().find(|a| a.id == id) {
            annotation.is_resolved = resolved;
        }
        Ok(())
    }

    /// Delete an annotation
    ///
    /// Not idempotent: deleting an id that is no longer present is a
    /// `NotFound` error. Permitted on read-only versions.
    pub fn remove(&mut self, backend: &mut dyn ReviewBackend, id: AnnotationId) -> ReviewResult<()> {
        let index = self
            .annotations
            .iter()
            .position(|a| a.id == id)
            .ok_or(ReviewError::NotFound(id))?;
        backend.delete_comment(id)?;
        self.annotations.remove(index);
        if self.move_snapshot.as_ref().is_some_and(|s| s.id == id) {
            self.move_snapshot = None;
        }
        Ok(())
    }

    /// Begin a move-drag, snapshotting the pre-drag state
    ///
    /// Returns a copy of the annotation as it stood before the drag.
    pub fn begin_move(&mut self, id: AnnotationId) -> ReviewResult<Annotation> {
        if self.read_only {
            return Err(ReviewError::ReadOnly);
        }
        if self.move_snapshot.is_some() {
            return Err(ReviewError::Validation(
                "another move is already in progress".to_string(),
            ));
        }
        let annotation = self.get(id).ok_or(ReviewError::NotFound(id))?.clone();
        self.move_snapshot = Some(annotation.clone());
        Ok(annotation)
    }

    /// Apply the current drag delta to the in-memory record only
    ///
    /// The delta is measured from the gesture start, against the snapshot,
    /// so repeated pointer-move events do not accumulate drift. Paint
    /// reads the store, so the drag is visible in real time.
    pub fn translate_local(&mut self, id: AnnotationId, dx: f32, dy: f32) -> ReviewResult<()> {
        let snapshot = match &self.move_snapshot {
            Some(snapshot) if snapshot.id == id => snapshot.clone(),
            _ => {
                return Err(ReviewError::Validation(
                    "no move in progress for this annotation".to_string(),
                ))
            }
        };
        let annotation = self
            .annotations
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(ReviewError::NotFound(id))?;
        annotation.shape = snapshot.shape.translated(dx, dy);
        Ok(())
    }

    /// Persist the dragged position
    ///
    /// On collaborator failure the pre-drag snapshot is restored, so the
    /// in-memory state never diverges from the server.
    pub fn commit_move(
        &mut self,
        backend: &mut dyn ReviewBackend,
        id: AnnotationId,
    ) -> ReviewResult<()> {
        let snapshot = match self.move_snapshot.take() {
            Some(snapshot) if snapshot.id == id => snapshot,
            other => {
                self.move_snapshot = other;
                return Err(ReviewError::Validation(
                    "no move in progress for this annotation".to_string(),
                ));
            }
        };
        let shape = self
            .get(id)
            .ok_or(ReviewError::NotFound(id))?
            .shape
            .clone();
        if let Err(err) = backend.update_comment(id, &CommentPatch::position(shape)) {
            tracing::warn!(%id, "position update failed, restoring pre-drag state");
            if let Some(annotation) = self.annotations.iter_mut().find(|a| a.id == id) {
                annotation.shape = snapshot.shape;
            }
            return Err(err.into());
        }
        Ok(())
    }

    /// Abandon a move-drag, restoring the pre-drag state
    pub fn cancel_move(&mut self, id: AnnotationId) {
        if let Some(snapshot) = self.move_snapshot.take() {
            if snapshot.id == id {
                if let Some(annotation) = self.annotations.iter_mut().find(|a| a.id == id) {
                    annotation.shape = snapshot.shape;
                }
            } else {
                self.move_snapshot = Some(snapshot);
            }
        }
    }

    /// Whether a move-drag is in flight
    pub fn move_in_progress(&self) -> bool {
        self.move_snapshot.is_some()
    }

    /// Adopt a polled refresh accepted by the merge policy
    ///
    /// The polling path never writes to the store directly; it goes
    /// through the merge policy and then this method. The fetched version
    /// rides along so the read-only flag tracks status changes made by
    /// other reviewers.
    pub fn apply_refresh(&mut self, version: &DocumentVersion, annotations: Vec<Annotation>) {
        self.version_id = Some(version.id);
        self.read_only = version.read_only();
        self.annotations = annotations;
        self.move_snapshot = None;
    }

    fn loaded_version(&self) -> ReviewResult<VersionId> {
        self.version_id.ok_or_else(|| {
            ReviewError::Validation("no document version loaded".to_string())
        })
    }
}
