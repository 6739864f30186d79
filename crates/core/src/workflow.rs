//! Approve / request-changes orchestration
//!
//! The workflow holds no status of its own: outcomes become visible only
//! through the version controller's reloaded state. Gates fire before any
//! collaborator call so a blocked action never produces network traffic.

use crate::backend::ReviewBackend;
use crate::error::{ReviewError, ReviewResult};
use crate::identity::ReviewerIdentity;
use crate::store::AnnotationStore;
use crate::version::VersionController;

/// Drives the approval protocol for one review
#[derive(Debug)]
pub struct ReviewWorkflow {
    identity_required: bool,
}

impl ReviewWorkflow {
    /// Create a workflow; the public flow requires a captured identity
    pub fn new(identity_required: bool) -> Self {
        Self { identity_required }
    }

    /// Whether actions require a reviewer identity
    pub fn identity_required(&self) -> bool {
        self.identity_required
    }

    /// Approve the loaded version
    ///
    /// Fails with `MissingIdentity` before any collaborator call when the
    /// flow requires an identity that has not been captured, and with
    /// `PendingComments` while any unresolved comment exists. Highlights
    /// and strikes never block approval.
    pub fn approve(
        &self,
        backend: &mut dyn ReviewBackend,
        controller: &mut VersionController,
        store: &mut AnnotationStore,
        identity: Option<&ReviewerIdentity>,
    ) -> ReviewResult<()> {
        self.check_identity(identity)?;
        let unresolved = store.unresolved_comment_count();
        if unresolved > 0 {
            return Err(ReviewError::PendingComments { unresolved });
        }
        let (review, version) = Self::target(controller)?;
        backend.approve(review, version, identity)?;
        controller.refresh(backend, store)
    }

    /// Request changes on the loaded version
    ///
    /// Permitted regardless of comment resolution state.
    pub fn request_changes(
        &self,
        backend: &mut dyn ReviewBackend,
        controller: &mut VersionController,
        store: &mut AnnotationStore,
        identity: Option<&ReviewerIdentity>,
    ) -> ReviewResult<()> {
        self.check_identity(identity)?;
        let (review, version) = Self::target(controller)?;
        backend.request_changes(review, version, identity)?;
        controller.refresh(backend, store)
    }

    fn check_identity(&self, identity: Option<&ReviewerIdentity>) -> ReviewResult<()> {
        if self.identity_required && identity.is_none() {
            return Err(ReviewError::MissingIdentity);
        }
        Ok(())
    }

    fn target(
        controller: &VersionController,
    ) -> ReviewResult<(crate::backend::ReviewId, crate::version::VersionId)> {
        let review = controller.review_id().ok_or_else(|| {
            ReviewError::Validation("no review loaded".to_string())
        })?;
        let version = controller
            .loaded()
            .map(|v| v.id)
            .ok_or_else(|| ReviewError::Validation("no review loaded".to_string()))?;
        Ok((review, version))
    }
}
