//! Document version lineage and revision budget
//!
//! Versions form a linear lineage with monotonically increasing version
//! numbers; exactly one is current. Uploading a new version is owned by an
//! external path — this module only reacts to its results.

use crate::backend::{ReviewBackend, ReviewId, ReviewKey, ReviewSnapshot};
use crate::error::ReviewResult;
use crate::store::AnnotationStore;

/// Unique identifier for a document version
pub type VersionId = uuid::Uuid;

/// Approval state of a version
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionStatus {
    Pending,
    Approved,
    ChangesRequested,
}

/// One uploaded revision of a reviewable document
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DocumentVersion {
    pub id: VersionId,

    /// Monotonically increasing within the lineage
    pub version_number: u32,

    /// Where the rasterizer loads the document from
    pub file_url: String,

    /// Exactly one version per lineage is current
    pub is_current: bool,

    pub status: VersionStatus,

    /// Revisions consumed so far in this lineage
    pub revisions_used: u32,

    /// Revision budget for the lineage
    pub revision_limit: u32,
}

impl DocumentVersion {
    /// A version is read-only to annotation mutation when it has been
    /// superseded or already approved
    pub fn read_only(&self) -> bool {
        !self.is_current || self.status == VersionStatus::Approved
    }

    /// Whether the upload affordance should be offered
    ///
    /// Read-only signal for the UI; the budget itself is enforced by the
    /// external upload path.
    pub fn can_upload_new_version(&self) -> bool {
        self.revisions_used < self.revision_limit
    }
}

/// Tracks which version is loaded and the lineage around it
///
/// Loading replaces the annotation store contents wholesale, so records
/// never leak across versions.
#[derive(Debug)]
pub struct VersionController {
    key: ReviewKey,
    review_id: Option<ReviewId>,
    loaded: Option<DocumentVersion>,
    versions: Vec<DocumentVersion>,
}

impl VersionController {
    /// Create a controller for the review addressed by `key`
    pub fn new(key: ReviewKey) -> Self {
        Self {
            key,
            review_id: None,
            loaded: None,
            versions: Vec::new(),
        }
    }

    /// Load a version, or the lineage's current one when `requested` is None
    ///
    /// Fetches the review payload, replaces the store contents with the
    /// selected version's annotations, and recomputes the read-only flag.
    pub fn load(
        &mut self,
        backend: &dyn ReviewBackend,
        store: &mut AnnotationStore,
        requested: Option<VersionId>,
    ) -> ReviewResult<()> {
        let snapshot = backend.fetch_review(&self.key, requested)?;
        store.load(backend, &snapshot.version)?;
        self.apply_snapshot(snapshot);
        Ok(())
    }

    /// Re-fetch the loaded version (or the current one if nothing is loaded)
    pub fn refresh(
        &mut self,
        backend: &dyn ReviewBackend,
        store: &mut AnnotationStore,
    ) -> ReviewResult<()> {
        let requested = self.loaded.as_ref().map(|v| v.id);
        self.load(backend, store, requested)
    }

    /// Adopt a freshly fetched payload without touching the store
    ///
    /// Used by the polling path once the merge policy has accepted the
    /// refresh.
    pub fn apply_snapshot(&mut self, snapshot: ReviewSnapshot) {
        let mut versions = snapshot.all_versions;
        versions.sort_by_key(|v| v.version_number);
        self.review_id = Some(snapshot.id);
        self.loaded = Some(snapshot.version);
        self.versions = versions;
    }

    /// The review key this controller addresses
    pub fn key(&self) -> &ReviewKey {
        &self.key
    }

    /// The review id, once a payload has been loaded
    pub fn review_id(&self) -> Option<ReviewId> {
        self.review_id
    }

    /// The currently loaded version
    pub fn loaded(&self) -> Option<&DocumentVersion> {
        self.loaded.as_ref()
    }

    /// All versions in the lineage, ascending by version number
    pub fn versions(&self) -> &[DocumentVersion] {
        &self.versions
    }

    /// Whether the loaded version rejects annotation mutation
    pub fn is_read_only(&self) -> bool {
        self.loaded.as_ref().map(|v| v.read_only()).unwrap_or(true)
    }

    /// Whether the lineage has budget for another upload
    ///
    /// Reads the lineage's current version, which carries the up-to-date
    /// revision counters even while a historical version is loaded.
    pub fn can_upload_new_version(&self) -> bool {
        self.versions
            .iter()
            .find(|v| v.is_current)
            .or(self.loaded.as_ref())
            .map(|v| v.can_upload_new_version())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    fn version(number: u32, is_current: bool, status: VersionStatus) -> DocumentVersion {
        DocumentVersion {
            id: uuid::Uuid::new_v4(),
            version_number: number,
            file_url: format!("https://files.example.com/v{number}.pdf"),
            is_current,
            status,
            revisions_used: number,
            revision_limit: 3,
        }
    }

    #[test]
    fn test_read_only_rules() {
        assert!(!version(1, true, VersionStatus::Pending).read_only());
        assert!(version(1, false, VersionStatus::Pending).read_only());
        assert!(version(1, true, VersionStatus::Approved).read_only());
        assert!(!version(1, true, VersionStatus::ChangesRequested).read_only());
    }

    #[test]
    fn test_revision_budget_gate() {
        let mut v = version(3, true, VersionStatus::Pending);
        assert!(!v.can_upload_new_version());
        v.revisions_used = 2;
        assert!(v.can_upload_new_version());
    }

    #[test]
    fn test_load_current_version() {
        let backend = MemoryBackend::new("https://files.example.com/doc.pdf", 3);
        let mut store = AnnotationStore::new();
        let mut controller = VersionController::new(ReviewKey::Id(backend.numeric_id()));

        controller.load(&backend, &mut store, None).unwrap();
        assert_eq!(controller.loaded().unwrap().version_number, 1);
        assert!(!controller.is_read_only());
        assert!(controller.can_upload_new_version());
    }

    #[test]
    fn test_historical_version_is_read_only() {
        let mut backend = MemoryBackend::new("https://files.example.com/v1.pdf", 3);
        let first = backend.current_version_id().unwrap();
        backend.push_version("https://files.example.com/v2.pdf").unwrap();

        let mut store = AnnotationStore::new();
        let mut controller = VersionController::new(ReviewKey::Id(backend.numeric_id()));
        controller.load(&backend, &mut store, Some(first)).unwrap();

        assert!(controller.is_read_only());
        assert_eq!(controller.loaded().unwrap().version_number, 1);
        // Lineage budget still reads from the current version
        assert!(controller.can_upload_new_version());
        assert_eq!(controller.versions().len(), 2);
    }
}
