//! Sidebar presenter
//!
//! Groups the loaded annotations by page for the list view and tracks the
//! transient highlight used for click-to-navigate. Resolve and delete are
//! separate actions: resolving toggles the bookkeeping flag, deleting
//! removes the record.

use std::time::{Duration, Instant};

use redline_core::annotation::{Annotation, AnnotationId};
use redline_core::backend::ReviewBackend;
use redline_core::error::ReviewResult;
use redline_core::store::AnnotationStore;

/// How long a selected annotation stays highlighted on the overlay
pub const HIGHLIGHT_LINGER: Duration = Duration::from_secs(3);

/// One page's worth of sidebar entries, creation order preserved
#[derive(Debug)]
pub struct PageGroup<'a> {
    pub page: u16,
    pub annotations: Vec<&'a Annotation>,
}

/// Sidebar list state
#[derive(Debug, Default)]
pub struct SidebarPresenter {
    highlighted: Option<(AnnotationId, Instant)>,
}

impl SidebarPresenter {
    /// Create an empty presenter
    pub fn new() -> Self {
        Self::default()
    }

    /// The grouped list view: pages ascending numerically (page 2 before
    /// page 10), creation order within each page
    pub fn rows<'a>(&self, store: &'a AnnotationStore) -> Vec<PageGroup<'a>> {
        store
            .group_by_page()
            .into_iter()
            .map(|(page, annotations)| PageGroup { page, annotations })
            .collect()
    }

    /// Select an annotation from the list
    ///
    /// Returns the page to navigate to and arms the transient overlay
    /// highlight; unknown ids return `None`.
    pub fn select(
        &mut self,
        store: &AnnotationStore,
        id: AnnotationId,
        now: Instant,
    ) -> Option<u16> {
        let page = store.get(id)?.page;
        self.highlighted = Some((id, now));
        Some(page)
    }

    /// The annotation currently highlighted on the overlay
    ///
    /// Auto-clears once [`HIGHLIGHT_LINGER`] has elapsed.
    pub fn highlighted(&mut self, now: Instant) -> Option<AnnotationId> {
        match self.highlighted {
            Some((id, since)) if now.duration_since(since) < HIGHLIGHT_LINGER => Some(id),
            Some(_) => {
                self.highlighted = None;
                None
            }
            None => None,
        }
    }

    /// Drop the transient highlight early
    pub fn clear_highlight(&mut self) {
        self.highlighted = None;
    }

    /// Mark an annotation resolved
    pub fn resolve(
        &self,
        store: &mut AnnotationStore,
        backend: &mut dyn ReviewBackend,
        id: AnnotationId,
    ) -> ReviewResult<()> {
        store.set_resolved(backend, id, true)
    }

    /// Reopen a resolved annotation
    pub fn reopen(
        &self,
        store: &mut AnnotationStore,
        backend: &mut dyn ReviewBackend,
        id: AnnotationId,
    ) -> ReviewResult<()> {
        store.set_resolved(backend, id, false)
    }

    /// Delete an annotation from the list
    pub fn delete(
        &self,
        store: &mut AnnotationStore,
        backend: &mut dyn ReviewBackend,
        id: AnnotationId,
    ) -> ReviewResult<()> {
        store.remove(backend, id)
    }
}
