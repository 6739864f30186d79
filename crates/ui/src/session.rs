//! Review session front-ends
//!
//! One engine, two thin faces: the internal reviewer tool and the public
//! client portal share the same store, tool state machine, geometry and
//! workflow, parameterized by a capability set. The host UI renders
//! toolbars, badges and the sidebar from the accessors here and feeds
//! pointer events and render completions back in.

use std::time::{Duration, Instant};

use redline_core::annotation::{Annotation, AnnotationId};
use redline_core::backend::{ReviewBackend, ReviewKey};
use redline_core::error::{ReviewError, ReviewResult};
use redline_core::geometry::{hit_test, to_percent, SurfaceBounds};
use redline_core::identity::ReviewerIdentity;
use redline_core::poll::{merge_poll, PollClock, PollMerge};
use redline_core::store::AnnotationStore;
use redline_core::version::{DocumentVersion, VersionController, VersionId};
use redline_core::workflow::ReviewWorkflow;
use redline_render::{
    PageRasterizer, PixelSurface, RasterError, RenderBridge, RenderRequest,
};

use crate::overlay::{paint_overlay, OverlayShape};
use crate::sidebar::{PageGroup, SidebarPresenter};
use crate::tools::{ActiveTool, Gesture, PendingDraft, ToolController};

/// Polling cadence of the internal reviewer view
pub const INTERNAL_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// What a front-end is allowed to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Whether annotation tools are available at all
    pub can_edit: bool,

    /// Whether actions require a captured reviewer identity
    pub requires_identity: bool,
}

impl Capabilities {
    /// Internal reviewer tool: implicit identity, edits allowed
    pub fn internal() -> Self {
        Self {
            can_edit: true,
            requires_identity: false,
        }
    }

    /// Public client portal: identity must be captured first
    pub fn client() -> Self {
        Self {
            can_edit: true,
            requires_identity: true,
        }
    }
}

/// A running review session over one engine instance
pub struct ReviewSession {
    caps: Capabilities,
    backend: Box<dyn ReviewBackend>,
    controller: VersionController,
    store: AnnotationStore,
    workflow: ReviewWorkflow,
    tools: ToolController,
    sidebar: SidebarPresenter,
    bridge: RenderBridge,
    identity: Option<ReviewerIdentity>,
    poll: Option<PollClock>,
}

impl ReviewSession {
    /// Internal reviewer session, keyed by numeric review id
    ///
    /// The identity comes implicitly from the authenticated user; the view
    /// polls for other reviewers' changes.
    pub fn internal(
        backend: Box<dyn ReviewBackend>,
        review_id: u64,
        identity: ReviewerIdentity,
    ) -> Self {
        let caps = Capabilities::internal();
        Self {
            caps,
            backend,
            controller: VersionController::new(ReviewKey::Id(review_id)),
            store: AnnotationStore::new(),
            workflow: ReviewWorkflow::new(caps.requires_identity),
            tools: ToolController::new(),
            sidebar: SidebarPresenter::new(),
            bridge: RenderBridge::new(),
            identity: Some(identity),
            poll: Some(PollClock::new(INTERNAL_POLL_INTERVAL)),
        }
    }

    /// Public client session, keyed by share token
    ///
    /// No identity yet; annotation-creating tools stay locked until one is
    /// captured with [`ReviewSession::set_identity`].
    pub fn client(backend: Box<dyn ReviewBackend>, token: String) -> Self {
        let caps = Capabilities::client();
        Self {
            caps,
            backend,
            controller: VersionController::new(ReviewKey::Token(token)),
            store: AnnotationStore::new(),
            workflow: ReviewWorkflow::new(caps.requires_identity),
            tools: ToolController::new(),
            sidebar: SidebarPresenter::new(),
            bridge: RenderBridge::new(),
            identity: None,
            poll: None,
        }
    }

    /// The session's capability set
    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    /// Capture the reviewer identity for this session
    pub fn set_identity(&mut self, identity: ReviewerIdentity) {
        self.identity = Some(identity);
    }

    /// The captured identity, if any
    pub fn identity(&self) -> Option<&ReviewerIdentity> {
        self.identity.as_ref()
    }

    /// Load the review and open its current version's document
    ///
    /// Returns the render request for the first page.
    pub fn connect(&mut self, rasterizer: &mut dyn PageRasterizer) -> ReviewResult<RenderRequest> {
        self.load_version(rasterizer, None)
    }

    /// Switch to a specific version, or the lineage's current one
    ///
    /// Replaces the annotation set wholesale, drops any in-progress
    /// gesture, and reopens the document the version points at.
    pub fn load_version(
        &mut self,
        rasterizer: &mut dyn PageRasterizer,
        requested: Option<VersionId>,
    ) -> ReviewResult<RenderRequest> {
        self.controller
            .load(self.backend.as_ref(), &mut self.store, requested)?;
        self.tools.reset();
        self.sidebar.clear_highlight();

        let file_url = self
            .controller
            .loaded()
            .map(|v| v.file_url.clone())
            .ok_or_else(|| ReviewError::Validation("no review loaded".to_string()))?;
        let info = rasterizer.load_document(&file_url).map_err(raster_err)?;
        tracing::debug!(page_count = info.page_count, "document opened");
        self.bridge.open(info).map_err(raster_err)
    }

    /// Switch the active tool
    ///
    /// In the public flow annotation-creating tools are unusable until an
    /// identity has been captured.
    pub fn set_tool(&mut self, tool: ActiveTool) -> ReviewResult<()> {
        if tool.creates_annotations() {
            if !self.caps.can_edit {
                return Err(ReviewError::ReadOnly);
            }
            if self.caps.requires_identity && self.identity.is_none() {
                return Err(ReviewError::MissingIdentity);
            }
        }
        self.tools.set_tool(tool)
    }

    /// Pointer pressed on the overlay, in viewport coordinates
    pub fn pointer_down(&mut self, x: f32, y: f32, bounds: &SurfaceBounds) -> ReviewResult<()> {
        let Some(point) = to_percent(x, y, bounds) else {
            return Ok(());
        };
        let page = self.bridge.current_page();
        if !self.caps.can_edit {
            // View-only surface: a click opens the annotation read-back
            if let Some(hit) = hit_test(&point, self.store.annotations(), page) {
                let id = hit.id;
                return self.tools.open_edit(&self.store, id);
            }
            return Ok(());
        }
        self.tools.pointer_down(&mut self.store, page, point)
    }

    /// Pointer moved with the button held
    pub fn pointer_move(&mut self, x: f32, y: f32, bounds: &SurfaceBounds) -> ReviewResult<()> {
        let Some(point) = to_percent(x, y, bounds) else {
            return Ok(());
        };
        self.tools.pointer_move(&mut self.store, point)
    }

    /// Pointer released
    pub fn pointer_up(&mut self, x: f32, y: f32, bounds: &SurfaceBounds) -> ReviewResult<()> {
        let Some(point) = to_percent(x, y, bounds) else {
            return Ok(());
        };
        self.tools.pointer_up(
            &mut self.store,
            self.backend.as_mut(),
            point,
            self.identity.as_ref(),
        )
    }

    /// Confirm the pending annotation input with its content
    pub fn submit_pending(&mut self, content: &str) -> ReviewResult<AnnotationId> {
        if !self.caps.can_edit {
            return Err(ReviewError::ReadOnly);
        }
        self.tools
            .submit_pending(&mut self.store, self.backend.as_mut(), content)
    }

    /// Discard the pending annotation input
    pub fn cancel_pending(&mut self) {
        self.tools.cancel_pending();
    }

    /// Approve the loaded version
    pub fn approve(&mut self) -> ReviewResult<()> {
        self.workflow.approve(
            self.backend.as_mut(),
            &mut self.controller,
            &mut self.store,
            self.identity.as_ref(),
        )
    }

    /// Request changes on the loaded version
    pub fn request_changes(&mut self) -> ReviewResult<()> {
        self.workflow.request_changes(
            self.backend.as_mut(),
            &mut self.controller,
            &mut self.store,
            self.identity.as_ref(),
        )
    }

    /// Drive the polling refresh
    ///
    /// Returns `true` when a refresh was applied. A refresh arriving while
    /// a gesture is active is deferred by the merge policy so the
    /// in-flight optimistic state survives.
    pub fn poll_tick(&mut self, now: Instant) -> ReviewResult<bool> {
        let Some(clock) = self.poll.as_mut() else {
            return Ok(false);
        };
        if !clock.due(now) {
            return Ok(false);
        }
        let Some(version_id) = self.store.version_id() else {
            return Ok(false);
        };
        let key = self.controller.key().clone();
        let snapshot = self.backend.fetch_review(&key, Some(version_id))?;
        let fresh = self.backend.fetch_comments(version_id)?;
        match merge_poll(self.tools.gesture_active(), fresh) {
            PollMerge::Replace(fresh) => {
                self.store.apply_refresh(&snapshot.version, fresh);
                self.controller.apply_snapshot(snapshot);
                Ok(true)
            }
            PollMerge::Deferred => Ok(false),
        }
    }

    /// Navigate to a page; `None` means the surface is already cached
    pub fn go_to_page(&mut self, page: u16) -> ReviewResult<Option<RenderRequest>> {
        self.bridge.go_to_page(page).map_err(raster_err)
    }

    /// Change the zoom level
    pub fn set_zoom(&mut self, zoom_percent: u16) -> Option<RenderRequest> {
        self.bridge.set_zoom(zoom_percent)
    }

    /// Change the device pixel ratio
    pub fn set_dpr(&mut self, dpr: f32) -> Option<RenderRequest> {
        self.bridge.set_dpr(dpr)
    }

    /// Report a finished page render; stale completions are discarded
    pub fn complete_render(&mut self, generation: u64, surface: PixelSurface) -> bool {
        self.bridge.complete(generation, surface)
    }

    /// The rendered surface for the visible page, if available
    pub fn current_surface(&self) -> Option<&PixelSurface> {
        self.bridge.current_surface()
    }

    /// Build the overlay display list for the visible page
    pub fn paint(&mut self, bounds: &SurfaceBounds, now: Instant) -> Vec<OverlayShape> {
        let highlighted = self.sidebar.highlighted(now);
        paint_overlay(
            bounds,
            self.store.annotations(),
            self.bridge.current_page(),
            highlighted,
            self.tools.tool(),
            self.tools.gesture(),
        )
    }

    /// Sidebar rows, grouped by page
    pub fn sidebar_rows(&self) -> Vec<PageGroup<'_>> {
        self.sidebar.rows(&self.store)
    }

    /// Click-to-navigate from the sidebar
    ///
    /// Jumps to the annotation's page and arms the transient overlay
    /// highlight.
    pub fn select_annotation(
        &mut self,
        id: AnnotationId,
        now: Instant,
    ) -> ReviewResult<Option<RenderRequest>> {
        let page = self
            .sidebar
            .select(&self.store, id, now)
            .ok_or(ReviewError::NotFound(id))?;
        self.bridge.go_to_page(page).map_err(raster_err)
    }

    /// Mark an annotation resolved from the sidebar
    pub fn resolve_annotation(&mut self, id: AnnotationId) -> ReviewResult<()> {
        self.sidebar
            .resolve(&mut self.store, self.backend.as_mut(), id)
    }

    /// Delete an annotation from the sidebar
    pub fn delete_annotation(&mut self, id: AnnotationId) -> ReviewResult<()> {
        self.sidebar
            .delete(&mut self.store, self.backend.as_mut(), id)
    }

    /// The active tool
    pub fn tool(&self) -> ActiveTool {
        self.tools.tool()
    }

    /// The current gesture
    pub fn gesture(&self) -> &Gesture {
        self.tools.gesture()
    }

    /// The pending annotation input, if one is open
    pub fn pending_draft(&self) -> Option<&PendingDraft> {
        self.tools.pending_draft()
    }

    /// Annotations on the visible page
    pub fn current_page_annotations(&self) -> Vec<&Annotation> {
        self.store.by_page(self.bridge.current_page())
    }

    /// Unresolved comment pins blocking approval
    pub fn unresolved_comment_count(&self) -> usize {
        self.store.unresolved_comment_count()
    }

    /// Whether the loaded version rejects annotation mutation
    pub fn is_read_only(&self) -> bool {
        self.controller.is_read_only()
    }

    /// Whether the lineage has budget for another upload
    pub fn can_upload_new_version(&self) -> bool {
        self.controller.can_upload_new_version()
    }

    /// The loaded version
    pub fn loaded_version(&self) -> Option<&DocumentVersion> {
        self.controller.loaded()
    }

    /// Every version in the lineage, ascending
    pub fn versions(&self) -> &[DocumentVersion] {
        self.controller.versions()
    }

    /// The visible page, 1-indexed
    pub fn current_page(&self) -> u16 {
        self.bridge.current_page()
    }

    /// Pages in the open document
    pub fn page_count(&self) -> u16 {
        self.bridge.page_count()
    }

    /// Current zoom in percent
    pub fn zoom_percent(&self) -> u16 {
        self.bridge.zoom_percent()
    }
}

fn raster_err(err: RasterError) -> ReviewError {
    match err {
        RasterError::InvalidPage(page) => {
            ReviewError::Validation(format!("invalid page number: {page}"))
        }
        other => ReviewError::Network(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redline_core::backend::MemoryBackend;
    use redline_render::{CancellationToken, DocumentInfo};

    struct StubRasterizer {
        pages: u16,
    }

    impl PageRasterizer for StubRasterizer {
        fn load_document(&mut self, _url: &str) -> Result<DocumentInfo, RasterError> {
            Ok(DocumentInfo {
                page_count: self.pages,
            })
        }

        fn render_page(
            &self,
            page: u16,
            scale: f32,
            token: &CancellationToken,
        ) -> Result<PixelSurface, RasterError> {
            if token.is_cancelled() {
                return Err(RasterError::Cancelled);
            }
            if page == 0 || page > self.pages {
                return Err(RasterError::InvalidPage(page));
            }
            Ok(PixelSurface::blank(
                (612.0 * scale) as u32,
                (792.0 * scale) as u32,
            ))
        }
    }

    fn identity() -> ReviewerIdentity {
        ReviewerIdentity::new("Ada", "Byron", "ada@example.com")
    }

    fn internal_session() -> (ReviewSession, StubRasterizer) {
        let backend = MemoryBackend::new("https://files.example.com/doc.pdf", 3);
        let review_id = backend.numeric_id();
        let session = ReviewSession::internal(Box::new(backend), review_id, identity());
        (session, StubRasterizer { pages: 4 })
    }

    #[test]
    fn test_connect_requests_first_page() {
        let (mut session, mut rasterizer) = internal_session();
        let request = session.connect(&mut rasterizer).unwrap();
        assert_eq!(request.page, 1);
        assert_eq!(session.page_count(), 4);
        assert!(!session.is_read_only());
    }

    #[test]
    fn test_client_tools_locked_until_identity() {
        let backend = MemoryBackend::new("https://files.example.com/doc.pdf", 3);
        let token = backend.token().to_string();
        let mut session = ReviewSession::client(Box::new(backend), token);
        let mut rasterizer = StubRasterizer { pages: 2 };
        session.connect(&mut rasterizer).unwrap();

        assert!(matches!(
            session.set_tool(ActiveTool::Pin),
            Err(ReviewError::MissingIdentity)
        ));
        assert!(session.set_tool(ActiveTool::Select).is_ok());

        session.set_identity(identity());
        assert!(session.set_tool(ActiveTool::Pin).is_ok());
    }

    #[test]
    fn test_client_approve_requires_identity_before_any_network_call() {
        let backend = MemoryBackend::new("https://files.example.com/doc.pdf", 3);
        let token = backend.token().to_string();
        let mut session = ReviewSession::client(Box::new(backend), token);
        let mut rasterizer = StubRasterizer { pages: 2 };
        session.connect(&mut rasterizer).unwrap();

        assert!(matches!(session.approve(), Err(ReviewError::MissingIdentity)));
        assert_eq!(
            session.loaded_version().unwrap().status,
            redline_core::version::VersionStatus::Pending
        );
    }

    #[test]
    fn test_poll_defers_during_gesture_and_applies_when_idle() {
        let (mut session, mut rasterizer) = internal_session();
        session.connect(&mut rasterizer).unwrap();
        let bounds = SurfaceBounds::new(0.0, 0.0, 1000.0, 1000.0);
        let start = Instant::now();

        session.set_tool(ActiveTool::Highlight).unwrap();
        session.pointer_down(100.0, 100.0, &bounds).unwrap();
        session.pointer_move(300.0, 200.0, &bounds).unwrap();

        // Mid-gesture poll is deferred
        assert!(!session.poll_tick(start).unwrap());

        session.pointer_up(300.0, 200.0, &bounds).unwrap();
        session.submit_pending("tighten kerning").unwrap();

        // Idle again: the next due tick applies
        assert!(session
            .poll_tick(start + INTERNAL_POLL_INTERVAL)
            .unwrap());
        assert_eq!(session.current_page_annotations().len(), 1);
    }

    #[test]
    fn test_version_switch_drops_gesture_and_annotations() {
        let (mut session, mut rasterizer) = internal_session();
        session.connect(&mut rasterizer).unwrap();
        let bounds = SurfaceBounds::new(0.0, 0.0, 1000.0, 1000.0);

        session.set_tool(ActiveTool::Pin).unwrap();
        session.pointer_down(500.0, 500.0, &bounds).unwrap();
        session.pointer_up(500.0, 500.0, &bounds).unwrap();
        session.submit_pending("old version note").unwrap();
        assert_eq!(session.current_page_annotations().len(), 1);

        session.set_tool(ActiveTool::Highlight).unwrap();
        session.pointer_down(100.0, 100.0, &bounds).unwrap();

        // Reloading the version drops the half-finished gesture and keeps
        // only what the collaborator has
        let loaded = session.loaded_version().unwrap().id;
        session.load_version(&mut rasterizer, Some(loaded)).unwrap();
        assert_eq!(session.gesture(), &Gesture::Idle);
        assert_eq!(session.current_page_annotations().len(), 1);
    }

    #[test]
    fn test_pointer_events_on_collapsed_surface_are_ignored() {
        let (mut session, mut rasterizer) = internal_session();
        session.connect(&mut rasterizer).unwrap();
        let collapsed = SurfaceBounds::new(0.0, 0.0, 0.0, 0.0);

        session.set_tool(ActiveTool::Pin).unwrap();
        session.pointer_down(10.0, 10.0, &collapsed).unwrap();
        assert_eq!(session.gesture(), &Gesture::Idle);
    }
}
