//! Tool and gesture state machine
//!
//! Tracks the active interaction tool and the current pointer gesture.
//! Only one gesture is active at a time; a pending annotation input must
//! be submitted or cancelled before any other interaction starts. All
//! pointer positions arrive already converted to percent space.

use redline_core::annotation::{AnnotationDraft, AnnotationId, AnnotationShape};
use redline_core::backend::ReviewBackend;
use redline_core::error::{ReviewError, ReviewResult};
use redline_core::geometry::{hit_test, is_click, normalize_rect, PercentPoint, PercentRect};
use redline_core::identity::ReviewerIdentity;
use redline_core::store::AnnotationStore;

/// The selected interaction tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveTool {
    /// Select, move and edit existing annotations
    #[default]
    Select,

    /// Place point comments
    Pin,

    /// Drag rectangular highlights
    Highlight,

    /// Drag rectangular strike-throughs
    Strike,
}

impl ActiveTool {
    /// Tools that create rectangle shapes by dragging
    pub fn is_shape_tool(&self) -> bool {
        matches!(self, ActiveTool::Highlight | ActiveTool::Strike)
    }

    /// Tools that create annotations of any kind
    pub fn creates_annotations(&self) -> bool {
        !matches!(self, ActiveTool::Select)
    }
}

/// Annotation input awaiting confirmation
#[derive(Debug, Clone, PartialEq)]
pub enum PendingDraft {
    /// A new annotation whose content has not been confirmed yet
    New(AnnotationDraft),

    /// A buffered edit of an existing annotation
    ///
    /// Nothing is applied until the edit is submitted; cancelling leaves
    /// the annotation untouched.
    Edit { id: AnnotationId, buffer: String },
}

/// The in-progress pointer interaction
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    /// Resting state, reentrant indefinitely
    #[default]
    Idle,

    /// Rubber-banding a new shape (no annotation exists yet)
    Drawing {
        page: u16,
        start: PercentPoint,
        current: PercentPoint,
    },

    /// Dragging an existing annotation; the store holds the optimistic
    /// position and the pre-drag snapshot
    Moving { id: AnnotationId, start: PercentPoint },

    /// Waiting for the user to confirm or cancel annotation input
    PendingInput(PendingDraft),
}

/// State machine driving pointer interaction on the overlay
#[derive(Debug, Default)]
pub struct ToolController {
    tool: ActiveTool,
    gesture: Gesture,
    submit_in_flight: bool,
}

impl ToolController {
    /// Create a controller with the select tool active
    pub fn new() -> Self {
        Self::default()
    }

    /// The active tool
    pub fn tool(&self) -> ActiveTool {
        self.tool
    }

    /// The current gesture
    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    /// Whether any gesture is in progress
    pub fn gesture_active(&self) -> bool {
        !matches!(self.gesture, Gesture::Idle)
    }

    /// The pending annotation input, if one is open
    pub fn pending_draft(&self) -> Option<&PendingDraft> {
        match &self.gesture {
            Gesture::PendingInput(draft) => Some(draft),
            _ => None,
        }
    }

    /// The live rubber-band rectangle while drawing
    pub fn drawing_preview(&self) -> Option<(u16, PercentRect)> {
        match &self.gesture {
            Gesture::Drawing { page, start, current } if self.tool.is_shape_tool() => {
                Some((*page, normalize_rect(start, current)))
            }
            _ => None,
        }
    }

    /// Switch the active tool
    ///
    /// Only available while idle; in particular, an open pending input
    /// must be submitted or cancelled first.
    pub fn set_tool(&mut self, tool: ActiveTool) -> ReviewResult<()> {
        if self.gesture_active() {
            return Err(ReviewError::Validation(
                "finish the current gesture before switching tools".to_string(),
            ));
        }
        self.tool = tool;
        Ok(())
    }

    /// Drop any in-progress gesture, e.g. when switching versions
    pub fn reset(&mut self) {
        self.gesture = Gesture::Idle;
        self.submit_in_flight = false;
    }

    /// Open a buffered edit of an existing annotation
    pub fn open_edit(&mut self, store: &AnnotationStore, id: AnnotationId) -> ReviewResult<()> {
        if self.gesture_active() {
            return Err(ReviewError::Validation(
                "finish the current gesture before editing".to_string(),
            ));
        }
        let annotation = store.get(id).ok_or(ReviewError::NotFound(id))?;
        self.gesture = Gesture::PendingInput(PendingDraft::Edit {
            id,
            buffer: annotation.content.clone(),
        });
        Ok(())
    }

    /// Pointer pressed on the overlay
    ///
    /// Hitting an existing annotation starts a move; moving takes
    /// precedence over starting a new shape. On read-only versions a hit
    /// opens the existing annotation for viewing instead.
    pub fn pointer_down(
        &mut self,
        store: &mut AnnotationStore,
        page: u16,
        point: PercentPoint,
    ) -> ReviewResult<()> {
        match self.gesture {
            Gesture::Idle => {}
            Gesture::PendingInput(_) => {
                return Err(ReviewError::Validation(
                    "pending annotation input must be submitted or cancelled first".to_string(),
                ))
            }
            _ => {
                return Err(ReviewError::Validation(
                    "a gesture is already in progress".to_string(),
                ))
            }
        }

        if let Some(hit) = hit_test(&point, store.annotations(), page) {
            let id = hit.id;
            let content = hit.content.clone();
            return match store.begin_move(id) {
                Ok(_) => {
                    self.gesture = Gesture::Moving { id, start: point };
                    Ok(())
                }
                // Read-only versions still allow opening the annotation
                Err(ReviewError::ReadOnly) => {
                    self.gesture =
                        Gesture::PendingInput(PendingDraft::Edit { id, buffer: content });
                    Ok(())
                }
                Err(err) => Err(err),
            };
        }

        match self.tool {
            ActiveTool::Select => Ok(()),
            ActiveTool::Pin | ActiveTool::Highlight | ActiveTool::Strike => {
                if store.is_read_only() {
                    return Err(ReviewError::ReadOnly);
                }
                self.gesture = Gesture::Drawing {
                    page,
                    start: point,
                    current: point,
                };
                Ok(())
            }
        }
    }

    /// Pointer moved with the button held
    pub fn pointer_move(
        &mut self,
        store: &mut AnnotationStore,
        point: PercentPoint,
    ) -> ReviewResult<()> {
        match &mut self.gesture {
            Gesture::Drawing { current, .. } => {
                *current = point;
                Ok(())
            }
            Gesture::Moving { id, start } => {
                let (id, dx, dy) = (*id, point.x - start.x, point.y - start.y);
                store.translate_local(id, dx, dy)
            }
            _ => Ok(()),
        }
    }

    /// Pointer released
    ///
    /// Completes a draw into a pending input (when it passes the minimum
    /// drag size), persists a move, or turns a click on an annotation into
    /// a buffered edit of it.
    pub fn pointer_up(
        &mut self,
        store: &mut AnnotationStore,
        backend: &mut dyn ReviewBackend,
        point: PercentPoint,
        identity: Option<&ReviewerIdentity>,
    ) -> ReviewResult<()> {
        match std::mem::take(&mut self.gesture) {
            Gesture::Drawing { page, start, .. } => {
                self.finish_drawing(page, start, point, identity)
            }
            Gesture::Moving { id, start } => {
                if is_click(&start, &point) {
                    store.cancel_move(id);
                    let buffer = store
                        .get(id)
                        .map(|a| a.content.clone())
                        .ok_or(ReviewError::NotFound(id))?;
                    self.gesture = Gesture::PendingInput(PendingDraft::Edit { id, buffer });
                    Ok(())
                } else {
                    store.commit_move(backend, id)
                }
            }
            gesture => {
                self.gesture = gesture;
                Ok(())
            }
        }
    }

    /// Confirm the pending input
    ///
    /// Creates the drafted annotation or applies the buffered edit. Only
    /// one submit may be in flight per pending draft; a collaborator
    /// failure keeps the input open so the user can retry or cancel.
    pub fn submit_pending(
        &mut self,
        store: &mut AnnotationStore,
        backend: &mut dyn ReviewBackend,
        content: &str,
    ) -> ReviewResult<AnnotationId> {
        if self.submit_in_flight {
            return Err(ReviewError::Validation(
                "a submit is already in flight for this draft".to_string(),
            ));
        }
        let pending = match &self.gesture {
            Gesture::PendingInput(pending) => pending.clone(),
            _ => {
                return Err(ReviewError::Validation(
                    "no pending annotation input".to_string(),
                ))
            }
        };

        self.submit_in_flight = true;
        let result = match pending {
            PendingDraft::New(mut draft) => {
                draft.content = content.to_string();
                store.create(backend, draft).map(|a| a.id)
            }
            PendingDraft::Edit { id, .. } => {
                store.update_content(backend, id, content).map(|_| id)
            }
        };
        self.submit_in_flight = false;

        match result {
            Ok(id) => {
                self.gesture = Gesture::Idle;
                Ok(id)
            }
            Err(err) => Err(err),
        }
    }

    /// Discard the pending input
    ///
    /// For a buffered edit nothing was applied, so the annotation is left
    /// exactly as it was.
    pub fn cancel_pending(&mut self) {
        if matches!(self.gesture, Gesture::PendingInput(_)) {
            self.gesture = Gesture::Idle;
            self.submit_in_flight = false;
        }
    }

    fn finish_drawing(
        &mut self,
        page: u16,
        start: PercentPoint,
        end: PercentPoint,
        identity: Option<&ReviewerIdentity>,
    ) -> ReviewResult<()> {
        match self.tool {
            ActiveTool::Pin => {
                if is_click(&start, &end) {
                    let identity = identity.ok_or(ReviewError::MissingIdentity)?;
                    let draft = AnnotationDraft::new(
                        page,
                        AnnotationShape::Comment { at: start },
                        identity,
                    );
                    self.gesture = Gesture::PendingInput(PendingDraft::New(draft));
                }
                Ok(())
            }
            ActiveTool::Highlight | ActiveTool::Strike => {
                if is_click(&start, &end) {
                    // Too small to be a shape; treated as a click
                    return Ok(());
                }
                let identity = identity.ok_or(ReviewError::MissingIdentity)?;
                let rect = normalize_rect(&start, &end);
                let shape = match self.tool {
                    ActiveTool::Highlight => AnnotationShape::Highlight { rect },
                    _ => AnnotationShape::Strike { rect },
                };
                let draft = AnnotationDraft::new(page, shape, identity);
                self.gesture = Gesture::PendingInput(PendingDraft::New(draft));
                Ok(())
            }
            ActiveTool::Select => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redline_core::backend::{MemoryBackend, ReviewKey};
    use redline_core::geometry::MIN_DRAG_EXTENT;

    fn identity() -> ReviewerIdentity {
        ReviewerIdentity::new("Ada", "Byron", "ada@example.com")
    }

    fn setup() -> (MemoryBackend, AnnotationStore, ToolController) {
        let backend = MemoryBackend::new("https://files.example.com/doc.pdf", 3);
        let snapshot = backend
            .fetch_review(&ReviewKey::Id(backend.numeric_id()), None)
            .unwrap();
        let mut store = AnnotationStore::new();
        store.load(&backend, &snapshot.version).unwrap();
        (backend, store, ToolController::new())
    }

    fn point(x: f32, y: f32) -> PercentPoint {
        PercentPoint::new(x, y)
    }

    #[test]
    fn test_drag_creates_pending_highlight() {
        let (mut backend, mut store, mut tools) = setup();
        let ada = identity();
        tools.set_tool(ActiveTool::Highlight).unwrap();

        tools.pointer_down(&mut store, 1, point(10.0, 10.0)).unwrap();
        tools.pointer_move(&mut store, point(30.0, 15.0)).unwrap();
        assert_eq!(
            tools.drawing_preview(),
            Some((1, PercentRect::new(10.0, 10.0, 20.0, 5.0)))
        );
        tools
            .pointer_up(&mut store, &mut backend, point(30.0, 15.0), Some(&ada))
            .unwrap();

        let Some(PendingDraft::New(draft)) = tools.pending_draft() else {
            panic!("expected a pending draft");
        };
        assert_eq!(
            draft.shape,
            AnnotationShape::Highlight {
                rect: PercentRect::new(10.0, 10.0, 20.0, 5.0)
            }
        );
        // Nothing persisted until the input is confirmed
        assert!(store.is_empty());

        tools.submit_pending(&mut store, &mut backend, "").unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(tools.gesture(), &Gesture::Idle);
    }

    #[test]
    fn test_sub_threshold_drag_creates_nothing() {
        let (mut backend, mut store, mut tools) = setup();
        let ada = identity();
        for tool in [ActiveTool::Highlight, ActiveTool::Strike] {
            tools.set_tool(tool).unwrap();
            tools.pointer_down(&mut store, 1, point(10.0, 10.0)).unwrap();
            let end = point(10.0 + MIN_DRAG_EXTENT * 0.5, 10.0 + MIN_DRAG_EXTENT * 0.5);
            tools
                .pointer_up(&mut store, &mut backend, end, Some(&ada))
                .unwrap();
            assert_eq!(tools.gesture(), &Gesture::Idle);
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_pin_click_opens_pending_input() {
        let (mut backend, mut store, mut tools) = setup();
        let ada = identity();
        tools.set_tool(ActiveTool::Pin).unwrap();

        tools.pointer_down(&mut store, 2, point(40.0, 60.0)).unwrap();
        tools
            .pointer_up(&mut store, &mut backend, point(40.0, 60.0), Some(&ada))
            .unwrap();
        assert!(matches!(
            tools.pending_draft(),
            Some(PendingDraft::New(draft)) if draft.shape.is_comment() && draft.page == 2
        ));

        // Empty content is rejected and the input stays open
        assert!(matches!(
            tools.submit_pending(&mut store, &mut backend, "  "),
            Err(ReviewError::Validation(_))
        ));
        assert!(tools.pending_draft().is_some());

        tools
            .submit_pending(&mut store, &mut backend, "wrong logo")
            .unwrap();
        assert_eq!(store.by_page(2).len(), 1);
    }

    #[test]
    fn test_move_takes_precedence_over_drawing() {
        let (mut backend, mut store, mut tools) = setup();
        let ada = identity();
        tools.set_tool(ActiveTool::Highlight).unwrap();
        tools.pointer_down(&mut store, 1, point(10.0, 10.0)).unwrap();
        tools.pointer_move(&mut store, point(30.0, 20.0)).unwrap();
        tools
            .pointer_up(&mut store, &mut backend, point(30.0, 20.0), Some(&ada))
            .unwrap();
        tools.submit_pending(&mut store, &mut backend, "").unwrap();
        let id = store.annotations()[0].id;

        // Pressing inside the existing rectangle starts a move, not a draw
        tools.pointer_down(&mut store, 1, point(15.0, 15.0)).unwrap();
        assert!(matches!(tools.gesture(), Gesture::Moving { .. }));

        tools.pointer_move(&mut store, point(25.0, 15.0)).unwrap();
        tools
            .pointer_up(&mut store, &mut backend, point(25.0, 15.0), Some(&ada))
            .unwrap();
        assert_eq!(
            store.get(id).unwrap().shape,
            AnnotationShape::Highlight {
                rect: PercentRect::new(20.0, 10.0, 20.0, 10.0)
            }
        );
    }

    #[test]
    fn test_click_on_annotation_opens_buffered_edit() {
        let (mut backend, mut store, mut tools) = setup();
        let ada = identity();
        tools.set_tool(ActiveTool::Pin).unwrap();
        tools.pointer_down(&mut store, 1, point(50.0, 50.0)).unwrap();
        tools
            .pointer_up(&mut store, &mut backend, point(50.0, 50.0), Some(&ada))
            .unwrap();
        tools
            .submit_pending(&mut store, &mut backend, "first pass")
            .unwrap();
        let id = store.annotations()[0].id;

        tools.set_tool(ActiveTool::Select).unwrap();
        tools.pointer_down(&mut store, 1, point(50.5, 50.5)).unwrap();
        tools
            .pointer_up(&mut store, &mut backend, point(50.5, 50.5), Some(&ada))
            .unwrap();
        assert_eq!(
            tools.pending_draft(),
            Some(&PendingDraft::Edit {
                id,
                buffer: "first pass".to_string()
            })
        );

        // Cancelling applies nothing
        tools.cancel_pending();
        assert_eq!(store.get(id).unwrap().content, "first pass");

        tools.open_edit(&store, id).unwrap();
        tools
            .submit_pending(&mut store, &mut backend, "second pass")
            .unwrap();
        assert_eq!(store.get(id).unwrap().content, "second pass");
    }

    #[test]
    fn test_tool_switch_blocked_while_pending() {
        let (mut backend, mut store, mut tools) = setup();
        let ada = identity();
        tools.set_tool(ActiveTool::Pin).unwrap();
        tools.pointer_down(&mut store, 1, point(10.0, 10.0)).unwrap();
        tools
            .pointer_up(&mut store, &mut backend, point(10.0, 10.0), Some(&ada))
            .unwrap();

        assert!(tools.set_tool(ActiveTool::Select).is_err());
        assert!(tools
            .pointer_down(&mut store, 1, point(70.0, 70.0))
            .is_err());

        tools.cancel_pending();
        assert!(tools.set_tool(ActiveTool::Select).is_ok());
    }

    #[test]
    fn test_drawing_blocked_without_identity() {
        let (mut backend, mut store, mut tools) = setup();
        tools.set_tool(ActiveTool::Pin).unwrap();
        tools.pointer_down(&mut store, 1, point(10.0, 10.0)).unwrap();
        let result = tools.pointer_up(&mut store, &mut backend, point(10.0, 10.0), None);
        assert!(matches!(result, Err(ReviewError::MissingIdentity)));
        assert_eq!(tools.gesture(), &Gesture::Idle);
    }
}
