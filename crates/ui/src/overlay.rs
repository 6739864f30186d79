//! Overlay paint-instruction generation
//!
//! Translates the loaded annotations and the in-progress gesture into a
//! display list of pixel-space shapes. The host clears the overlay surface
//! and paints the returned list in order; the engine never touches a
//! drawing API itself.

use redline_core::annotation::{Annotation, AnnotationId, AnnotationShape};
use redline_core::geometry::{
    normalize_rect, project_point, project_rect, PercentRect, PixelRect, SurfaceBounds,
};

use crate::tools::{ActiveTool, Gesture, PendingDraft};

/// Pin radius in pixels
pub const PIN_RADIUS_PX: f32 = 9.0;

/// RGBA color value, components 0.0 to 1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// Create a new color from RGBA values
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Accent tone for unresolved comment pins
    pub const ACCENT: Color = Color::rgba(0.91, 0.36, 0.14, 1.0);

    /// Muted tone for resolved annotations
    pub const MUTED: Color = Color::rgba(0.55, 0.55, 0.58, 1.0);

    /// Translucent fill for highlights
    pub const HIGHLIGHT_FILL: Color = Color::rgba(0.98, 0.85, 0.25, 0.35);

    /// Translucent fill for strike-throughs
    pub const STRIKE_FILL: Color = Color::rgba(0.86, 0.18, 0.18, 0.35);

    /// Translucent fill for resolved shapes
    pub const MUTED_FILL: Color = Color::rgba(0.55, 0.55, 0.58, 0.25);

    /// Outline for the highlighted/selected annotation
    pub const SELECTION_OUTLINE: Color = Color::rgba(0.16, 0.47, 0.96, 1.0);

    /// Ghost fill for uncommitted shapes
    pub const GHOST_FILL: Color = Color::rgba(0.35, 0.45, 0.65, 0.20);

    /// Ghost outline for uncommitted shapes
    pub const GHOST_OUTLINE: Color = Color::rgba(0.35, 0.45, 0.65, 0.9);
}

/// How a shape is painted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintStyle {
    pub fill: Color,
    pub outline: Option<Color>,
    pub dashed: bool,
}

/// One paint instruction in pixel space
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayShape {
    /// Comment pin
    Pin {
        x: f32,
        y: f32,
        radius: f32,
        style: PaintStyle,
    },

    /// Highlight or strike rectangle
    Rectangle { rect: PixelRect, style: PaintStyle },
}

/// Build the display list for one page of the overlay
///
/// Committed annotations paint first (accent when unresolved, muted when
/// resolved, with an extra outline on the highlighted one), then the
/// uncommitted ghost: either the live rubber-band preview or the pending
/// draft, dashed so it reads as provisional.
pub fn paint_overlay(
    bounds: &SurfaceBounds,
    annotations: &[Annotation],
    page: u16,
    highlighted: Option<AnnotationId>,
    tool: ActiveTool,
    gesture: &Gesture,
) -> Vec<OverlayShape> {
    let mut shapes = Vec::new();

    for annotation in annotations.iter().filter(|a| a.page == page) {
        let outline = (highlighted == Some(annotation.id)).then_some(Color::SELECTION_OUTLINE);
        shapes.push(committed_shape(annotation, bounds, outline));
    }

    match gesture {
        Gesture::Drawing { page: gesture_page, start, current }
            if *gesture_page == page && tool.is_shape_tool() =>
        {
            shapes.push(ghost_rect(&normalize_rect(start, current), bounds));
        }
        Gesture::PendingInput(PendingDraft::New(draft)) if draft.page == page => {
            shapes.push(ghost_shape(&draft.shape, bounds));
        }
        _ => {}
    }

    shapes
}

fn committed_shape(
    annotation: &Annotation,
    bounds: &SurfaceBounds,
    outline: Option<Color>,
) -> OverlayShape {
    match &annotation.shape {
        AnnotationShape::Comment { at } => {
            let (x, y) = project_point(at, bounds);
            OverlayShape::Pin {
                x,
                y,
                radius: PIN_RADIUS_PX,
                style: PaintStyle {
                    fill: if annotation.is_resolved {
                        Color::MUTED
                    } else {
                        Color::ACCENT
                    },
                    outline,
                    dashed: false,
                },
            }
        }
        AnnotationShape::Highlight { rect } => OverlayShape::Rectangle {
            rect: project_rect(rect, bounds),
            style: PaintStyle {
                fill: if annotation.is_resolved {
                    Color::MUTED_FILL
                } else {
                    Color::HIGHLIGHT_FILL
                },
                outline,
                dashed: false,
            },
        },
        AnnotationShape::Strike { rect } => OverlayShape::Rectangle {
            rect: project_rect(rect, bounds),
            style: PaintStyle {
                fill: if annotation.is_resolved {
                    Color::MUTED_FILL
                } else {
                    Color::STRIKE_FILL
                },
                outline,
                dashed: false,
            },
        },
    }
}

fn ghost_shape(shape: &AnnotationShape, bounds: &SurfaceBounds) -> OverlayShape {
    match shape {
        AnnotationShape::Comment { at } => {
            let (x, y) = project_point(at, bounds);
            OverlayShape::Pin {
                x,
                y,
                radius: PIN_RADIUS_PX,
                style: PaintStyle {
                    fill: Color::GHOST_FILL,
                    outline: Some(Color::GHOST_OUTLINE),
                    dashed: true,
                },
            }
        }
        AnnotationShape::Highlight { rect } | AnnotationShape::Strike { rect } => {
            ghost_rect(rect, bounds)
        }
    }
}

fn ghost_rect(rect: &PercentRect, bounds: &SurfaceBounds) -> OverlayShape {
    OverlayShape::Rectangle {
        rect: project_rect(rect, bounds),
        style: PaintStyle {
            fill: Color::GHOST_FILL,
            outline: Some(Color::GHOST_OUTLINE),
            dashed: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redline_core::annotation::AnnotationDraft;
    use redline_core::geometry::PercentPoint;
    use redline_core::identity::ReviewerIdentity;

    fn bounds() -> SurfaceBounds {
        SurfaceBounds::new(0.0, 0.0, 1000.0, 500.0)
    }

    fn comment(page: u16, x: f32, y: f32, resolved: bool) -> Annotation {
        Annotation {
            id: uuid::Uuid::new_v4(),
            page,
            shape: AnnotationShape::Comment {
                at: PercentPoint::new(x, y),
            },
            content: "note".to_string(),
            author_name: "Ada Byron".to_string(),
            author_email: "ada@example.com".to_string(),
            is_resolved: resolved,
            created_at: 0,
        }
    }

    #[test]
    fn test_only_current_page_is_painted() {
        let annotations = vec![comment(1, 50.0, 50.0, false), comment(2, 10.0, 10.0, false)];
        let shapes = paint_overlay(
            &bounds(),
            &annotations,
            1,
            None,
            ActiveTool::Select,
            &Gesture::Idle,
        );
        assert_eq!(shapes.len(), 1);
    }

    #[test]
    fn test_resolved_comment_paints_muted() {
        let annotations = vec![comment(1, 50.0, 50.0, true)];
        let shapes = paint_overlay(
            &bounds(),
            &annotations,
            1,
            None,
            ActiveTool::Select,
            &Gesture::Idle,
        );
        let OverlayShape::Pin { style, .. } = &shapes[0] else {
            panic!("expected a pin");
        };
        assert_eq!(style.fill, Color::MUTED);
    }

    #[test]
    fn test_highlighted_annotation_gets_outline() {
        let annotation = comment(1, 50.0, 50.0, false);
        let id = annotation.id;
        let shapes = paint_overlay(
            &bounds(),
            &[annotation],
            1,
            Some(id),
            ActiveTool::Select,
            &Gesture::Idle,
        );
        let OverlayShape::Pin { style, .. } = &shapes[0] else {
            panic!("expected a pin");
        };
        assert_eq!(style.outline, Some(Color::SELECTION_OUTLINE));
    }

    #[test]
    fn test_pin_projection_tracks_surface_size() {
        let annotations = vec![comment(1, 25.0, 50.0, false)];
        let small = paint_overlay(
            &SurfaceBounds::new(0.0, 0.0, 400.0, 200.0),
            &annotations,
            1,
            None,
            ActiveTool::Select,
            &Gesture::Idle,
        );
        let large = paint_overlay(
            &SurfaceBounds::new(0.0, 0.0, 800.0, 400.0),
            &annotations,
            1,
            None,
            ActiveTool::Select,
            &Gesture::Idle,
        );
        let (OverlayShape::Pin { x: sx, y: sy, .. }, OverlayShape::Pin { x: lx, y: ly, .. }) =
            (&small[0], &large[0])
        else {
            panic!("expected pins");
        };
        assert!((lx - sx * 2.0).abs() < 1e-3);
        assert!((ly - sy * 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_drawing_preview_is_dashed_ghost() {
        let gesture = Gesture::Drawing {
            page: 1,
            start: PercentPoint::new(10.0, 10.0),
            current: PercentPoint::new(30.0, 20.0),
        };
        let shapes = paint_overlay(
            &bounds(),
            &[],
            1,
            None,
            ActiveTool::Highlight,
            &gesture,
        );
        let OverlayShape::Rectangle { rect, style } = &shapes[0] else {
            panic!("expected a rectangle");
        };
        assert!(style.dashed);
        assert_eq!(rect.x, 100.0);
        assert_eq!(rect.width, 200.0);

        // The preview belongs to page 1 only
        assert!(paint_overlay(&bounds(), &[], 2, None, ActiveTool::Highlight, &gesture).is_empty());
    }

    #[test]
    fn test_pending_draft_paints_as_ghost() {
        let identity = ReviewerIdentity::new("Ada", "Byron", "ada@example.com");
        let draft = AnnotationDraft::new(
            1,
            AnnotationShape::Comment {
                at: PercentPoint::new(40.0, 40.0),
            },
            &identity,
        );
        let gesture = Gesture::PendingInput(PendingDraft::New(draft));
        let shapes = paint_overlay(&bounds(), &[], 1, None, ActiveTool::Pin, &gesture);
        let OverlayShape::Pin { style, .. } = &shapes[0] else {
            panic!("expected a pin");
        };
        assert!(style.dashed);
        assert_eq!(style.fill, Color::GHOST_FILL);
    }
}
