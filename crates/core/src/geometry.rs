//! Page-space geometry for the annotation overlay
//!
//! All annotation positions are stored as percentages of page width/height
//! (0 to 100), so they are independent of zoom level and device pixel
//! ratio. Every conversion between viewport pixels and percent space lives
//! in this module; no other component reimplements the transform.

use crate::annotation::Annotation;

/// Hit-test tolerance for point annotations, in percent units
pub const HIT_TOLERANCE: f32 = 2.0;

/// Minimum drag extent, in percent units
///
/// A completed drag smaller than this in both dimensions is treated as a
/// click rather than a shape.
pub const MIN_DRAG_EXTENT: f32 = 0.75;

/// A point in percentage-of-page coordinates
///
/// Origin (0, 0) at the top-left of the page, (100, 100) at the
/// bottom-right. X increases to the right, Y increases downward.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PercentPoint {
    pub x: f32,
    pub y: f32,
}

impl PercentPoint {
    /// Create a new percent-space point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Clamp the point to the page bounds (0 to 100 on both axes)
    pub fn clamped(&self) -> Self {
        Self {
            x: self.x.clamp(0.0, 100.0),
            y: self.y.clamp(0.0, 100.0),
        }
    }

    /// Chebyshev distance to another point (max of axis distances)
    pub fn chebyshev_distance_to(&self, other: &PercentPoint) -> f32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

/// An axis-aligned rectangle in percentage-of-page coordinates
///
/// `(x, y)` is the top-left corner. Width and height are non-negative by
/// construction when produced through [`normalize_rect`].
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PercentRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PercentRect {
    /// Create a new percent-space rectangle
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Check whether a point falls within `[x, x+width] x [y, y+height]`
    pub fn contains(&self, point: &PercentPoint) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    /// Check whether this rectangle encloses zero area
    pub fn is_degenerate(&self) -> bool {
        self.width <= f32::EPSILON || self.height <= f32::EPSILON
    }

    /// Translate by a percent-space delta, clamped so the rectangle stays
    /// on the page
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        let max_x = (100.0 - self.width).max(0.0);
        let max_y = (100.0 - self.height).max(0.0);
        Self {
            x: (self.x + dx).clamp(0.0, max_x),
            y: (self.y + dy).clamp(0.0, max_y),
            width: self.width,
            height: self.height,
        }
    }
}

/// Bounding box of the overlay surface in viewport pixels
///
/// Captured from the rendered page element at event time; pointer events
/// arrive in the same viewport coordinate space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceBounds {
    pub origin_x: f32,
    pub origin_y: f32,
    pub width: f32,
    pub height: f32,
}

impl SurfaceBounds {
    /// Create new surface bounds
    pub fn new(origin_x: f32, origin_y: f32, width: f32, height: f32) -> Self {
        Self { origin_x, origin_y, width, height }
    }
}

/// An axis-aligned rectangle in viewport pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Map a pointer position in viewport coordinates into percent space
///
/// Returns `None` when the surface has zero or negative extent, so callers
/// never divide by zero on a collapsed layout.
pub fn to_percent(pointer_x: f32, pointer_y: f32, bounds: &SurfaceBounds) -> Option<PercentPoint> {
    if bounds.width <= 0.0 || bounds.height <= 0.0 {
        return None;
    }
    let point = PercentPoint::new(
        (pointer_x - bounds.origin_x) / bounds.width * 100.0,
        (pointer_y - bounds.origin_y) / bounds.height * 100.0,
    );
    Some(point.clamped())
}

/// Build a normalized rectangle from two drag corners
///
/// Takes min/max of the corners, so the result has non-negative extent
/// regardless of drag direction: `normalize_rect(a, b) == normalize_rect(b, a)`.
pub fn normalize_rect(a: &PercentPoint, b: &PercentPoint) -> PercentRect {
    let x = a.x.min(b.x);
    let y = a.y.min(b.y);
    PercentRect::new(x, y, a.x.max(b.x) - x, a.y.max(b.y) - y)
}

/// Check whether a completed drag is below the click threshold
pub fn is_click(start: &PercentPoint, end: &PercentPoint) -> bool {
    (end.x - start.x).abs() < MIN_DRAG_EXTENT && (end.y - start.y).abs() < MIN_DRAG_EXTENT
}

/// Find the annotation under a point on the given page
///
/// Comment pins hit within [`HIT_TOLERANCE`] Chebyshev distance; rectangle
/// shapes hit inside their bounds. When annotations overlap, the first
/// match in iteration order wins, which keeps hit-testing deterministic.
pub fn hit_test<'a>(
    point: &PercentPoint,
    annotations: &'a [Annotation],
    page: u16,
) -> Option<&'a Annotation> {
    annotations
        .iter()
        .filter(|a| a.page == page)
        .find(|a| a.hit_test(point))
}

/// Project a percent-space point into viewport pixels
pub fn project_point(point: &PercentPoint, bounds: &SurfaceBounds) -> (f32, f32) {
    (
        bounds.origin_x + point.x / 100.0 * bounds.width,
        bounds.origin_y + point.y / 100.0 * bounds.height,
    )
}

/// Project a percent-space rectangle into viewport pixels
pub fn project_rect(rect: &PercentRect, bounds: &SurfaceBounds) -> PixelRect {
    PixelRect {
        x: bounds.origin_x + rect.x / 100.0 * bounds.width,
        y: bounds.origin_y + rect.y / 100.0 * bounds.height,
        width: rect.width / 100.0 * bounds.width,
        height: rect.height / 100.0 * bounds.height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationShape;

    fn bounds() -> SurfaceBounds {
        SurfaceBounds::new(0.0, 0.0, 800.0, 1000.0)
    }

    #[test]
    fn test_to_percent_maps_into_page_space() {
        let point = to_percent(400.0, 250.0, &bounds()).unwrap();
        assert_eq!(point, PercentPoint::new(50.0, 25.0));
    }

    #[test]
    fn test_to_percent_respects_surface_origin() {
        let offset = SurfaceBounds::new(100.0, 50.0, 200.0, 200.0);
        let point = to_percent(200.0, 150.0, &offset).unwrap();
        assert_eq!(point, PercentPoint::new(50.0, 50.0));
    }

    #[test]
    fn test_to_percent_zero_extent_surface() {
        let collapsed = SurfaceBounds::new(0.0, 0.0, 0.0, 600.0);
        assert!(to_percent(10.0, 10.0, &collapsed).is_none());
    }

    #[test]
    fn test_to_percent_clamps_outside_pointer() {
        let point = to_percent(-50.0, 2000.0, &bounds()).unwrap();
        assert_eq!(point, PercentPoint::new(0.0, 100.0));
    }

    #[test]
    fn test_normalize_rect_is_direction_independent() {
        let a = PercentPoint::new(30.0, 40.0);
        let b = PercentPoint::new(10.0, 70.0);
        let forward = normalize_rect(&a, &b);
        let backward = normalize_rect(&b, &a);
        assert_eq!(forward, backward);
        assert_eq!(forward, PercentRect::new(10.0, 40.0, 20.0, 30.0));
    }

    #[test]
    fn test_is_click_below_threshold() {
        let start = PercentPoint::new(10.0, 10.0);
        assert!(is_click(&start, &PercentPoint::new(10.4, 10.4)));
        assert!(!is_click(&start, &PercentPoint::new(12.0, 10.1)));
    }

    #[test]
    fn test_rect_translation_clamps_to_page() {
        let rect = PercentRect::new(90.0, 90.0, 8.0, 8.0);
        let moved = rect.translated(20.0, -95.0);
        assert_eq!(moved, PercentRect::new(92.0, 0.0, 8.0, 8.0));
    }

    #[test]
    fn test_hit_test_rect_and_miss() {
        let annotations = vec![Annotation::for_tests(
            2,
            AnnotationShape::Highlight {
                rect: PercentRect::new(10.0, 10.0, 20.0, 5.0),
            },
        )];
        let hit = hit_test(&PercentPoint::new(15.0, 12.0), &annotations, 2);
        assert!(hit.is_some());
        assert!(hit_test(&PercentPoint::new(40.0, 40.0), &annotations, 2).is_none());
        // Same point on another page is a miss
        assert!(hit_test(&PercentPoint::new(15.0, 12.0), &annotations, 1).is_none());
    }

    #[test]
    fn test_hit_test_first_match_wins_on_overlap() {
        let under = Annotation::for_tests(
            1,
            AnnotationShape::Highlight {
                rect: PercentRect::new(10.0, 10.0, 30.0, 30.0),
            },
        );
        let over = Annotation::for_tests(
            1,
            AnnotationShape::Strike {
                rect: PercentRect::new(15.0, 15.0, 30.0, 30.0),
            },
        );
        let first_id = under.id;
        let annotations = vec![under, over];
        let hit = hit_test(&PercentPoint::new(20.0, 20.0), &annotations, 1).unwrap();
        assert_eq!(hit.id, first_id);
    }

    #[test]
    fn test_projection_is_scale_invariant() {
        let point = PercentPoint::new(25.0, 75.0);
        let small = SurfaceBounds::new(0.0, 0.0, 400.0, 500.0);
        let large = SurfaceBounds::new(0.0, 0.0, 800.0, 1000.0);
        let (sx, sy) = project_point(&point, &small);
        let (lx, ly) = project_point(&point, &large);
        assert!((lx - sx * 2.0).abs() < 1e-3);
        assert!((ly - sy * 2.0).abs() < 1e-3);
    }
}
