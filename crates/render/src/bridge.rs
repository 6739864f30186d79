//! Render request bookkeeping for the current page and zoom
//!
//! The bridge never calls the rasterizer itself: it hands out
//! generation-stamped [`RenderRequest`]s for the host to execute and
//! accepts completions back. Only the completion matching the latest
//! generation is accepted; anything older is discarded so a slow render
//! for a page the user already left can never overwrite the current one.

use std::collections::{HashMap, VecDeque};

use crate::cancel::CancellationToken;
use crate::raster::{DocumentInfo, PixelSurface, RasterError};

/// Lower zoom bound, percent
pub const MIN_ZOOM_PERCENT: u16 = 10;

/// Upper zoom bound, percent
pub const MAX_ZOOM_PERCENT: u16 = 400;

/// Rendered surfaces kept around for instant back-navigation
const SURFACE_CACHE_CAPACITY: usize = 8;

/// A page render for the host to execute
///
/// Pass `page`, `scale` and `token` to the rasterizer, then report the
/// result through [`RenderBridge::complete`] with the same `generation`.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub page: u16,
    pub zoom_percent: u16,
    pub scale: f32,
    pub generation: u64,
    pub token: CancellationToken,
}

/// Least-recently-used cache of rendered page surfaces
///
/// Keyed by (page, zoom percent); the device pixel ratio is handled by
/// clearing the cache when it changes.
#[derive(Debug)]
pub struct SurfaceCache {
    capacity: usize,
    map: HashMap<(u16, u16), PixelSurface>,
    order: VecDeque<(u16, u16)>,
}

impl SurfaceCache {
    /// Create a cache holding at most `capacity` surfaces
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            map: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Number of cached surfaces
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Look up a surface without touching recency
    pub fn peek(&self, page: u16, zoom_percent: u16) -> Option<&PixelSurface> {
        self.map.get(&(page, zoom_percent))
    }

    /// Look up a surface, marking it most recently used
    pub fn get(&mut self, page: u16, zoom_percent: u16) -> Option<&PixelSurface> {
        let key = (page, zoom_percent);
        if self.map.contains_key(&key) {
            self.touch(&key);
        }
        self.map.get(&key)
    }

    /// Insert a surface, evicting the least recently used past capacity
    pub fn insert(&mut self, page: u16, zoom_percent: u16, surface: PixelSurface) {
        let key = (page, zoom_percent);
        if self.map.insert(key, surface).is_some() {
            self.touch(&key);
            return;
        }
        self.order.push_back(key);
        while self.map.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.map.remove(&oldest);
            }
        }
    }

    /// Drop every cached surface
    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }

    fn touch(&mut self, key: &(u16, u16)) {
        if let Some(index) = self.order.iter().position(|existing| existing == key) {
            if let Some(found) = self.order.remove(index) {
                self.order.push_back(found);
            }
        }
    }
}

/// Tracks the visible page and zoom, and the one in-flight render
#[derive(Debug)]
pub struct RenderBridge {
    page_count: u16,
    current_page: u16,
    zoom_percent: u16,
    dpr: f32,
    generation: u64,
    outstanding: Option<CancellationToken>,
    cache: SurfaceCache,
}

impl Default for RenderBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBridge {
    /// Create a bridge with no document open
    pub fn new() -> Self {
        Self {
            page_count: 0,
            current_page: 1,
            zoom_percent: 100,
            dpr: 1.0,
            generation: 0,
            outstanding: None,
            cache: SurfaceCache::new(SURFACE_CACHE_CAPACITY),
        }
    }

    /// Adopt a loaded document and request its first page
    pub fn open(&mut self, info: DocumentInfo) -> Result<RenderRequest, RasterError> {
        if info.page_count == 0 {
            return Err(RasterError::Load("document has no pages".to_string()));
        }
        self.page_count = info.page_count;
        self.current_page = 1;
        self.cache.clear();
        Ok(self.issue())
    }

    /// Number of pages in the open document
    pub fn page_count(&self) -> u16 {
        self.page_count
    }

    /// The visible page, 1-indexed
    pub fn current_page(&self) -> u16 {
        self.current_page
    }

    /// Current zoom in percent
    pub fn zoom_percent(&self) -> u16 {
        self.zoom_percent
    }

    /// Raster scale for the current zoom and device pixel ratio
    pub fn scale(&self) -> f32 {
        self.zoom_percent as f32 / 100.0 * self.dpr
    }

    /// Navigate to a page
    ///
    /// Cancels the outstanding render either way. Returns `None` when the
    /// target surface is already cached, `Some(request)` when the host
    /// must render.
    pub fn go_to_page(&mut self, page: u16) -> Result<Option<RenderRequest>, RasterError> {
        if page == 0 || page > self.page_count {
            return Err(RasterError::InvalidPage(page));
        }
        self.current_page = page;
        Ok(self.reissue_or_cached())
    }

    /// Change the zoom level, clamped to the supported range
    pub fn set_zoom(&mut self, zoom_percent: u16) -> Option<RenderRequest> {
        self.zoom_percent = zoom_percent.clamp(MIN_ZOOM_PERCENT, MAX_ZOOM_PERCENT);
        self.reissue_or_cached()
    }

    /// Change the device pixel ratio
    ///
    /// Cached surfaces were rasterized for the old ratio, so the cache is
    /// dropped and the current page re-requested.
    pub fn set_dpr(&mut self, dpr: f32) -> Option<RenderRequest> {
        self.dpr = if dpr > 0.0 { dpr } else { 1.0 };
        self.cache.clear();
        if self.page_count == 0 {
            return None;
        }
        Some(self.issue())
    }

    /// Accept a completed render
    ///
    /// Returns `false` when the completion is stale (its generation is no
    /// longer current); stale surfaces are discarded, never painted.
    pub fn complete(&mut self, generation: u64, surface: PixelSurface) -> bool {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "discarding stale render");
            return false;
        }
        self.cache
            .insert(self.current_page, self.zoom_percent, surface);
        self.outstanding = None;
        true
    }

    /// The surface for the visible page at the current zoom, if rendered
    pub fn current_surface(&self) -> Option<&PixelSurface> {
        self.cache.peek(self.current_page, self.zoom_percent)
    }

    /// Whether a render is in flight
    pub fn render_pending(&self) -> bool {
        self.outstanding.is_some()
    }

    fn reissue_or_cached(&mut self) -> Option<RenderRequest> {
        if self.page_count == 0 {
            return None;
        }
        if self.cache.get(self.current_page, self.zoom_percent).is_some() {
            // Whatever was in flight is for a stale target now
            self.cancel_outstanding();
            return None;
        }
        Some(self.issue())
    }

    fn issue(&mut self) -> RenderRequest {
        self.cancel_outstanding();
        self.generation += 1;
        let token = CancellationToken::new();
        self.outstanding = Some(token.clone());
        RenderRequest {
            page: self.current_page,
            zoom_percent: self.zoom_percent,
            scale: self.scale(),
            generation: self.generation,
            token,
        }
    }

    fn cancel_outstanding(&mut self) {
        if let Some(token) = self.outstanding.take() {
            token.cancel();
            self.generation += 1;
        }
    }
}

/// Zoom percent that fits a page's width into the viewport
pub fn fit_width_percent(viewport_width_px: f32, page_width_px: f32, dpr: f32) -> u16 {
    if viewport_width_px <= 0.0 || page_width_px <= 0.0 || dpr <= 0.0 {
        return 100;
    }
    ((viewport_width_px / (page_width_px * dpr)) * 100.0)
        .round()
        .clamp(MIN_ZOOM_PERCENT as f32, MAX_ZOOM_PERCENT as f32) as u16
}
