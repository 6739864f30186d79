//! Redline Render Library
//!
//! Bridge between the review engine and an external page-rasterization
//! library. The rasterizer is a black box behind [`PageRasterizer`]; this
//! crate owns request/completion bookkeeping, cooperative cancellation,
//! stale-render discarding, and a small cache of rendered surfaces.

pub mod bridge;
pub mod cancel;
pub mod raster;

pub use bridge::{
    fit_width_percent, RenderBridge, RenderRequest, SurfaceCache, MAX_ZOOM_PERCENT,
    MIN_ZOOM_PERCENT,
};
pub use cancel::CancellationToken;
pub use raster::{DocumentInfo, PageRasterizer, PixelSurface, RasterError};
