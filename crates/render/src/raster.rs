//! Abstraction over the external page-rasterization library
//!
//! The library is assumed to expose "load document by URL, get page
//! count" and "render page N at scale S into a pixel surface", with
//! cooperative cancellation. Everything else about it is out of scope.

use crate::cancel::CancellationToken;

/// Errors reported by a rasterizer
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    /// Document failed to load
    #[error("document load error: {0}")]
    Load(String),

    /// Page number outside 1..=page_count
    #[error("invalid page number: {0}")]
    InvalidPage(u16),

    /// Rendering failed
    #[error("page render error: {0}")]
    Render(String),

    /// The render observed its cancellation token
    #[error("render cancelled")]
    Cancelled,
}

/// Document-level facts learned at load time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentInfo {
    pub page_count: u16,
}

/// One rendered page as RGBA8 pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelSurface {
    pub width_px: u32,
    pub height_px: u32,
    pub pixels: Vec<u8>,
}

impl PixelSurface {
    /// Create a blank surface of the given size
    pub fn blank(width_px: u32, height_px: u32) -> Self {
        Self {
            width_px,
            height_px,
            pixels: vec![0; width_px as usize * height_px as usize * 4],
        }
    }
}

/// External page-rasterization collaborator
///
/// `render_page` takes the page number 1-indexed to match the rest of the
/// engine. Implementations should poll the token between bands of work and
/// return [`RasterError::Cancelled`] when it fires.
pub trait PageRasterizer {
    /// Load a document by URL and report its page count
    fn load_document(&mut self, url: &str) -> Result<DocumentInfo, RasterError>;

    /// Render one page at the given scale
    fn render_page(
        &self,
        page: u16,
        scale: f32,
        token: &CancellationToken,
    ) -> Result<PixelSurface, RasterError>;
}
