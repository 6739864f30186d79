//! Redline UI Library
//!
//! Interaction layer over the review engine: the tool/gesture state
//! machine, overlay paint-instruction generation, the sidebar presenter,
//! and the two thin front-end session types (internal reviewer and public
//! client portal) that share one engine.

pub mod overlay;
pub mod session;
pub mod sidebar;
pub mod tools;

pub use overlay::{paint_overlay, Color, OverlayShape, PaintStyle, PIN_RADIUS_PX};
pub use session::{Capabilities, ReviewSession};
pub use sidebar::{PageGroup, SidebarPresenter, HIGHLIGHT_LINGER};
pub use tools::{ActiveTool, Gesture, PendingDraft, ToolController};
