//! Cooperative cancellation for in-flight page renders
//!
//! A render started for page N that completes after the user has navigated
//! to page M must be discarded, not painted. The bridge cancels the
//! outstanding token on every navigation; rasterizers check it between
//! bands of work and bail out early.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Cancellation token shared between the bridge and a rasterizer call
///
/// Clones share the underlying flag, so cancelling any clone cancels them
/// all. Cancelling is idempotent.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token in the non-cancelled state
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel this token and every clone of it
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether the token has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
