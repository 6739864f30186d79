//! Polling refresh policy
//!
//! The internal reviewer view re-fetches the review payload on a fixed
//! interval to approximate real-time collaboration. Fetch results never
//! touch the store directly: the merge policy decides, as a pure function,
//! whether a refresh may be applied, so the decision is testable in
//! isolation and an in-flight gesture is never clobbered.

use std::time::{Duration, Instant};

use crate::annotation::Annotation;

/// Interval bookkeeping for the polling loop
///
/// The host drives the tick; no background threads are involved.
#[derive(Debug)]
pub struct PollClock {
    interval: Duration,
    last: Option<Instant>,
}

impl PollClock {
    /// Create a clock firing every `interval`
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    /// The configured interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Check whether a poll is due, marking the tick when it is
    ///
    /// The first call after construction is always due.
    pub fn due(&mut self, now: Instant) -> bool {
        let due = match self.last {
            None => true,
            Some(last) => now.duration_since(last) >= self.interval,
        };
        if due {
            self.last = Some(now);
        }
        due
    }
}

/// Outcome of the poll merge policy
#[derive(Debug, PartialEq)]
pub enum PollMerge {
    /// Replace the store contents with the fresh server state
    Replace(Vec<Annotation>),

    /// A gesture is active; drop the fresh state and keep the optimistic
    /// in-flight annotations
    Deferred,
}

/// Decide what to do with a polled refresh
///
/// Polling-driven overwrites are suspended while any gesture is active and
/// resume once the engine is idle again.
pub fn merge_poll(gesture_active: bool, fresh: Vec<Annotation>) -> PollMerge {
    if gesture_active {
        tracing::debug!("poll refresh deferred while a gesture is active");
        PollMerge::Deferred
    } else {
        PollMerge::Replace(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationShape;
    use crate::geometry::PercentPoint;

    #[test]
    fn test_clock_fires_on_first_tick_then_waits() {
        let mut clock = PollClock::new(Duration::from_secs(5));
        let start = Instant::now();
        assert!(clock.due(start));
        assert!(!clock.due(start + Duration::from_secs(3)));
        assert!(clock.due(start + Duration::from_secs(5)));
    }

    #[test]
    fn test_merge_defers_while_gesture_active() {
        let fresh = vec![Annotation::for_tests(
            1,
            AnnotationShape::Comment {
                at: PercentPoint::new(10.0, 10.0),
            },
        )];
        assert_eq!(merge_poll(true, fresh.clone()), PollMerge::Deferred);
        assert_eq!(merge_poll(false, fresh.clone()), PollMerge::Replace(fresh));
    }
}
