//! Monotonic time source for the animation loop and the gesture handlers.
//!
//! The controller never calls `Instant::now()` directly. Hosts that drive
//! their own render loop (or tests) plug in a [`ManualClock`] and advance
//! it explicitly.

use std::cell::Cell;
use std::rc::Rc;

use web_time::{Duration, Instant};

/// Monotonic time source.
pub trait Clock {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// Wall clock backed by `web_time::Instant` (`performance.now()` on wasm).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Shared, explicitly advanced clock.
///
/// Clones observe the same time, so a test can hand one clone to the
/// controller and keep another to move time forward.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    /// Clock frozen at the current wall time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> Instant {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let observer = clock.clone();
        let start = observer.now();
        clock.advance(Duration::from_millis(250));
        assert_eq!(
            observer.now().duration_since(start),
            Duration::from_millis(250)
        );
    }
}
