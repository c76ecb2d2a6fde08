//! Shared utilities for the camera engine.
//!
//! Helpers for angle/zoom math, easing curves and the monotonic clock.

pub mod clock;
pub mod easing;
pub mod math;
