//! The element the camera renders into and receives input from.
//!
//! Gesture handlers only bind to a [`Surface`] when one is present. A
//! controller built without one (server-side, headless, tests) still has a
//! working transform sized from its options; input handlers stay disabled
//! and frame requests go nowhere.

use glam::DVec2;

/// Host window or element.
pub trait Surface {
    /// Current size in logical pixels.
    fn client_size(&self) -> DVec2;

    /// Physical pixels per logical pixel.
    fn device_pixel_ratio(&self) -> f64 {
        1.0
    }

    /// Ask the host for another animation frame.
    fn request_frame(&self) {}

    /// Toggle suppression of the native context menu (right-drag rotate
    /// would otherwise open it).
    fn set_context_menu_suppressed(&self, _suppressed: bool) {}

    /// Whether the host delivers touch events. Trackpad gesture events are
    /// ignored on touch-capable hosts so pinches aren't handled twice.
    fn supports_touch(&self) -> bool {
        false
    }

    /// Whether the user asked the platform for reduced motion.
    fn prefers_reduced_motion(&self) -> bool {
        false
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::Cell;

    use super::*;

    /// In-memory surface that records what the controller asked of it.
    #[derive(Debug, Default)]
    pub(crate) struct FakeSurface {
        pub size: Cell<DVec2>,
        pub touch: bool,
        pub reduced_motion: bool,
        pub frames_requested: Cell<u32>,
        pub context_menu_suppressed: Cell<bool>,
    }

    impl FakeSurface {
        pub(crate) fn new(width: f64, height: f64) -> Self {
            Self {
                size: Cell::new(DVec2::new(width, height)),
                ..Self::default()
            }
        }
    }

    impl Surface for FakeSurface {
        fn client_size(&self) -> DVec2 {
            self.size.get()
        }

        fn request_frame(&self) {
            self.frames_requested.set(self.frames_requested.get() + 1);
        }

        fn set_context_menu_suppressed(&self, suppressed: bool) {
            self.context_menu_suppressed.set(suppressed);
        }

        fn supports_touch(&self) -> bool {
            self.touch
        }

        fn prefers_reduced_motion(&self) -> bool {
            self.reduced_motion
        }
    }
}
