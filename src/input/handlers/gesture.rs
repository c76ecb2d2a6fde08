use std::rc::Rc;

use glam::DVec2;

use super::{Binding, GestureHandler, HandlerContext};
use crate::events::Axes;
use crate::input::event::InputEvent;
use crate::options::GestureOptions;
use crate::surface::Surface;
use crate::util::math::{normalize_angle_deg, scale_zoom};

#[derive(Debug, Clone, Copy)]
struct Gesture {
    scale: f64,
    rotation: f64,
}

/// Trackpad pinch/rotate delivered as legacy gesture start/change/end
/// events (Safari). Each change reports cumulative scale and rotation
/// since the start; the handler applies the increment since the last
/// change, anchored at the gesture focus.
///
/// Stays off on touch-capable surfaces, where the same fingers already
/// arrive as touch pointers.
pub struct TrackpadGestureHandler {
    options: GestureOptions,
    binding: Binding,
    gesture: Option<Gesture>,
}

impl TrackpadGestureHandler {
    /// Handler with the given options (not yet enabled).
    #[must_use]
    pub fn new(options: GestureOptions) -> Self {
        Self {
            options,
            binding: Binding::default(),
            gesture: None,
        }
    }

    /// Current options.
    #[must_use]
    pub fn options(&self) -> &GestureOptions {
        &self.options
    }

    fn change(
        &mut self,
        position: DVec2,
        scale: f64,
        rotation: f64,
        event: &InputEvent,
        ctx: &mut HandlerContext<'_>,
    ) -> bool {
        let Some(last) = self.gesture.as_mut() else {
            return false;
        };
        if !(scale.is_finite() && scale > 0.0 && rotation.is_finite()) {
            return true;
        }
        let dz = if self.options.zoom && last.scale > 0.0 {
            scale_zoom(scale / last.scale)
        } else {
            0.0
        };
        let db = if self.options.rotate {
            -normalize_angle_deg(rotation - last.rotation)
        } else {
            0.0
        };
        last.scale = scale;
        last.rotation = rotation;

        let before = ctx.transform.pose();
        let helper = ctx.helper;
        let _ = ctx.transform.anchored(position, self.options.anchor_tightness, |t| {
            helper.roll_pitch_bearing_zoom(t, 0.0, 0.0, db, dz);
        });
        let after = ctx.transform.pose();
        let axes = Axes {
            zoom: after.zoom != before.zoom,
            rotate: after.bearing != before.bearing,
            pan: after.center != before.center,
            ..Axes::NONE
        };
        ctx.emit(axes, Some(event));
        true
    }
}

impl GestureHandler for TrackpadGestureHandler {
    fn name(&self) -> &'static str {
        "gesture"
    }

    fn enable(&mut self, surface: Option<&Rc<dyn Surface>>) {
        if surface.is_some_and(|s| s.supports_touch()) {
            log::debug!("trackpad gestures left off on a touch surface");
            return;
        }
        if self.binding.bind(surface) {
            log::debug!("trackpad gestures enabled");
        }
    }

    fn disable(&mut self) {
        self.stop();
        self.binding.unbind();
    }

    fn is_enabled(&self) -> bool {
        self.binding.is_bound()
    }

    fn is_active(&self) -> bool {
        self.gesture.is_some()
    }

    fn handle_event(
        &mut self,
        event: &InputEvent,
        ctx: &mut HandlerContext<'_>,
    ) -> bool {
        if !self.is_enabled() {
            return false;
        }
        match *event {
            InputEvent::GestureStart { .. } => {
                self.gesture = Some(Gesture {
                    scale: 1.0,
                    rotation: 0.0,
                });
                true
            }
            InputEvent::GestureChange {
                position,
                scale,
                rotation,
            } => self.change(position, scale, rotation, event, ctx),
            InputEvent::GestureEnd => self.gesture.take().is_some(),
            InputEvent::FocusLost => {
                self.stop();
                false
            }
            _ => false,
        }
    }

    fn stop(&mut self) {
        self.gesture = None;
    }
}

#[cfg(test)]
mod tests {
    use web_time::{Duration, Instant};

    use super::*;
    use crate::camera::PlanarHelper;
    use crate::input::handlers::testing::transform;
    use crate::surface::testing::FakeSurface;

    #[test]
    fn pinch_and_twist_apply_increments_around_focus() {
        let surface: Rc<dyn Surface> = Rc::new(FakeSurface::new(800.0, 600.0));
        let mut handler = TrackpadGestureHandler::new(GestureOptions::default());
        handler.enable(Some(&surface));
        let mut t = transform();
        t.set_zoom(4.0);
        let focus = DVec2::new(250.0, 420.0);
        let anchor = t.screen_to_world(focus).unwrap();
        let mut signals = Vec::new();
        let mut ctx = HandlerContext::new(&mut t, &PlanarHelper, Instant::now(), Duration::ZERO, &mut signals);

        assert!(handler.handle_event(&InputEvent::GestureStart { position: focus }, &mut ctx));
        for (scale, rotation) in [(1.5, 5.0), (2.0, 10.0)] {
            let change = InputEvent::GestureChange {
                position: focus,
                scale,
                rotation,
            };
            assert!(handler.handle_event(&change, &mut ctx));
        }
        assert!(handler.handle_event(&InputEvent::GestureEnd, &mut ctx));
        assert!((ctx.transform.zoom() - 5.0).abs() < 1e-9);
        assert!((ctx.transform.bearing() + 10.0).abs() < 1e-9);
        assert!((ctx.transform.world_to_screen(anchor) - focus).length() < 1.0);
        assert!(!handler.is_active());
    }

    #[test]
    fn touch_surfaces_keep_it_disabled() {
        let mut fake = FakeSurface::new(800.0, 600.0);
        fake.touch = true;
        let surface: Rc<dyn Surface> = Rc::new(fake);
        let mut handler = TrackpadGestureHandler::new(GestureOptions::default());
        handler.enable(Some(&surface));
        assert!(!handler.is_enabled());
    }

    #[test]
    fn change_without_start_is_ignored() {
        let surface: Rc<dyn Surface> = Rc::new(FakeSurface::new(800.0, 600.0));
        let mut handler = TrackpadGestureHandler::new(GestureOptions::default());
        handler.enable(Some(&surface));
        let mut t = transform();
        let mut signals = Vec::new();
        let mut ctx = HandlerContext::new(&mut t, &PlanarHelper, Instant::now(), Duration::ZERO, &mut signals);
        let change = InputEvent::GestureChange {
            position: DVec2::ZERO,
            scale: 2.0,
            rotation: 0.0,
        };
        assert!(!handler.handle_event(&change, &mut ctx));
        assert!(signals.is_empty());
    }
}
