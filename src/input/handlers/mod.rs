//! Gesture handlers: one per input modality.
//!
//! Every handler has the same shape. It binds to a [`Surface`] in
//! [`enable`](GestureHandler::enable) (a no-op without one), turns the
//! events it cares about into [`CameraHelper`]/[`Transform`] calls, and
//! reports what moved through [`HandlerContext::emit`]. Handlers never
//! touch controller state; the controller drains the emitted
//! [`HandlerSignal`]s and runs the event lifecycle.

use std::collections::VecDeque;
use std::rc::Rc;

use glam::DVec2;
use web_time::{Duration, Instant};

use super::event::InputEvent;
use crate::camera::{CameraHelper, Transform};
use crate::events::Axes;
use crate::surface::Surface;

/// Box-zoom handler.
pub mod box_zoom;
/// Double-click and double-tap zoom.
pub mod double_click;
/// Trackpad pinch/rotate gesture events.
pub mod gesture;
/// Keyboard navigation.
pub mod keyboard;
/// Drag-to-pan.
pub mod mouse_pan;
/// Drag-to-rotate/pitch.
pub mod mouse_rotate;
/// Wheel and trackpad-scroll zoom.
pub mod scroll_zoom;
/// Touch gestures.
pub mod touch;

pub use box_zoom::BoxZoomHandler;
pub use double_click::DoubleClickHandler;
pub use gesture::TrackpadGestureHandler;
pub use keyboard::{KeyAction, KeyboardHandler};
pub use mouse_pan::MousePanHandler;
pub use mouse_rotate::MouseRotateHandler;
pub use scroll_zoom::{ScrollMode, ScrollZoomHandler};
pub use touch::{TouchHandler, TouchMode};

/// What a handler reports back to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerSignal {
    /// The pose moved along `axes`.
    Change {
        /// Axes that moved.
        axes: Axes,
        /// Input that caused it; `None` for inertia frames.
        original_event: Option<InputEvent>,
    },
    /// Input was ignored because cooperative mode wants a modifier.
    CooperativeHint {
        /// The ignored input.
        original_event: Option<InputEvent>,
    },
}

/// Everything a handler may touch while processing an event or a frame.
pub struct HandlerContext<'a> {
    /// The pose to move.
    pub transform: &'a mut Transform,
    /// Pose-delta operators.
    pub helper: &'a dyn CameraHelper,
    /// Current time.
    pub now: Instant,
    /// Time since the previous frame (zero while handling input).
    pub dt: Duration,
    signals: &'a mut Vec<HandlerSignal>,
}

impl<'a> HandlerContext<'a> {
    /// Context that appends signals to `signals`.
    pub fn new(
        transform: &'a mut Transform,
        helper: &'a dyn CameraHelper,
        now: Instant,
        dt: Duration,
        signals: &'a mut Vec<HandlerSignal>,
    ) -> Self {
        Self {
            transform,
            helper,
            now,
            dt,
            signals,
        }
    }

    /// Report motion along `axes`.
    pub fn emit(&mut self, axes: Axes, original_event: Option<&InputEvent>) {
        if axes.is_empty() {
            return;
        }
        self.signals.push(HandlerSignal::Change {
            axes,
            original_event: original_event.cloned(),
        });
    }

    /// Report an input swallowed by cooperative mode.
    pub fn hint(&mut self, original_event: &InputEvent) {
        self.signals.push(HandlerSignal::CooperativeHint {
            original_event: Some(original_event.clone()),
        });
    }
}

/// One input modality.
pub trait GestureHandler {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Start listening. Without a surface the handler stays disabled.
    fn enable(&mut self, surface: Option<&Rc<dyn Surface>>);

    /// Stop listening and drop any in-flight gesture.
    fn disable(&mut self);

    /// Whether the handler is listening.
    fn is_enabled(&self) -> bool;

    /// Whether a gesture is in progress (a button or finger is down).
    fn is_active(&self) -> bool;

    /// Whether inertia is still moving the camera.
    fn is_animating(&self) -> bool {
        false
    }

    /// Feed one input event. Returns whether the handler used it.
    fn handle_event(
        &mut self,
        event: &InputEvent,
        ctx: &mut HandlerContext<'_>,
    ) -> bool;

    /// Advance inertia by `ctx.dt`.
    fn tick(&mut self, _ctx: &mut HandlerContext<'_>) {}

    /// Drop inertia and any gesture in progress without emitting.
    fn stop(&mut self);

    /// Whether right-button drags matter to this handler.
    fn uses_secondary_button(&self) -> bool {
        false
    }

    /// Tear down. Idempotent.
    fn destroy(&mut self) {
        self.disable();
    }
}

// ── Shared pieces ──────────────────────────────────────────────────────

/// Surface binding held by an enabled handler.
#[derive(Default)]
pub(crate) struct Binding {
    surface: Option<Rc<dyn Surface>>,
}

impl Binding {
    /// Bind to `surface`. Returns `true` when newly bound.
    pub(crate) fn bind(&mut self, surface: Option<&Rc<dyn Surface>>) -> bool {
        if self.surface.is_some() {
            return false;
        }
        match surface {
            Some(surface) => {
                self.surface = Some(Rc::clone(surface));
                true
            }
            None => false,
        }
    }

    pub(crate) fn unbind(&mut self) {
        self.surface = None;
    }

    pub(crate) fn is_bound(&self) -> bool {
        self.surface.is_some()
    }

    pub(crate) fn surface(&self) -> Option<&Rc<dyn Surface>> {
        self.surface.as_ref()
    }
}

/// Screen-space velocity from deltas observed over a trailing window.
#[derive(Debug, Clone)]
pub(crate) struct VelocitySampler {
    window: Duration,
    samples: VecDeque<(Instant, DVec2)>,
}

impl VelocitySampler {
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            window,
            samples: VecDeque::new(),
        }
    }

    pub(crate) fn push(&mut self, now: Instant, delta: DVec2) {
        self.samples.push_back((now, delta));
        self.prune(now);
    }

    fn prune(&mut self, now: Instant) {
        while let Some(&(t, _)) = self.samples.front() {
            if now.saturating_duration_since(t) > self.window {
                let _ = self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Average velocity (units per second) over the window ending at `now`.
    pub(crate) fn velocity(&mut self, now: Instant) -> DVec2 {
        self.prune(now);
        let Some(&(first, _)) = self.samples.front() else {
            return DVec2::ZERO;
        };
        let total: DVec2 = self.samples.iter().map(|&(_, d)| d).sum();
        let span = now.saturating_duration_since(first).as_secs_f64();
        // A single burst sample still counts as one ~16 ms frame.
        total / span.max(1.0 / 60.0)
    }

    pub(crate) fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Move the camera so the ground point under `from` ends up under `to`,
/// scaled by `damping`. Falls back to a screen-space pan when either ray
/// misses the ground.
pub(crate) fn drag_ground(ctx: &mut HandlerContext<'_>, from: DVec2, to: DVec2, damping: f64) {
    let transform = &mut *ctx.transform;
    match (transform.ground_from_screen(from), transform.ground_from_screen(to)) {
        (Some(grab), Some(now)) => {
            transform.adjust_center_by_ground_delta((grab.to_vec2() - now.to_vec2()) * damping);
        }
        _ => ctx.helper.pan(transform, (from - to) * damping),
    }
}

/// Exponential decay factor for `dt` at a per-second `friction`.
#[inline]
pub(crate) fn decay(friction: f64, dt: Duration) -> f64 {
    (-friction.max(0.0) * dt.as_secs_f64()).exp()
}

#[cfg(test)]
pub(crate) mod testing {
    use glam::DVec2;

    use super::super::event::{InputEvent, Modifiers, MouseButton, PointerKind};
    use crate::camera::{Camera, Constraints, Transform, UpAxis, Viewport};

    pub(crate) fn transform() -> Transform {
        Transform::new(
            Camera::perspective(36.87, 1.0, 0.1, 1000.0),
            Viewport::new(800.0, 600.0),
            UpAxis::Y,
            Constraints::default(),
        )
    }

    pub(crate) fn down(id: u64, kind: PointerKind, button: MouseButton, x: f64, y: f64, modifiers: Modifiers) -> InputEvent {
        InputEvent::PointerDown {
            id,
            kind,
            button,
            position: DVec2::new(x, y),
            modifiers,
        }
    }

    pub(crate) fn mv(id: u64, kind: PointerKind, x: f64, y: f64, modifiers: Modifiers) -> InputEvent {
        InputEvent::PointerMove {
            id,
            kind,
            position: DVec2::new(x, y),
            modifiers,
        }
    }

    pub(crate) fn up(id: u64, kind: PointerKind, button: MouseButton, x: f64, y: f64, modifiers: Modifiers) -> InputEvent {
        InputEvent::PointerUp {
            id,
            kind,
            button,
            position: DVec2::new(x, y),
            modifiers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampler_averages_within_window() {
        let start = Instant::now();
        let mut sampler = VelocitySampler::new(Duration::from_millis(100));
        sampler.push(start, DVec2::new(500.0, 0.0));
        for i in 1..=5 {
            sampler.push(start + Duration::from_millis(200 + i * 10), DVec2::new(10.0, 0.0));
        }
        // the early 500 px sample fell out of the window
        let v = sampler.velocity(start + Duration::from_millis(250));
        assert!((v.x - 50.0 / 0.04).abs() < 1e-6, "{v:?}");
    }

    #[test]
    fn binding_needs_a_surface() {
        let mut binding = Binding::default();
        assert!(!binding.bind(None));
        assert!(!binding.is_bound());
    }

    #[test]
    fn decay_is_one_at_zero_dt() {
        assert_eq!(decay(5.0, Duration::ZERO), 1.0);
        assert!(decay(5.0, Duration::from_millis(100)) < 1.0);
    }
}
