//! Per-frame work: stepping the animation and handler inertia, draining
//! handler signals into the lifecycle, and ending motion.

use web_time::{Duration, Instant};

use super::lifecycle::fire;
use super::{surface_viewport, AnimationKind, CameraController};
use crate::animation::{AnimationToken, CameraAnimation};
use crate::camera::Pose;
use crate::events::{Axes, EventKind};
use crate::input::handlers::{HandlerContext, HandlerSignal};
use crate::input::InputEvent;

/// Slack on the bearing-snap threshold for float noise.
const SNAP_EPSILON: f64 = 1e-6;

impl CameraController {
    /// Advance one frame.
    ///
    /// `None` measures the delta from the controller clock; `Some(dt)`
    /// advances exactly `dt`, for hosts with their own render loop. Steps
    /// the running animation and handler inertia and ends quiet gestures.
    /// Does nothing when nothing is moving.
    pub fn update(&mut self, dt: Option<Duration>) {
        if self.disposed {
            return;
        }
        let now = self.clock.now();
        let dt = dt.unwrap_or_else(|| {
            self.last_frame
                .map_or(Duration::ZERO, |last| now.saturating_duration_since(last))
        });
        self.last_frame = Some(now);

        self.sync_viewport();
        self.step_animation(dt, now);
        self.tick_handlers(dt, now);
        self.end_quiet_gesture(now);

        if self.needs_update() {
            self.request_frame();
        }
    }

    /// Whether another [`update`](Self::update) would change anything: an
    /// animation or inertia is running, or a gesture is waiting to end.
    #[must_use]
    pub fn needs_update(&self) -> bool {
        !self.disposed
            && (self.animation.is_some()
                || self.handlers.is_animating()
                || self.lifecycle.is_moving())
    }

    /// Feed one input event to the gesture handlers. Returns whether a
    /// handler used it. Used input interrupts any running animation.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        if self.disposed {
            return false;
        }
        let now = self.clock.now();
        let used = {
            let mut ctx = HandlerContext::new(
                &mut self.transform,
                self.helper.as_ref(),
                now,
                Duration::ZERO,
                &mut self.signals,
            );
            self.handlers.handle_event(event, &mut ctx)
        };
        if used && self.animation.is_some() {
            log::debug!("input interrupted animation");
            self.finish_animation(false, now);
        }
        self.drain_signals(now);
        if self.needs_update() {
            self.request_frame();
        }
        used
    }

    /// Abort the running animation and any handler inertia. End events
    /// fire for whatever was moving.
    pub fn stop(&mut self) {
        let now = self.clock.now();
        self.handlers.stop();
        if self.animation.is_some() {
            self.finish_animation(false, now);
        } else {
            let _ = self.lifecycle.end(None, &self.events, self.transform.pose());
        }
    }

    // ── Animation ──────────────────────────────────────────────────────

    /// Replace whatever is moving with `animation`. The previous motion
    /// ends (with its end events) before the new one starts.
    pub(super) fn start_animation(
        &mut self,
        animation: CameraAnimation,
        kind: AnimationKind,
    ) -> AnimationToken {
        let token = animation.token().clone();
        self.stop();
        let now = self.clock.now();
        self.last_frame = Some(now);
        log::debug!(
            "{kind:?} animation: {:.0}ms",
            animation.duration().as_secs_f64() * 1000.0
        );
        self.lifecycle
            .start(animation.axes(), None, &self.events, self.transform.pose());
        self.animation = Some((animation, kind));
        self.request_frame();
        token
    }

    fn step_animation(&mut self, dt: Duration, now: Instant) {
        let Some((animation, _)) = self.animation.as_mut() else {
            return;
        };
        if animation.token().is_aborted() {
            log::debug!("animation aborted");
            self.finish_animation(false, now);
            return;
        }
        let finished = animation.step(&mut self.transform, dt);
        let axes = animation.axes();
        let state = self.transform.pose();
        self.lifecycle.frame(axes, None, &self.events, state);
        self.fire(EventKind::RenderFrame);
        if finished {
            self.finish_animation(true, now);
        }
    }

    /// End the running animation. A natural finish applies bearing snap
    /// and the soft pan-bounds correction.
    pub(super) fn finish_animation(&mut self, natural: bool, now: Instant) {
        let Some((animation, kind)) = self.animation.take() else {
            return;
        };
        if !natural {
            animation.token().abort();
        }
        if natural && kind == AnimationKind::Navigation && animation.axes().rotate {
            self.snap_bearing();
        }
        let _ = self.lifecycle.end(None, &self.events, self.transform.pose());
        if natural && kind == AnimationKind::Navigation {
            self.correct_pan_bounds(now);
        }
    }

    // ── Gestures ───────────────────────────────────────────────────────

    fn tick_handlers(&mut self, dt: Duration, now: Instant) {
        if !self.handlers.is_animating() {
            return;
        }
        {
            let mut ctx = HandlerContext::new(
                &mut self.transform,
                self.helper.as_ref(),
                now,
                dt,
                &mut self.signals,
            );
            self.handlers.tick(&mut ctx);
        }
        self.drain_signals(now);
    }

    /// Turn handler reports into lifecycle events.
    fn drain_signals(&mut self, now: Instant) {
        if self.signals.is_empty() {
            return;
        }
        let mut signals = std::mem::take(&mut self.signals);
        let quiet = Duration::from_millis(self.options.animation.moveend_debounce_ms);
        for signal in signals.drain(..) {
            match signal {
                HandlerSignal::Change {
                    axes,
                    original_event,
                } => {
                    if self.animation.is_some() {
                        self.finish_animation(false, now);
                    }
                    let state = self.transform.pose();
                    let original = original_event.as_ref();
                    self.lifecycle.start(axes, original, &self.events, state);
                    self.lifecycle.frame(axes, original, &self.events, state);
                    self.lifecycle.defer_end(now + quiet);
                    fire(&self.events, EventKind::RenderFrame, state, original);
                }
                HandlerSignal::CooperativeHint { original_event } => {
                    fire(
                        &self.events,
                        EventKind::CooperativeGestureHint,
                        self.transform.pose(),
                        original_event.as_ref(),
                    );
                }
            }
        }
        self.signals = signals;
    }

    /// End a gesture once no handler is busy and the debounce window
    /// passed without another change.
    fn end_quiet_gesture(&mut self, now: Instant) {
        if self.animation.is_some() || !self.lifecycle.is_moving() {
            return;
        }
        if self.handlers.is_active() || self.handlers.is_animating() {
            let quiet = Duration::from_millis(self.options.animation.moveend_debounce_ms);
            self.lifecycle.defer_end(now + quiet);
            return;
        }
        if !self.lifecycle.quiet_since(now) {
            return;
        }
        if self.lifecycle.active().rotate {
            self.snap_bearing();
        }
        let ended: Axes = self.lifecycle.end(None, &self.events, self.transform.pose());
        log::debug!("gesture ended: {ended:?}");
        self.correct_pan_bounds(now);
    }

    // ── Settling ───────────────────────────────────────────────────────

    /// Force bearing to exactly north when it ended close to it.
    fn snap_bearing(&mut self) {
        let bearing = self.transform.bearing();
        let snap = self.options.animation.bearing_snap;
        if bearing != 0.0 && bearing.abs() <= snap + SNAP_EPSILON {
            log::debug!("bearing {bearing:.3} snapped to north");
            self.transform.set_bearing(0.0);
            self.fire(EventKind::RenderFrame);
        }
    }

    /// Ease back inside the pan bounds after an overshoot. Guarded so a
    /// correction can't chain into another one.
    fn correct_pan_bounds(&mut self, now: Instant) {
        let Some(bounds) = self.transform.constraints().pan_bounds else {
            return;
        };
        if self.soft_bounds_guard.is_some_and(|until| now < until) {
            return;
        }
        let up_axis = self.transform.up_axis();
        let center = self.transform.center();
        let ground = up_axis.to_ground(center);
        let inside = bounds.clamp(ground);
        if inside == ground {
            return;
        }
        log::debug!("center {ground:?} outside pan bounds; easing back");
        let animation_options = &self.options.animation;
        self.soft_bounds_guard =
            Some(now + Duration::from_millis(animation_options.soft_bounds_guard_ms));
        let from = self.transform.pose();
        let to = Pose {
            center: up_axis.from_ground(inside, up_axis.elevation(center)),
            ..from
        };
        let animation = CameraAnimation::ease(
            from,
            to,
            up_axis,
            Duration::from_millis(animation_options.soft_bounds_ms),
            animation_options.easing,
            None,
            AnimationToken::new(),
        );
        let _ = self.start_animation(animation, AnimationKind::SoftBounds);
    }

    /// Pick up a resized surface.
    fn sync_viewport(&mut self) {
        let Some(surface) = &self.surface else {
            return;
        };
        let viewport = surface_viewport(surface.as_ref());
        if viewport.is_degenerate() || viewport == self.transform.viewport() {
            return;
        }
        log::debug!("surface resized to {}x{}", viewport.width, viewport.height);
        self.transform.set_viewport(viewport);
        self.fire(EventKind::RenderFrame);
    }
}
