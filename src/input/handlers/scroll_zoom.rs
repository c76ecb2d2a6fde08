use std::rc::Rc;

use glam::DVec2;
use web_time::{Duration, Instant};

use super::{decay, Binding, GestureHandler, HandlerContext};
use crate::events::Axes;
use crate::input::event::{InputEvent, Modifiers, WheelDeltaMode};
use crate::options::ScrollZoomOptions;
use crate::surface::Surface;
use crate::util::math::clamp;

/// Pixels per line for line-mode wheel deltas.
const LINE_HEIGHT_PX: f64 = 40.0;
/// Pixels per page for page-mode wheel deltas.
const PAGE_HEIGHT_PX: f64 = 800.0;
/// Inertia starts once scrolling has been quiet this long.
const INERTIA_QUIET: Duration = Duration::from_millis(50);
/// Inertia stops below this zoom velocity (levels per second).
const MIN_ZOOM_VELOCITY: f64 = 0.05;

/// What kind of device a scroll stream is coming from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollMode {
    /// Notched mouse wheel: few, large deltas.
    Wheel,
    /// Trackpad: many small deltas in quick succession.
    Trackpad,
}

/// Wheel/trackpad classifier with hysteresis: a single odd event doesn't
/// flip the mode, the opposite signal has to persist.
#[derive(Debug, Clone, Default)]
struct Classifier {
    mode: Option<ScrollMode>,
    last_event: Option<Instant>,
    opposite_since: Option<Instant>,
}

impl Classifier {
    fn classify(
        &mut self,
        now: Instant,
        delta_px: f64,
        mode: WheelDeltaMode,
        options: &ScrollZoomOptions,
    ) -> ScrollMode {
        let cadence = Duration::from_millis(options.trackpad_cadence_ms);
        let fast = self
            .last_event
            .is_some_and(|t| now.saturating_duration_since(t) < cadence);
        self.last_event = Some(now);

        let signal = if mode != WheelDeltaMode::Pixel {
            ScrollMode::Wheel
        } else if delta_px.abs() < options.trackpad_delta_px || fast {
            ScrollMode::Trackpad
        } else {
            ScrollMode::Wheel
        };

        let Some(current) = self.mode else {
            self.mode = Some(signal);
            return signal;
        };
        if signal == current {
            self.opposite_since = None;
            return current;
        }
        let since = *self.opposite_since.get_or_insert(now);
        let hysteresis = Duration::from_millis(options.hysteresis_ms);
        if now.saturating_duration_since(since) >= hysteresis {
            log::debug!("scroll mode {current:?} -> {signal:?}");
            self.mode = Some(signal);
            self.opposite_since = None;
            signal
        } else {
            current
        }
    }
}

/// Zooms on wheel and trackpad scroll, anchored at the cursor.
pub struct ScrollZoomHandler {
    options: ScrollZoomOptions,
    binding: Binding,
    classifier: Classifier,
    last_zoom_event: Option<Instant>,
    last_position: DVec2,
    velocity: f64,
    inertia: bool,
}

impl ScrollZoomHandler {
    /// Handler with the given options (not yet enabled).
    #[must_use]
    pub fn new(options: ScrollZoomOptions) -> Self {
        Self {
            options,
            binding: Binding::default(),
            classifier: Classifier::default(),
            last_zoom_event: None,
            last_position: DVec2::ZERO,
            velocity: 0.0,
            inertia: false,
        }
    }

    /// Current options.
    #[must_use]
    pub fn options(&self) -> &ScrollZoomOptions {
        &self.options
    }

    /// Switch cooperative mode (ctrl/cmd required to zoom).
    pub fn set_cooperative(&mut self, cooperative: bool) {
        self.options.cooperative = cooperative;
    }

    /// Mode the classifier has settled on, if any scroll has happened.
    #[must_use]
    pub fn mode(&self) -> Option<ScrollMode> {
        self.classifier.mode
    }

    fn apply_zoom(&self, ctx: &mut HandlerContext<'_>, position: DVec2, dz: f64) {
        let target = ctx.transform.zoom() + dz;
        if self.options.around_pointer {
            let _ = ctx.transform.anchored(
                position,
                self.options.anchor_tightness,
                |t| t.set_zoom(target),
            );
        } else {
            ctx.transform.set_zoom(target);
        }
    }

    fn on_wheel(
        &mut self,
        event: &InputEvent,
        delta: DVec2,
        mode: WheelDeltaMode,
        position: DVec2,
        modifiers: Modifiers,
        ctx: &mut HandlerContext<'_>,
    ) -> bool {
        if self.options.cooperative && !modifiers.ctrl_or_meta() {
            ctx.hint(event);
            return false;
        }

        let unit = match mode {
            WheelDeltaMode::Pixel => 1.0,
            WheelDeltaMode::Line => LINE_HEIGHT_PX,
            WheelDeltaMode::Page => PAGE_HEIGHT_PX,
        };
        let delta_px = delta.y * unit;
        if delta_px == 0.0 || !delta_px.is_finite() {
            return false;
        }

        let scroll_mode = self.classifier.classify(ctx.now, delta_px, mode, &self.options);
        let rate = match scroll_mode {
            ScrollMode::Wheel => self.options.wheel_zoom_rate,
            ScrollMode::Trackpad => self.options.trackpad_zoom_rate,
        };
        let max = self.options.max_zoom_per_event.abs();
        let dz = clamp(-delta_px * rate, -max, max);

        let before = ctx.transform.zoom();
        self.apply_zoom(ctx, position, dz);
        let applied = ctx.transform.zoom() - before;

        // Low-pass the instantaneous velocity for the inertia glide.
        let dt = self
            .last_zoom_event
            .map_or(1.0 / 60.0, |t| ctx.now.saturating_duration_since(t).as_secs_f64())
            .max(1.0 / 240.0);
        let instant = applied / dt;
        let alpha = clamp(self.options.velocity_smoothing, 0.0, 1.0);
        self.velocity = alpha * instant + (1.0 - alpha) * self.velocity;
        self.last_zoom_event = Some(ctx.now);
        self.last_position = position;
        self.inertia = false;

        ctx.emit(Axes::ZOOM, Some(event));
        true
    }
}

impl GestureHandler for ScrollZoomHandler {
    fn name(&self) -> &'static str {
        "scroll_zoom"
    }

    fn enable(&mut self, surface: Option<&Rc<dyn Surface>>) {
        if self.binding.bind(surface) {
            log::debug!("scroll zoom enabled");
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
        false
    }

    fn is_animating(&self) -> bool {
        self.inertia || (self.velocity != 0.0 && self.last_zoom_event.is_some())
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
            InputEvent::Wheel {
                delta,
                mode,
                position,
                modifiers,
            } => self.on_wheel(event, delta, mode, position, modifiers, ctx),
            _ => false,
        }
    }

    fn tick(&mut self, ctx: &mut HandlerContext<'_>) {
        let Some(last) = self.last_zoom_event else {
            return;
        };
        if !self.inertia {
            let quiet = ctx.now.saturating_duration_since(last) >= INERTIA_QUIET;
            if !quiet {
                return;
            }
            let trackpad = self.classifier.mode == Some(ScrollMode::Trackpad);
            if !(self.options.inertia && trackpad) || self.velocity.abs() < MIN_ZOOM_VELOCITY {
                self.stop();
                return;
            }
            self.inertia = true;
        }

        let dt = ctx.dt.as_secs_f64();
        if dt <= 0.0 {
            return;
        }
        let before = ctx.transform.zoom();
        self.apply_zoom(ctx, self.last_position, self.velocity * dt);
        self.velocity *= decay(self.options.inertia_decay, ctx.dt);

        let hit_limit = ctx.transform.zoom() == before;
        if hit_limit || self.velocity.abs() < MIN_ZOOM_VELOCITY {
            self.stop();
        }
        if !hit_limit {
            ctx.emit(Axes::ZOOM, None);
        }
    }

    fn stop(&mut self) {
        self.velocity = 0.0;
        self.inertia = false;
        self.last_zoom_event = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::handlers::testing::transform;
    use crate::input::handlers::HandlerSignal;
    use crate::camera::PlanarHelper;
    use crate::surface::testing::FakeSurface;

    fn wheel(dy: f64, mode: WheelDeltaMode, modifiers: Modifiers) -> InputEvent {
        InputEvent::Wheel {
            delta: DVec2::new(0.0, dy),
            mode,
            position: DVec2::new(600.0, 200.0),
            modifiers,
        }
    }

    fn enabled(options: ScrollZoomOptions) -> ScrollZoomHandler {
        let surface: Rc<dyn Surface> = Rc::new(FakeSurface::new(800.0, 600.0));
        let mut handler = ScrollZoomHandler::new(options);
        handler.enable(Some(&surface));
        handler
    }

    #[test]
    fn classifier_needs_persistent_opposite_signal() {
        let options = ScrollZoomOptions::default();
        let mut c = Classifier::default();
        let t0 = Instant::now();
        assert_eq!(c.classify(t0, 100.0, WheelDeltaMode::Pixel, &options), ScrollMode::Wheel);
        // a single fast small event does not flip
        let t1 = t0 + Duration::from_millis(10);
        assert_eq!(c.classify(t1, 2.0, WheelDeltaMode::Pixel, &options), ScrollMode::Wheel);
        // but trackpad-like input persisting past the window does
        let mut t = t1;
        let mut mode = ScrollMode::Wheel;
        for _ in 0..20 {
            t += Duration::from_millis(16);
            mode = c.classify(t, 2.0, WheelDeltaMode::Pixel, &options);
        }
        assert_eq!(mode, ScrollMode::Trackpad);
        // line mode is always a wheel signal
        let later = t + Duration::from_millis(500);
        assert_eq!(c.classify(later, 3.0, WheelDeltaMode::Line, &options), ScrollMode::Trackpad);
    }

    #[test]
    fn wheel_zooms_out_and_keeps_pointer_anchor() {
        let mut handler = enabled(ScrollZoomOptions::default());
        let mut t = transform();
        t.set_zoom(4.0);
        t.set_pitch(30.0);
        let pointer = DVec2::new(600.0, 200.0);
        let anchor = t.screen_to_world(pointer).unwrap();
        let mut signals = Vec::new();
        let mut ctx = HandlerContext::new(&mut t, &PlanarHelper, Instant::now(), Duration::ZERO, &mut signals);

        assert!(handler.handle_event(&wheel(225.0, WheelDeltaMode::Pixel, Modifiers::default()), &mut ctx));
        assert!((ctx.transform.zoom() - 3.5).abs() < 1e-12);
        assert!((ctx.transform.world_to_screen(anchor) - pointer).length() < 1.0);
        assert!(matches!(signals[0], HandlerSignal::Change { axes, .. } if axes == Axes::ZOOM));
    }

    #[test]
    fn per_event_zoom_is_capped() {
        let mut handler = enabled(ScrollZoomOptions::default());
        let mut t = transform();
        t.set_zoom(10.0);
        let mut signals = Vec::new();
        let mut ctx = HandlerContext::new(&mut t, &PlanarHelper, Instant::now(), Duration::ZERO, &mut signals);
        let _ = handler.handle_event(&wheel(-10_000.0, WheelDeltaMode::Pixel, Modifiers::default()), &mut ctx);
        assert_eq!(ctx.transform.zoom(), 11.0);
    }

    #[test]
    fn cooperative_mode_wants_a_modifier() {
        let mut handler = enabled(ScrollZoomOptions {
            cooperative: true,
            ..ScrollZoomOptions::default()
        });
        let mut t = transform();
        let mut signals = Vec::new();
        let mut ctx = HandlerContext::new(&mut t, &PlanarHelper, Instant::now(), Duration::ZERO, &mut signals);
        assert!(!handler.handle_event(&wheel(-100.0, WheelDeltaMode::Pixel, Modifiers::default()), &mut ctx));
        assert_eq!(ctx.transform.zoom(), 0.0);

        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::default()
        };
        assert!(handler.handle_event(&wheel(-100.0, WheelDeltaMode::Pixel, ctrl), &mut ctx));
        assert!(ctx.transform.zoom() > 0.0);
        assert!(matches!(signals[0], HandlerSignal::CooperativeHint { .. }));
    }

    #[test]
    fn trackpad_scroll_glides_after_release() {
        let mut handler = enabled(ScrollZoomOptions::default());
        let mut t = transform();
        let mut now = Instant::now();
        let mut signals = Vec::new();
        for _ in 0..10 {
            now += Duration::from_millis(16);
            let mut ctx = HandlerContext::new(&mut t, &PlanarHelper, now, Duration::ZERO, &mut signals);
            let _ = handler.handle_event(&wheel(-4.0, WheelDeltaMode::Pixel, Modifiers::default()), &mut ctx);
        }
        assert_eq!(handler.mode(), Some(ScrollMode::Trackpad));
        let released = t.zoom();

        now += Duration::from_millis(60);
        let mut ctx = HandlerContext::new(&mut t, &PlanarHelper, now, Duration::from_millis(16), &mut signals);
        handler.tick(&mut ctx);
        assert!(handler.is_animating());
        assert!(t.zoom() > released);

        for _ in 0..300 {
            now += Duration::from_millis(16);
            let mut ctx = HandlerContext::new(&mut t, &PlanarHelper, now, Duration::from_millis(16), &mut signals);
            handler.tick(&mut ctx);
        }
        assert!(!handler.is_animating());
    }

    #[test]
    fn disabled_without_surface() {
        let mut handler = ScrollZoomHandler::new(ScrollZoomOptions::default());
        handler.enable(None);
        let mut t = transform();
        let mut signals = Vec::new();
        let mut ctx = HandlerContext::new(&mut t, &PlanarHelper, Instant::now(), Duration::ZERO, &mut signals);
        assert!(!handler.handle_event(&wheel(-100.0, WheelDeltaMode::Pixel, Modifiers::default()), &mut ctx));
        assert!(signals.is_empty());
    }
}
