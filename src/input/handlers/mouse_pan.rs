use std::rc::Rc;

use glam::DVec2;
use web_time::{Duration, Instant};

use super::{decay, drag_ground, Binding, GestureHandler, HandlerContext, VelocitySampler};
use crate::events::Axes;
use crate::input::event::{InputEvent, Modifiers, MouseButton};
use crate::options::MousePanOptions;
use crate::surface::Surface;
use crate::util::math::rubberband_factor;

#[derive(Debug, Clone)]
struct Drag {
    id: u64,
    start: DVec2,
    last: DVec2,
    last_time: Instant,
    last_velocity: DVec2,
    dragging: bool,
}

/// Pans by dragging with the primary button, keeping the grabbed ground
/// point under the cursor.
pub struct MousePanHandler {
    options: MousePanOptions,
    binding: Binding,
    drag: Option<Drag>,
    sampler: VelocitySampler,
    glide: DVec2,
}

impl MousePanHandler {
    /// Handler with the given options (not yet enabled).
    #[must_use]
    pub fn new(options: MousePanOptions) -> Self {
        let window = Duration::from_millis(options.inertia_window_ms);
        Self {
            options,
            binding: Binding::default(),
            drag: None,
            sampler: VelocitySampler::new(window),
            glide: DVec2::ZERO,
        }
    }

    /// Current options.
    #[must_use]
    pub fn options(&self) -> &MousePanOptions {
        &self.options
    }

    /// Whether the pointer has moved past the drag threshold.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.as_ref().is_some_and(|d| d.dragging)
    }

    fn claims(button: MouseButton, modifiers: Modifiers) -> bool {
        // Shift-drag is box zoom; alt-drag rotates.
        button == MouseButton::Left && !modifiers.shift && !modifiers.alt
    }

    /// Drag the ground from `from` to `to`, damped while the center is past
    /// the pan bounds. Returns the damping factor applied.
    fn pan_between(&self, ctx: &mut HandlerContext<'_>, from: DVec2, to: DVec2) -> f64 {
        let transform = &*ctx.transform;
        let overshoot = transform.pan_overshoot_px(transform.ground_center());
        let height = transform.viewport().height.max(1.0);
        let damping = rubberband_factor(overshoot / height, self.options.rubberband_strength);
        drag_ground(ctx, from, to, damping);
        damping
    }

    fn on_move(&mut self, event: &InputEvent, id: u64, position: DVec2, ctx: &mut HandlerContext<'_>) -> bool {
        let Some(drag) = self.drag.as_mut() else {
            return false;
        };
        if drag.id != id {
            return false;
        }
        if !drag.dragging {
            if position.distance(drag.start) < self.options.drag_threshold_px {
                return false;
            }
            drag.dragging = true;
        }

        let from = drag.last;
        let dt = ctx.now.saturating_duration_since(drag.last_time).as_secs_f64();
        let delta = position - from;
        drag.last_velocity = delta / dt.max(1.0 / 240.0);
        drag.last = position;
        drag.last_time = ctx.now;
        self.sampler.push(ctx.now, delta);

        let _ = self.pan_between(ctx, from, position);
        ctx.emit(Axes::PAN, Some(event));
        true
    }

    fn on_release(&mut self, ctx: &HandlerContext<'_>) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        if !drag.dragging {
            self.sampler.clear();
            return false;
        }
        let release = self.sampler.velocity(ctx.now);
        self.sampler.clear();
        // A deceleration stroke can leave the window average pointing the
        // other way; only glide when it agrees with the last movement.
        self.glide = if self.options.inertia && release.dot(drag.last_velocity) > 0.0 {
            release.clamp_length_max(self.options.max_speed)
        } else {
            DVec2::ZERO
        };
        if self.glide.length() < self.options.min_speed {
            self.glide = DVec2::ZERO;
        }
        true
    }
}

impl GestureHandler for MousePanHandler {
    fn name(&self) -> &'static str {
        "mouse_pan"
    }

    fn enable(&mut self, surface: Option<&Rc<dyn Surface>>) {
        if self.binding.bind(surface) {
            log::debug!("mouse pan enabled");
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
        self.is_dragging()
    }

    fn is_animating(&self) -> bool {
        self.glide != DVec2::ZERO
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
            InputEvent::PointerDown {
                id,
                kind,
                button,
                position,
                modifiers,
            } if kind.is_mouse_like() && Self::claims(button, modifiers) => {
                self.glide = DVec2::ZERO;
                self.sampler.clear();
                self.drag = Some(Drag {
                    id,
                    start: position,
                    last: position,
                    last_time: ctx.now,
                    last_velocity: DVec2::ZERO,
                    dragging: false,
                });
                true
            }
            InputEvent::PointerMove {
                id, kind, position, ..
            } if kind.is_mouse_like() => self.on_move(event, id, position, ctx),
            InputEvent::PointerUp { id, kind, .. }
                if kind.is_mouse_like() && self.drag.as_ref().is_some_and(|d| d.id == id) =>
            {
                self.on_release(ctx)
            }
            InputEvent::PointerCancel { id, .. } if self.drag.as_ref().is_some_and(|d| d.id == id) => {
                self.stop();
                true
            }
            InputEvent::FocusLost => {
                self.drag = None;
                false
            }
            _ => false,
        }
    }

    fn tick(&mut self, ctx: &mut HandlerContext<'_>) {
        if self.glide == DVec2::ZERO || ctx.dt.is_zero() {
            return;
        }
        let step = self.glide * ctx.dt.as_secs_f64();
        let center = ctx.transform.center_point();
        let _ = self.pan_between(ctx, center, center + step);
        self.glide *= decay(self.options.friction, ctx.dt);
        if self.glide.length() < self.options.min_speed {
            self.glide = DVec2::ZERO;
        }
        ctx.emit(Axes::PAN, None);
    }

    fn stop(&mut self) {
        self.drag = None;
        self.glide = DVec2::ZERO;
        self.sampler.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{GroundBounds, GroundPoint, Constraints, PlanarHelper};
    use crate::input::event::PointerKind;
    use crate::input::handlers::testing::{down, mv, transform, up};
    use crate::surface::testing::FakeSurface;

    const M: PointerKind = PointerKind::Mouse;
    const L: MouseButton = MouseButton::Left;

    fn enabled() -> MousePanHandler {
        let surface: Rc<dyn Surface> = Rc::new(FakeSurface::new(800.0, 600.0));
        let mut handler = MousePanHandler::new(MousePanOptions::default());
        handler.enable(Some(&surface));
        handler
    }

    #[test]
    fn small_moves_are_clicks() {
        let mut handler = enabled();
        let mut t = transform();
        let mut signals = Vec::new();
        let now = Instant::now();
        let mut ctx = HandlerContext::new(&mut t, &PlanarHelper, now, Duration::ZERO, &mut signals);
        assert!(handler.handle_event(&down(1, M, L, 100.0, 100.0, Modifiers::default()), &mut ctx));
        assert!(!handler.handle_event(&mv(1, M, 102.0, 101.0, Modifiers::default()), &mut ctx));
        assert!(!handler.is_dragging());
        assert!(!handler.handle_event(&up(1, M, L, 102.0, 101.0, Modifiers::default()), &mut ctx));
        assert_eq!(ctx.transform.center(), glam::DVec3::ZERO);
        assert!(signals.is_empty());
    }

    #[test]
    fn grabbed_point_follows_cursor() {
        let mut handler = enabled();
        let mut t = transform();
        t.defer_apply(|t| {
            t.set_zoom(3.0);
            t.set_pitch(45.0);
            t.set_bearing(20.0);
        });
        let grab = DVec2::new(300.0, 400.0);
        let world = t.screen_to_world(grab).unwrap();
        let mut signals = Vec::new();
        let mut now = Instant::now();
        let mut ctx = HandlerContext::new(&mut t, &PlanarHelper, now, Duration::ZERO, &mut signals);
        let _ = handler.handle_event(&down(1, M, L, grab.x, grab.y, Modifiers::default()), &mut ctx);
        let mut pos = grab;
        for _ in 0..5 {
            now += Duration::from_millis(16);
            pos += DVec2::new(20.0, -10.0);
            let mut ctx = HandlerContext::new(&mut t, &PlanarHelper, now, Duration::ZERO, &mut signals);
            assert!(handler.handle_event(&mv(1, M, pos.x, pos.y, Modifiers::default()), &mut ctx));
        }
        assert!((t.world_to_screen(world) - pos).length() < 1.0);
        assert_eq!(signals.len(), 5);
    }

    #[test]
    fn shift_and_alt_drags_are_left_alone() {
        let mut handler = enabled();
        let mut t = transform();
        let mut signals = Vec::new();
        let mut ctx = HandlerContext::new(&mut t, &PlanarHelper, Instant::now(), Duration::ZERO, &mut signals);
        let alt = Modifiers {
            alt: true,
            ..Modifiers::default()
        };
        assert!(!handler.handle_event(&down(1, M, L, 0.0, 0.0, Modifiers::SHIFT), &mut ctx));
        assert!(!handler.handle_event(&down(1, M, L, 0.0, 0.0, alt), &mut ctx));
        assert!(!handler.handle_event(&down(1, M, MouseButton::Right, 0.0, 0.0, Modifiers::default()), &mut ctx));
    }

    #[test]
    fn consistent_release_glides_and_reversal_does_not() {
        let mut t = transform();
        let mut signals = Vec::new();

        let run = |handler: &mut MousePanHandler, t: &mut crate::camera::Transform, signals: &mut Vec<_>, steps: &[f64]| {
            let mut now = Instant::now();
            let mut x = 400.0;
            let mut ctx = HandlerContext::new(t, &PlanarHelper, now, Duration::ZERO, signals);
            let _ = handler.handle_event(&down(1, M, L, x, 300.0, Modifiers::default()), &mut ctx);
            for dx in steps {
                now += Duration::from_millis(16);
                x += dx;
                let mut ctx = HandlerContext::new(t, &PlanarHelper, now, Duration::ZERO, signals);
                let _ = handler.handle_event(&mv(1, M, x, 300.0, Modifiers::default()), &mut ctx);
            }
            now += Duration::from_millis(5);
            let mut ctx = HandlerContext::new(t, &PlanarHelper, now, Duration::ZERO, signals);
            let _ = handler.handle_event(&up(1, M, L, x, 300.0, Modifiers::default()), &mut ctx);
        };

        let mut flung = enabled();
        run(&mut flung, &mut t, &mut signals, &[20.0, 20.0, 20.0, 20.0]);
        assert!(flung.is_animating());

        // Fast right, then a small step back to the left right at release.
        let mut reversed = enabled();
        run(&mut reversed, &mut t, &mut signals, &[30.0, 30.0, 30.0, -5.0]);
        assert!(!reversed.is_animating());
    }

    #[test]
    fn glide_decays_to_rest() {
        let mut handler = enabled();
        handler.glide = DVec2::new(800.0, 0.0);
        let mut t = transform();
        let mut signals = Vec::new();
        for _ in 0..200 {
            let mut ctx = HandlerContext::new(&mut t, &PlanarHelper, Instant::now(), Duration::from_millis(16), &mut signals);
            handler.tick(&mut ctx);
        }
        assert!(!handler.is_animating());
        // content followed the glide to the right, so the center moved west
        assert!(t.center().x < 0.0);
    }

    #[test]
    fn drag_past_bounds_is_damped() {
        let mut t = transform();
        t.set_constraints(Constraints {
            pan_bounds: Some(GroundBounds::new(GroundPoint::new(-1.0, -1.0), GroundPoint::new(1.0, 1.0))),
            pan_overshoot_px: 10_000.0,
            ..Constraints::default()
        });
        t.set_ground_center(GroundPoint::new(200.0, 0.0));
        let handler = enabled();
        let mut signals = Vec::new();
        let mut ctx = HandlerContext::new(&mut t, &PlanarHelper, Instant::now(), Duration::ZERO, &mut signals);
        let before = ctx.transform.center().x;
        let damping = handler.pan_between(&mut ctx, DVec2::new(400.0, 300.0), DVec2::new(300.0, 300.0));
        assert!(damping < 1.0);
        let moved = ctx.transform.center().x - before;
        assert!(moved > 0.0 && moved < 100.0, "{moved}");
    }
}
