use std::rc::Rc;

use glam::DVec2;
use web_time::{Duration, Instant};

use super::{Binding, GestureHandler, HandlerContext};
use crate::events::Axes;
use crate::input::event::{InputEvent, Modifiers, MouseButton, PointerKind};
use crate::options::DoubleClickOptions;
use crate::surface::Surface;

#[derive(Debug, Clone, Copy)]
struct Press {
    id: u64,
    position: DVec2,
}

#[derive(Debug, Clone, Copy)]
struct Click {
    kind: PointerKind,
    position: DVec2,
    at: Instant,
}

/// Zooms one step in (out with shift) around a double click or double tap.
///
/// Clicks are paired from pointer down/up timing; a host-reported
/// [`InputEvent::DoubleClick`] is honored too, unless the same double
/// click was already recognized from the pointer stream.
pub struct DoubleClickHandler {
    options: DoubleClickOptions,
    binding: Binding,
    press: Option<Press>,
    last_click: Option<Click>,
    last_zoom: Option<Instant>,
}

impl DoubleClickHandler {
    /// Handler with the given options (not yet enabled).
    #[must_use]
    pub fn new(options: DoubleClickOptions) -> Self {
        Self {
            options,
            binding: Binding::default(),
            press: None,
            last_click: None,
            last_zoom: None,
        }
    }

    /// Current options.
    #[must_use]
    pub fn options(&self) -> &DoubleClickOptions {
        &self.options
    }

    fn max_interval(&self) -> Duration {
        Duration::from_millis(self.options.max_interval_ms)
    }

    fn zoom_at(
        &mut self,
        position: DVec2,
        modifiers: Modifiers,
        event: &InputEvent,
        ctx: &mut HandlerContext<'_>,
    ) {
        let step = if modifiers.shift {
            -self.options.zoom_step
        } else {
            self.options.zoom_step
        };
        let before = ctx.transform.zoom();
        let helper = ctx.helper;
        let _ = ctx.transform.anchored(position, self.options.anchor_tightness, |t| {
            helper.roll_pitch_bearing_zoom(t, 0.0, 0.0, 0.0, step);
        });
        self.last_zoom = Some(ctx.now);
        self.last_click = None;
        if ctx.transform.zoom() != before {
            log::debug!("double click zoom {step:+} at {position:?}");
            ctx.emit(Axes::ZOOM.union(Axes::PAN), Some(event));
        }
    }

    fn on_release(
        &mut self,
        id: u64,
        kind: PointerKind,
        position: DVec2,
        modifiers: Modifiers,
        event: &InputEvent,
        ctx: &mut HandlerContext<'_>,
    ) -> bool {
        let Some(press) = self.press.take().filter(|p| p.id == id) else {
            return false;
        };
        // a drag is not a click
        if position.distance(press.position) > self.options.max_distance_px {
            self.last_click = None;
            return false;
        }
        let click = Click {
            kind,
            position,
            at: ctx.now,
        };
        let paired = self.last_click.is_some_and(|prev| {
            prev.kind.is_mouse_like() == kind.is_mouse_like()
                && click.at.saturating_duration_since(prev.at) <= self.max_interval()
                && click.position.distance(prev.position) <= self.options.max_distance_px
        });
        if paired {
            self.zoom_at(position, modifiers, event, ctx);
            true
        } else {
            self.last_click = Some(click);
            false
        }
    }
}

impl GestureHandler for DoubleClickHandler {
    fn name(&self) -> &'static str {
        "double_click"
    }

    fn enable(&mut self, surface: Option<&Rc<dyn Surface>>) {
        if self.binding.bind(surface) {
            log::debug!("double click zoom enabled");
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
                button: MouseButton::Left,
                position,
                ..
            } => {
                if self.press.is_some() {
                    // a second finger: not a tap
                    self.press = None;
                    self.last_click = None;
                } else {
                    self.press = Some(Press { id, position });
                }
                false
            }
            InputEvent::PointerUp {
                id,
                kind,
                button: MouseButton::Left,
                position,
                modifiers,
            } => self.on_release(id, kind, position, modifiers, event, ctx),
            InputEvent::PointerCancel { id, .. } => {
                if self.press.is_some_and(|p| p.id == id) {
                    self.press = None;
                }
                false
            }
            InputEvent::DoubleClick { position, modifiers } => {
                let recent = self
                    .last_zoom
                    .is_some_and(|t| ctx.now.saturating_duration_since(t) <= self.max_interval());
                if recent {
                    return false;
                }
                self.zoom_at(position, modifiers, event, ctx);
                true
            }
            _ => false,
        }
    }

    fn stop(&mut self) {
        self.press = None;
        self.last_click = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::PlanarHelper;
    use crate::input::handlers::testing::{down, transform, up};
    use crate::surface::testing::FakeSurface;

    const NO: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    fn enabled() -> DoubleClickHandler {
        let surface: Rc<dyn Surface> = Rc::new(FakeSurface::new(800.0, 600.0));
        let mut handler = DoubleClickHandler::new(DoubleClickOptions::default());
        handler.enable(Some(&surface));
        handler
    }

    fn click(
        handler: &mut DoubleClickHandler,
        t: &mut crate::camera::Transform,
        now: Instant,
        kind: PointerKind,
        at: DVec2,
        modifiers: Modifiers,
    ) -> bool {
        let mut signals = Vec::new();
        let mut ctx = HandlerContext::new(t, &PlanarHelper, now, Duration::ZERO, &mut signals);
        let _ = handler.handle_event(&down(1, kind, MouseButton::Left, at.x, at.y, modifiers), &mut ctx);
        handler.handle_event(&up(1, kind, MouseButton::Left, at.x, at.y, modifiers), &mut ctx)
    }

    #[test]
    fn double_click_zooms_in_around_pointer() {
        let mut handler = enabled();
        let mut t = transform();
        t.set_zoom(2.0);
        let at = DVec2::new(600.0, 200.0);
        let anchor = t.screen_to_world(at).unwrap();
        let start = Instant::now();
        assert!(!click(&mut handler, &mut t, start, PointerKind::Mouse, at, NO));
        assert!(click(
            &mut handler,
            &mut t,
            start + Duration::from_millis(200),
            PointerKind::Mouse,
            at,
            NO
        ));
        assert!((t.zoom() - 3.0).abs() < 1e-9);
        assert!((t.world_to_screen(anchor) - at).length() < 1.0);
    }

    #[test]
    fn shift_double_tap_zooms_out() {
        let mut handler = enabled();
        let mut t = transform();
        t.set_zoom(2.0);
        let at = DVec2::new(400.0, 300.0);
        let start = Instant::now();
        let _ = click(&mut handler, &mut t, start, PointerKind::Touch, at, Modifiers::SHIFT);
        let _ = click(
            &mut handler,
            &mut t,
            start + Duration::from_millis(100),
            PointerKind::Touch,
            at + DVec2::new(10.0, 5.0),
            Modifiers::SHIFT,
        );
        assert!((t.zoom() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn slow_or_distant_taps_do_not_pair() {
        let mut handler = enabled();
        let mut t = transform();
        let start = Instant::now();
        let at = DVec2::new(400.0, 300.0);
        let _ = click(&mut handler, &mut t, start, PointerKind::Touch, at, NO);
        assert!(!click(
            &mut handler,
            &mut t,
            start + Duration::from_millis(400),
            PointerKind::Touch,
            at,
            NO
        ));
        assert!(!click(
            &mut handler,
            &mut t,
            start + Duration::from_millis(500),
            PointerKind::Touch,
            at + DVec2::new(40.0, 0.0),
            NO
        ));
        assert_eq!(t.zoom(), 0.0);
    }

    #[test]
    fn host_double_click_is_not_applied_twice() {
        let mut handler = enabled();
        let mut t = transform();
        let at = DVec2::new(400.0, 300.0);
        let start = Instant::now();
        let _ = click(&mut handler, &mut t, start, PointerKind::Mouse, at, NO);
        let later = start + Duration::from_millis(150);
        let _ = click(&mut handler, &mut t, later, PointerKind::Mouse, at, NO);
        let mut signals = Vec::new();
        let mut ctx = HandlerContext::new(&mut t, &PlanarHelper, later, Duration::ZERO, &mut signals);
        let dbl = InputEvent::DoubleClick {
            position: at,
            modifiers: NO,
        };
        assert!(!handler.handle_event(&dbl, &mut ctx));
        assert!((t.zoom() - 1.0).abs() < 1e-9);
    }
}
