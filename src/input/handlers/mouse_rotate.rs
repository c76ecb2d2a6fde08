use std::rc::Rc;

use glam::DVec2;

use super::{Binding, GestureHandler, HandlerContext};
use crate::events::Axes;
use crate::input::event::{InputEvent, Modifiers, MouseButton};
use crate::options::MouseRotateOptions;
use crate::surface::Surface;

#[derive(Debug, Clone, Copy)]
struct Drag {
    id: u64,
    start: DVec2,
    last: DVec2,
    dragging: bool,
}

/// Rotates (horizontal drag) and pitches (vertical drag) with the
/// secondary button, or the primary button while alt is held.
pub struct MouseRotateHandler {
    options: MouseRotateOptions,
    binding: Binding,
    drag: Option<Drag>,
    pitch_only: bool,
}

impl MouseRotateHandler {
    /// Handler with the given options (not yet enabled).
    #[must_use]
    pub fn new(options: MouseRotateOptions) -> Self {
        Self {
            options,
            binding: Binding::default(),
            drag: None,
            pitch_only: false,
        }
    }

    /// Current options.
    #[must_use]
    pub fn options(&self) -> &MouseRotateOptions {
        &self.options
    }

    fn claims(&self, button: MouseButton, modifiers: Modifiers) -> bool {
        button == MouseButton::Right
            || (self.options.alt_left_drag && button == MouseButton::Left && modifiers.alt)
    }

    fn on_move(
        &mut self,
        event: &InputEvent,
        id: u64,
        position: DVec2,
        modifiers: Modifiers,
        ctx: &mut HandlerContext<'_>,
    ) -> bool {
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
        let delta = position - drag.last;
        drag.last = position;
        let anchor = drag.start;

        let pitch_only = self.pitch_only || (self.options.shift_pitch_only && modifiers.shift);
        let d_bearing = if pitch_only {
            0.0
        } else {
            delta.x * self.options.bearing_degrees_per_px
        };
        let d_pitch = if self.options.pitch {
            -delta.y * self.options.pitch_degrees_per_px
        } else {
            0.0
        };
        if d_bearing == 0.0 && d_pitch == 0.0 {
            return true;
        }

        let (before_bearing, before_pitch) = (ctx.transform.bearing(), ctx.transform.pitch());
        let helper = ctx.helper;
        let apply = |t: &mut crate::camera::Transform| {
            helper.roll_pitch_bearing_zoom(t, 0.0, d_pitch, d_bearing, 0.0);
        };
        if self.options.around_pointer {
            let _ = ctx.transform.anchored(anchor, self.options.anchor_tightness, apply);
        } else {
            ctx.transform.defer_apply(apply);
        }

        let axes = Axes {
            rotate: ctx.transform.bearing() != before_bearing,
            pitch: ctx.transform.pitch() != before_pitch,
            ..Axes::NONE
        };
        ctx.emit(axes, Some(event));
        true
    }
}

impl GestureHandler for MouseRotateHandler {
    fn name(&self) -> &'static str {
        "mouse_rotate"
    }

    fn enable(&mut self, surface: Option<&Rc<dyn Surface>>) {
        if self.binding.bind(surface) {
            log::debug!("mouse rotate enabled");
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
        self.drag.is_some_and(|d| d.dragging)
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
            } if kind.is_mouse_like() && self.claims(button, modifiers) => {
                self.pitch_only = self.options.shift_pitch_only && modifiers.shift;
                self.drag = Some(Drag {
                    id,
                    start: position,
                    last: position,
                    dragging: false,
                });
                true
            }
            InputEvent::PointerMove {
                id,
                kind,
                position,
                modifiers,
            } if kind.is_mouse_like() => self.on_move(event, id, position, modifiers, ctx),
            InputEvent::PointerUp { id, .. } | InputEvent::PointerCancel { id, .. }
                if self.drag.is_some_and(|d| d.id == id) =>
            {
                let was_dragging = self.is_active();
                self.stop();
                was_dragging
            }
            InputEvent::FocusLost => {
                self.stop();
                false
            }
            _ => false,
        }
    }

    fn stop(&mut self) {
        self.drag = None;
        self.pitch_only = false;
    }

    fn uses_secondary_button(&self) -> bool {
        true
    }
}
