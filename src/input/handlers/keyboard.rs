use std::rc::Rc;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::{Binding, GestureHandler, HandlerContext};
use crate::events::Axes;
use crate::input::event::InputEvent;
use crate::options::KeyboardOptions;
use crate::surface::Surface;

/// Camera actions that can be bound to keys.
///
/// Serde serializes as `snake_case` strings so TOML presets stay readable:
/// ```toml
/// [handlers.keyboard.bindings]
/// KeyW = "pan_up"
/// KeyS = "pan_down"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyAction {
    /// Move the view north (screen up).
    PanUp,
    /// Move the view south.
    PanDown,
    /// Move the view west.
    PanLeft,
    /// Move the view east.
    PanRight,
    /// One zoom step in.
    ZoomIn,
    /// One zoom step out.
    ZoomOut,
    /// Bearing counter-clockwise.
    RotateLeft,
    /// Bearing clockwise.
    RotateRight,
    /// Tilt toward the horizon.
    PitchUp,
    /// Tilt back toward top-down.
    PitchDown,
}

/// Steps the camera on key presses: arrows pan (twice as far with
/// shift), `+`/`-` zoom, `q`/`e` rotate, `PageUp`/`PageDown` pitch.
/// Keys typed into text fields are ignored.
pub struct KeyboardHandler {
    options: KeyboardOptions,
    binding: Binding,
}

impl KeyboardHandler {
    /// Handler with the given options (not yet enabled).
    #[must_use]
    pub fn new(options: KeyboardOptions) -> Self {
        Self {
            options,
            binding: Binding::default(),
        }
    }

    /// Current options.
    #[must_use]
    pub fn options(&self) -> &KeyboardOptions {
        &self.options
    }

    fn perform(&self, action: KeyAction, shift: bool, event: &InputEvent, ctx: &mut HandlerContext<'_>) {
        let o = &self.options;
        let pan = if shift { o.pan_step_px * 2.0 } else { o.pan_step_px };
        let before = ctx.transform.pose();
        let helper = ctx.helper;
        let t = &mut *ctx.transform;

        let axes = match action {
            KeyAction::PanUp => {
                helper.pan(t, DVec2::new(0.0, -pan));
                Axes::PAN
            }
            KeyAction::PanDown => {
                helper.pan(t, DVec2::new(0.0, pan));
                Axes::PAN
            }
            KeyAction::PanLeft => {
                helper.pan(t, DVec2::new(-pan, 0.0));
                Axes::PAN
            }
            KeyAction::PanRight => {
                helper.pan(t, DVec2::new(pan, 0.0));
                Axes::PAN
            }
            KeyAction::ZoomIn | KeyAction::ZoomOut => {
                let dz = if action == KeyAction::ZoomIn { o.zoom_step } else { -o.zoom_step };
                helper.roll_pitch_bearing_zoom(t, 0.0, 0.0, 0.0, dz);
                Axes::ZOOM
            }
            KeyAction::RotateLeft | KeyAction::RotateRight => {
                let db = if action == KeyAction::RotateRight {
                    o.bearing_step
                } else {
                    -o.bearing_step
                };
                helper.roll_pitch_bearing_zoom(t, 0.0, 0.0, db, 0.0);
                Axes::ROTATE
            }
            KeyAction::PitchUp | KeyAction::PitchDown => {
                let dp = if action == KeyAction::PitchUp { o.pitch_step } else { -o.pitch_step };
                helper.roll_pitch_bearing_zoom(t, 0.0, dp, 0.0, 0.0);
                Axes::PITCH
            }
        };

        // at a limit the pose doesn't move; don't report a change
        if ctx.transform.pose() != before {
            ctx.emit(axes, Some(event));
        }
    }
}

impl GestureHandler for KeyboardHandler {
    fn name(&self) -> &'static str {
        "keyboard"
    }

    fn enable(&mut self, surface: Option<&Rc<dyn Surface>>) {
        if self.binding.bind(surface) {
            log::debug!("keyboard enabled");
        }
    }

    fn disable(&mut self) {
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
        let InputEvent::Key {
            code,
            pressed: true,
            modifiers,
            editable_target: false,
        } = event
        else {
            return false;
        };
        // browser shortcuts (ctrl+minus etc.) belong to the host
        if modifiers.ctrl_or_meta() || modifiers.alt {
            return false;
        }
        let Some(action) = self.options.lookup(code) else {
            return false;
        };
        log::trace!("key {code} -> {action:?}");
        self.perform(action, modifiers.shift, event, ctx);
        true
    }

    fn stop(&mut self) {}
}
