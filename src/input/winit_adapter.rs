//! Glue for winit hosts: window events in, [`InputEvent`]s out, and
//! [`Surface`] for `winit::window::Window`.

use glam::DVec2;
use winit::event::{ElementState, MouseScrollDelta, TouchPhase, WindowEvent};
use winit::keyboard::PhysicalKey;
use winit::window::Window;

use super::event::{InputEvent, Modifiers, MouseButton, PointerKind, WheelDeltaMode};
use crate::surface::Surface;

/// Pointer id used for the mouse. Touch ids are offset past it.
const MOUSE_ID: u64 = 0;

impl From<winit::event::MouseButton> for MouseButton {
    fn from(button: winit::event::MouseButton) -> Self {
        match button {
            winit::event::MouseButton::Right => Self::Right,
            winit::event::MouseButton::Middle => Self::Middle,
            _ => Self::Left,
        }
    }
}

impl From<winit::keyboard::ModifiersState> for Modifiers {
    fn from(state: winit::keyboard::ModifiersState) -> Self {
        Self {
            shift: state.shift_key(),
            ctrl: state.control_key(),
            alt: state.alt_key(),
            meta: state.super_key(),
        }
    }
}

/// Converts winit window events into [`InputEvent`]s.
///
/// winit reports the cursor position only on `CursorMoved` and
/// positions in physical pixels, so the adapter tracks both the last
/// cursor position and the scale factor.
#[derive(Debug, Clone)]
pub struct WinitInputAdapter {
    scale_factor: f64,
    cursor: DVec2,
    modifiers: Modifiers,
    gesture: Option<(f64, f64)>,
}

impl WinitInputAdapter {
    /// Adapter for a window with the given scale factor.
    #[must_use]
    pub fn new(scale_factor: f64) -> Self {
        Self {
            scale_factor: if scale_factor > 0.0 { scale_factor } else { 1.0 },
            cursor: DVec2::ZERO,
            modifiers: Modifiers::default(),
            gesture: None,
        }
    }

    /// Adapter for `window`.
    #[must_use]
    pub fn for_window(window: &Window) -> Self {
        Self::new(window.scale_factor())
    }

    /// Last known cursor position, logical pixels.
    #[must_use]
    pub fn cursor(&self) -> DVec2 {
        self.cursor
    }

    fn logical(&self, x: f64, y: f64) -> DVec2 {
        DVec2::new(x, y) / self.scale_factor
    }

    /// Translate one window event. Events the camera doesn't care about
    /// yield `None`.
    pub fn translate(&mut self, event: &WindowEvent) -> Option<InputEvent> {
        match event {
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if *scale_factor > 0.0 {
                    self.scale_factor = *scale_factor;
                }
                None
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = self.logical(position.x, position.y);
                Some(InputEvent::PointerMove {
                    id: MOUSE_ID,
                    kind: PointerKind::Mouse,
                    position: self.cursor,
                    modifiers: self.modifiers,
                })
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = MouseButton::from(*button);
                Some(match state {
                    ElementState::Pressed => InputEvent::PointerDown {
                        id: MOUSE_ID,
                        kind: PointerKind::Mouse,
                        button,
                        position: self.cursor,
                        modifiers: self.modifiers,
                    },
                    ElementState::Released => InputEvent::PointerUp {
                        id: MOUSE_ID,
                        kind: PointerKind::Mouse,
                        button,
                        position: self.cursor,
                        modifiers: self.modifiers,
                    },
                })
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let (delta, mode) = wheel_delta(*delta, self.scale_factor);
                Some(InputEvent::Wheel {
                    delta,
                    mode,
                    position: self.cursor,
                    modifiers: self.modifiers,
                })
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = Modifiers::from(modifiers.state());
                Some(InputEvent::ModifiersChanged(self.modifiers))
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(code) = event.physical_key else {
                    return None;
                };
                Some(InputEvent::Key {
                    code: format!("{code:?}"),
                    pressed: event.state == ElementState::Pressed,
                    modifiers: self.modifiers,
                    editable_target: false,
                })
            }
            WindowEvent::Touch(touch) => {
                let id = touch.id + 1;
                let position = self.logical(touch.location.x, touch.location.y);
                let kind = PointerKind::Touch;
                let modifiers = self.modifiers;
                Some(match touch.phase {
                    TouchPhase::Started => InputEvent::PointerDown {
                        id,
                        kind,
                        button: MouseButton::Left,
                        position,
                        modifiers,
                    },
                    TouchPhase::Moved => InputEvent::PointerMove {
                        id,
                        kind,
                        position,
                        modifiers,
                    },
                    TouchPhase::Ended => InputEvent::PointerUp {
                        id,
                        kind,
                        button: MouseButton::Left,
                        position,
                        modifiers,
                    },
                    TouchPhase::Cancelled => InputEvent::PointerCancel { id, kind },
                })
            }
            WindowEvent::PinchGesture { delta, phase, .. } => {
                self.gesture_step(*phase, |scale, rotation| ((scale * (1.0 + *delta)).max(1e-3), rotation))
            }
            WindowEvent::RotationGesture { delta, phase, .. } => {
                // winit reports counter-clockwise degrees
                let delta = f64::from(*delta);
                self.gesture_step(*phase, |scale, rotation| (scale, rotation - delta))
            }
            WindowEvent::Focused(false) => {
                self.modifiers = Modifiers::default();
                self.gesture = None;
                Some(InputEvent::FocusLost)
            }
            _ => None,
        }
    }

    /// Fold one pinch/rotate increment into the running gesture.
    fn gesture_step(
        &mut self,
        phase: TouchPhase,
        apply: impl FnOnce(f64, f64) -> (f64, f64),
    ) -> Option<InputEvent> {
        match phase {
            TouchPhase::Started if self.gesture.is_none() => {
                self.gesture = Some(apply(1.0, 0.0));
                Some(InputEvent::GestureStart {
                    position: self.cursor,
                })
            }
            TouchPhase::Started | TouchPhase::Moved => {
                let (scale, rotation) = self.gesture.unwrap_or((1.0, 0.0));
                let next = apply(scale, rotation);
                self.gesture = Some(next);
                Some(InputEvent::GestureChange {
                    position: self.cursor,
                    scale: next.0,
                    rotation: next.1,
                })
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                self.gesture.take().map(|_| InputEvent::GestureEnd)
            }
        }
    }
}

/// Wheel delta in DOM orientation (positive y scrolls down).
fn wheel_delta(delta: MouseScrollDelta, scale_factor: f64) -> (DVec2, WheelDeltaMode) {
    match delta {
        MouseScrollDelta::LineDelta(x, y) => (
            -DVec2::new(f64::from(x), f64::from(y)),
            WheelDeltaMode::Line,
        ),
        MouseScrollDelta::PixelDelta(pos) => (
            -DVec2::new(pos.x, pos.y) / scale_factor,
            WheelDeltaMode::Pixel,
        ),
    }
}

impl Surface for Window {
    fn client_size(&self) -> DVec2 {
        let size = self.inner_size().to_logical::<f64>(self.scale_factor());
        DVec2::new(size.width, size.height)
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.scale_factor()
    }

    fn request_frame(&self) {
        self.request_redraw();
    }
}

#[cfg(test)]
mod tests {
    use winit::dpi::PhysicalPosition;

    use super::*;

    #[test]
    fn wheel_is_flipped_to_dom_orientation() {
        let (d, mode) = wheel_delta(MouseScrollDelta::LineDelta(0.0, 1.0), 2.0);
        assert_eq!(mode, WheelDeltaMode::Line);
        assert_eq!(d, DVec2::new(0.0, -1.0));

        let (d, mode) = wheel_delta(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -40.0)), 2.0);
        assert_eq!(mode, WheelDeltaMode::Pixel);
        assert_eq!(d, DVec2::new(0.0, 20.0));
    }

    #[test]
    fn focus_loss_clears_modifiers() {
        let mut adapter = WinitInputAdapter::new(1.0);
        adapter.modifiers = Modifiers::SHIFT;
        assert_eq!(adapter.translate(&WindowEvent::Focused(false)), Some(InputEvent::FocusLost));
        assert_eq!(adapter.modifiers, Modifiers::default());
    }

    #[test]
    fn gesture_accumulates_from_start() {
        let mut adapter = WinitInputAdapter::new(1.0);
        assert!(matches!(
            adapter.gesture_step(TouchPhase::Started, |s, r| (s, r)),
            Some(InputEvent::GestureStart { .. })
        ));
        let _ = adapter.gesture_step(TouchPhase::Moved, |s, r| (s * 1.5, r));
        let change = adapter.gesture_step(TouchPhase::Moved, |s, r| (s, r - 10.0));
        assert_eq!(
            change,
            Some(InputEvent::GestureChange {
                position: DVec2::ZERO,
                scale: 1.5,
                rotation: -10.0,
            })
        );
        assert_eq!(adapter.gesture_step(TouchPhase::Ended, |s, r| (s, r)), Some(InputEvent::GestureEnd));
        assert_eq!(adapter.gesture_step(TouchPhase::Ended, |s, r| (s, r)), None);
    }
}
