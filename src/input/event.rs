use glam::DVec2;

/// Platform-agnostic input events.
///
/// Positions are in logical pixels relative to the surface's top-left
/// corner. These are fed into the controller's
/// [`handle_input`](crate::CameraController::handle_input), which fans
/// them out to every enabled gesture handler.
///
/// # Example
///
/// ```ignore
/// controller.handle_input(&InputEvent::Wheel {
///     delta: DVec2::new(0.0, -120.0),
///     mode: WheelDeltaMode::Pixel,
///     position: DVec2::new(400.0, 300.0),
///     modifiers: Modifiers::default(),
/// });
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// A mouse button, finger or pen went down.
    PointerDown {
        /// Stable id for the pointer until it is released.
        id: u64,
        /// Mouse, touch or pen.
        kind: PointerKind,
        /// Which button (touches report [`MouseButton::Left`]).
        button: MouseButton,
        /// Position.
        position: DVec2,
        /// Held modifiers.
        modifiers: Modifiers,
    },
    /// A pointer moved.
    PointerMove {
        /// Pointer id.
        id: u64,
        /// Mouse, touch or pen.
        kind: PointerKind,
        /// Position.
        position: DVec2,
        /// Held modifiers.
        modifiers: Modifiers,
    },
    /// A pointer was released.
    PointerUp {
        /// Pointer id.
        id: u64,
        /// Mouse, touch or pen.
        kind: PointerKind,
        /// Which button.
        button: MouseButton,
        /// Position.
        position: DVec2,
        /// Held modifiers.
        modifiers: Modifiers,
    },
    /// The platform took the pointer away (touch cancel, capture loss).
    PointerCancel {
        /// Pointer id.
        id: u64,
        /// Mouse, touch or pen.
        kind: PointerKind,
    },
    /// Scroll wheel or trackpad scroll. Positive `delta.y` scrolls down
    /// (zooms out).
    Wheel {
        /// Scroll amount in `mode` units.
        delta: DVec2,
        /// Unit of `delta`.
        mode: WheelDeltaMode,
        /// Pointer position.
        position: DVec2,
        /// Held modifiers (browsers report trackpad pinch as ctrl+wheel).
        modifiers: Modifiers,
    },
    /// Platform-detected double click. Hosts without one can rely on the
    /// double-click handler's own down/up timing instead.
    DoubleClick {
        /// Position.
        position: DVec2,
        /// Held modifiers.
        modifiers: Modifiers,
    },
    /// Key pressed or released.
    Key {
        /// Physical key in the `winit::keyboard::KeyCode` debug format:
        /// `"KeyQ"`, `"ArrowUp"`, `"Equal"`, etc.
        code: String,
        /// `true` for press, `false` for release.
        pressed: bool,
        /// Held modifiers.
        modifiers: Modifiers,
        /// Whether focus is in a text field; such keys are left alone.
        editable_target: bool,
    },
    /// Trackpad pinch/rotate gesture began.
    GestureStart {
        /// Gesture focus.
        position: DVec2,
    },
    /// Trackpad gesture update, relative to its start.
    GestureChange {
        /// Gesture focus.
        position: DVec2,
        /// Cumulative scale since start (1 = unchanged).
        scale: f64,
        /// Cumulative clockwise rotation since start, degrees.
        rotation: f64,
    },
    /// Trackpad gesture ended.
    GestureEnd,
    /// Modifier key state changed.
    ModifiersChanged(Modifiers),
    /// The surface lost keyboard/pointer focus; in-flight drags end.
    FocusLost,
}

impl InputEvent {
    /// Pointer or gesture position, if the event has one.
    #[must_use]
    pub fn position(&self) -> Option<DVec2> {
        match self {
            Self::PointerDown { position, .. }
            | Self::PointerMove { position, .. }
            | Self::PointerUp { position, .. }
            | Self::Wheel { position, .. }
            | Self::DoubleClick { position, .. }
            | Self::GestureStart { position }
            | Self::GestureChange { position, .. } => Some(*position),
            _ => None,
        }
    }

    /// Modifiers carried by the event, if any.
    #[must_use]
    pub fn modifiers(&self) -> Option<Modifiers> {
        match self {
            Self::PointerDown { modifiers, .. }
            | Self::PointerMove { modifiers, .. }
            | Self::PointerUp { modifiers, .. }
            | Self::Wheel { modifiers, .. }
            | Self::DoubleClick { modifiers, .. }
            | Self::Key { modifiers, .. }
            | Self::ModifiersChanged(modifiers) => Some(*modifiers),
            _ => None,
        }
    }
}

/// Platform-agnostic mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary (left) mouse button.
    Left,
    /// Secondary (right) mouse button.
    Right,
    /// Middle mouse button (wheel click).
    Middle,
}

/// What produced a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKind {
    /// Mouse.
    Mouse,
    /// Finger.
    Touch,
    /// Stylus; handled like a mouse.
    Pen,
}

impl PointerKind {
    /// Whether handlers should treat this pointer like a mouse.
    #[must_use]
    pub fn is_mouse_like(self) -> bool {
        matches!(self, Self::Mouse | Self::Pen)
    }
}

/// Unit of a wheel delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WheelDeltaMode {
    /// Pixels (trackpads, most wheels).
    #[default]
    Pixel,
    /// Lines (classic notched wheels on some platforms).
    Line,
    /// Pages.
    Page,
}

/// Held modifier keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    /// Shift.
    pub shift: bool,
    /// Control.
    pub ctrl: bool,
    /// Alt / Option.
    pub alt: bool,
    /// Command / Windows key.
    pub meta: bool,
}

impl Modifiers {
    /// Only shift held.
    pub const SHIFT: Self = Self {
        shift: true,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Ctrl on most platforms, Cmd on macOS.
    #[must_use]
    pub fn ctrl_or_meta(self) -> bool {
        self.ctrl || self.meta
    }
}
