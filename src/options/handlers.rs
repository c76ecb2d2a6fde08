use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::input::handlers::keyboard::KeyAction;

/// A handler switch: `false` to leave the handler out, `true` for its
/// defaults, or a table of options.
///
/// ```toml
/// [handlers]
/// keyboard = false
///
/// [handlers.scroll_zoom]
/// cooperative = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(untagged)]
pub enum HandlerSetting<T> {
    /// On with defaults, or off.
    Enabled(bool),
    /// On with these options.
    Custom(T),
}

impl<T> Default for HandlerSetting<T> {
    fn default() -> Self {
        Self::Enabled(true)
    }
}

impl<T: Clone + Default> HandlerSetting<T> {
    /// Options to construct the handler with, or `None` when disabled.
    #[must_use]
    pub fn resolve(&self) -> Option<T> {
        match self {
            Self::Enabled(true) => Some(T::default()),
            Self::Enabled(false) => None,
            Self::Custom(options) => Some(options.clone()),
        }
    }

    /// Whether the handler will be constructed.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Enabled(false))
    }
}

/// Which gesture handlers exist and how each behaves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Handlers")]
#[serde(default)]
pub struct HandlersOptions {
    /// Wheel and trackpad-scroll zoom.
    pub scroll_zoom: HandlerSetting<ScrollZoomOptions>,
    /// Left-drag pan.
    pub mouse_pan: HandlerSetting<MousePanOptions>,
    /// Right-drag (or alt-drag) rotate and pitch.
    pub mouse_rotate: HandlerSetting<MouseRotateOptions>,
    /// One- and two-finger touch gestures.
    pub touch: HandlerSetting<TouchOptions>,
    /// Arrow/zoom/rotate/pitch keys.
    pub keyboard: HandlerSetting<KeyboardOptions>,
    /// Double-click and double-tap zoom.
    pub double_click: HandlerSetting<DoubleClickOptions>,
    /// Shift-drag box zoom.
    pub box_zoom: HandlerSetting<BoxZoomOptions>,
    /// Trackpad pinch/rotate gesture events.
    pub gesture: HandlerSetting<GestureOptions>,
    /// Suppress the native context menu so right-drag can rotate.
    pub suppress_context_menu: bool,
}

impl Default for HandlersOptions {
    fn default() -> Self {
        Self {
            scroll_zoom: HandlerSetting::default(),
            mouse_pan: HandlerSetting::default(),
            mouse_rotate: HandlerSetting::default(),
            touch: HandlerSetting::default(),
            keyboard: HandlerSetting::default(),
            double_click: HandlerSetting::default(),
            box_zoom: HandlerSetting::default(),
            gesture: HandlerSetting::default(),
            suppress_context_menu: true,
        }
    }
}

impl HandlersOptions {
    /// Every handler switched off.
    #[must_use]
    pub fn none() -> Self {
        Self {
            scroll_zoom: HandlerSetting::Enabled(false),
            mouse_pan: HandlerSetting::Enabled(false),
            mouse_rotate: HandlerSetting::Enabled(false),
            touch: HandlerSetting::Enabled(false),
            keyboard: HandlerSetting::Enabled(false),
            double_click: HandlerSetting::Enabled(false),
            box_zoom: HandlerSetting::Enabled(false),
            gesture: HandlerSetting::Enabled(false),
            suppress_context_menu: false,
        }
    }
}

// ── Scroll zoom ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Scroll Zoom", inline)]
#[serde(default)]
/// Wheel/trackpad zoom parameters.
pub struct ScrollZoomOptions {
    /// Zoom levels per pixel of mouse-wheel scroll.
    #[schemars(title = "Wheel Rate", range(min = 0.0005, max = 0.02))]
    pub wheel_zoom_rate: f64,
    /// Zoom levels per pixel of trackpad scroll.
    #[schemars(title = "Trackpad Rate", range(min = 0.001, max = 0.1))]
    pub trackpad_zoom_rate: f64,
    /// Largest zoom change a single event may cause.
    pub max_zoom_per_event: f64,
    /// Keep the ground point under the cursor fixed.
    pub around_pointer: bool,
    /// How fully the anchor is held, 0..=1.
    #[schemars(range(min = 0.0, max = 1.0))]
    pub anchor_tightness: f64,
    /// Require ctrl/cmd to zoom so page scrolling passes through.
    pub cooperative: bool,
    /// Pixel deltas below this look like a trackpad.
    #[schemars(skip)]
    pub trackpad_delta_px: f64,
    /// Events closer together than this look like a trackpad.
    #[schemars(skip)]
    pub trackpad_cadence_ms: u64,
    /// How long the opposite signal must persist before the classifier
    /// flips between wheel and trackpad.
    #[schemars(skip)]
    pub hysteresis_ms: u64,
    /// Keep zooming briefly after a trackpad scroll stops.
    pub inertia: bool,
    /// Per-second exponential decay of the inertial zoom velocity.
    #[schemars(skip)]
    pub inertia_decay: f64,
    /// Smoothing factor of the velocity low-pass filter.
    #[schemars(skip)]
    pub velocity_smoothing: f64,
}

impl Default for ScrollZoomOptions {
    fn default() -> Self {
        Self {
            wheel_zoom_rate: 1.0 / 450.0,
            trackpad_zoom_rate: 1.0 / 100.0,
            max_zoom_per_event: 1.0,
            around_pointer: true,
            anchor_tightness: 1.0,
            cooperative: false,
            trackpad_delta_px: 16.0,
            trackpad_cadence_ms: 30,
            hysteresis_ms: 150,
            inertia: true,
            inertia_decay: 6.0,
            velocity_smoothing: 0.3,
        }
    }
}

// ── Mouse pan ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Mouse Pan", inline)]
#[serde(default)]
/// Drag-to-pan parameters.
pub struct MousePanOptions {
    /// Movement below this is a click, not a drag.
    pub drag_threshold_px: f64,
    /// Damping strength while dragged past the pan bounds.
    #[schemars(range(min = 0.0, max = 10.0))]
    pub rubberband_strength: f64,
    /// Keep gliding after release.
    pub inertia: bool,
    /// Window the release velocity is measured over.
    #[schemars(skip)]
    pub inertia_window_ms: u64,
    /// Per-second exponential decay of the glide.
    #[schemars(skip)]
    pub friction: f64,
    /// Glide speed cap, pixels per second.
    #[schemars(skip)]
    pub max_speed: f64,
    /// Glide stops below this speed, pixels per second.
    #[schemars(skip)]
    pub min_speed: f64,
}

impl Default for MousePanOptions {
    fn default() -> Self {
        Self {
            drag_threshold_px: 3.0,
            rubberband_strength: 1.0,
            inertia: true,
            inertia_window_ms: 100,
            friction: 6.0,
            max_speed: 1400.0,
            min_speed: 20.0,
        }
    }
}

// ── Mouse rotate ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Mouse Rotate", inline)]
#[serde(default)]
/// Drag-to-rotate/pitch parameters.
pub struct MouseRotateOptions {
    /// Bearing degrees per horizontal pixel.
    pub bearing_degrees_per_px: f64,
    /// Pitch degrees per vertical pixel (dragging up tilts).
    pub pitch_degrees_per_px: f64,
    /// Allow pitching.
    pub pitch: bool,
    /// Alt + left drag also rotates.
    pub alt_left_drag: bool,
    /// Holding shift during the drag only pitches.
    pub shift_pitch_only: bool,
    /// Keep the ground point under the press fixed.
    pub around_pointer: bool,
    /// How fully the anchor is held, 0..=1.
    #[schemars(range(min = 0.0, max = 1.0))]
    pub anchor_tightness: f64,
    /// Movement below this is a click, not a drag.
    pub drag_threshold_px: f64,
}

impl Default for MouseRotateOptions {
    fn default() -> Self {
        Self {
            bearing_degrees_per_px: 0.8,
            pitch_degrees_per_px: 0.5,
            pitch: true,
            alt_left_drag: true,
            shift_pitch_only: true,
            around_pointer: true,
            anchor_tightness: 1.0,
            drag_threshold_px: 3.0,
        }
    }
}

// ── Touch ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Touch", inline)]
#[serde(default)]
/// Touch gesture parameters. The disambiguation thresholds are tuned by
/// feel; adjust them per device class.
pub struct TouchOptions {
    /// One-finger (and locked two-finger) panning.
    pub pan: bool,
    /// Pinch zoom.
    pub zoom: bool,
    /// Twist rotate.
    pub rotate: bool,
    /// Two-finger vertical pitch.
    pub pitch: bool,
    /// Centroid travel that locks pan mode.
    pub pan_threshold_px: f64,
    /// Pinch distance change (zoom levels) that locks zoom/rotate mode.
    pub zoom_threshold: f64,
    /// Twist angle (degrees) that locks zoom/rotate mode.
    pub rotation_threshold_deg: f64,
    /// Vertical travel each finger needs before a pitch is recognized.
    pub pitch_displacement_px: f64,
    /// A pitch only starts if the second finger landed within this long
    /// after the first.
    pub allowed_single_touch_ms: u64,
    /// Pitch degrees per pixel of vertical finger travel.
    pub pitch_degrees_per_px: f64,
    /// How fully the centroid anchor is held, 0..=1.
    #[schemars(range(min = 0.0, max = 1.0))]
    pub anchor_tightness: f64,
    /// Keep moving after the fingers lift.
    pub inertia: bool,
    /// Per-second decay of the pan glide.
    pub pan_friction: f64,
    /// Per-second decay of the zoom glide.
    pub zoom_friction: f64,
    /// Per-second decay of the rotate glide.
    pub rotate_friction: f64,
    /// Window release velocities are measured over.
    #[schemars(skip)]
    pub inertia_window_ms: u64,
}

impl Default for TouchOptions {
    fn default() -> Self {
        Self {
            pan: true,
            zoom: true,
            rotate: true,
            pitch: true,
            pan_threshold_px: 3.0,
            zoom_threshold: 0.1,
            rotation_threshold_deg: 10.0,
            pitch_displacement_px: 10.0,
            allowed_single_touch_ms: 100,
            pitch_degrees_per_px: 0.5,
            anchor_tightness: 1.0,
            inertia: true,
            pan_friction: 6.0,
            zoom_friction: 8.0,
            rotate_friction: 8.0,
            inertia_window_ms: 100,
        }
    }
}

// ── Keyboard ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Keyboard", inline)]
#[serde(default)]
/// Keyboard navigation steps and bindings.
pub struct KeyboardOptions {
    /// Pixels per arrow press (doubled with shift).
    pub pan_step_px: f64,
    /// Zoom levels per +/- press.
    pub zoom_step: f64,
    /// Degrees per rotate press.
    pub bearing_step: f64,
    /// Degrees per pitch press.
    pub pitch_step: f64,
    /// Key string (`winit::keyboard::KeyCode` debug format) → action.
    #[schemars(skip)]
    pub bindings: HashMap<String, KeyAction>,
}

impl Default for KeyboardOptions {
    fn default() -> Self {
        let bindings = HashMap::from([
            ("ArrowUp".into(), KeyAction::PanUp),
            ("ArrowDown".into(), KeyAction::PanDown),
            ("ArrowLeft".into(), KeyAction::PanLeft),
            ("ArrowRight".into(), KeyAction::PanRight),
            ("Equal".into(), KeyAction::ZoomIn),
            ("NumpadAdd".into(), KeyAction::ZoomIn),
            ("Minus".into(), KeyAction::ZoomOut),
            ("NumpadSubtract".into(), KeyAction::ZoomOut),
            ("KeyQ".into(), KeyAction::RotateLeft),
            ("KeyE".into(), KeyAction::RotateRight),
            ("PageUp".into(), KeyAction::PitchUp),
            ("PageDown".into(), KeyAction::PitchDown),
        ]);
        Self {
            pan_step_px: 100.0,
            zoom_step: 1.0,
            bearing_step: 15.0,
            pitch_step: 10.0,
            bindings,
        }
    }
}

impl KeyboardOptions {
    /// Action bound to a key string.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<KeyAction> {
        self.bindings.get(key).copied()
    }
}

// ── Double click ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Double Click", inline)]
#[serde(default)]
/// Double-click/double-tap zoom parameters.
pub struct DoubleClickOptions {
    /// Zoom levels per double click (shift zooms out).
    pub zoom_step: f64,
    /// Longest gap between the two clicks.
    pub max_interval_ms: u64,
    /// Farthest the second click may land from the first.
    pub max_distance_px: f64,
    /// How fully the anchor is held, 0..=1.
    #[schemars(range(min = 0.0, max = 1.0))]
    pub anchor_tightness: f64,
}

impl Default for DoubleClickOptions {
    fn default() -> Self {
        Self {
            zoom_step: 1.0,
            max_interval_ms: 300,
            max_distance_px: 25.0,
            anchor_tightness: 1.0,
        }
    }
}

// ── Box zoom ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Box Zoom", inline)]
#[serde(default)]
/// Shift-drag box zoom parameters.
pub struct BoxZoomOptions {
    /// Boxes smaller than this (square pixels) are ignored.
    pub min_area_px: f64,
    /// Inset kept around the zoomed box.
    pub padding_px: f64,
}

impl Default for BoxZoomOptions {
    fn default() -> Self {
        Self {
            min_area_px: 100.0,
            padding_px: 0.0,
        }
    }
}

// ── Trackpad gesture ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Trackpad Gesture", inline)]
#[serde(default)]
/// Trackpad pinch/rotate gesture parameters.
pub struct GestureOptions {
    /// Pinch zooms.
    pub zoom: bool,
    /// Twist rotates.
    pub rotate: bool,
    /// How fully the anchor is held, 0..=1.
    #[schemars(range(min = 0.0, max = 1.0))]
    pub anchor_tightness: f64,
}

impl Default for GestureOptions {
    fn default() -> Self {
        Self {
            zoom: true,
            rotate: true,
            anchor_tightness: 1.0,
        }
    }
}
