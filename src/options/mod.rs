//! Controller construction options with TOML preset support.
//!
//! Everything a host may tune (projection, initial view, constraints,
//! animation defaults, and every gesture handler's thresholds) lives in
//! [`ControllerOptions`]. Options serialize to/from TOML so a host can
//! ship presets, and [`ControllerOptions::json_schema`] describes the
//! UI-exposed subset.

mod animation;
mod camera;
mod handlers;

use std::path::Path;

pub use animation::AnimationOptions;
pub use camera::{CameraOptions, InitialView, ProjectionKind};
pub use handlers::{
    BoxZoomOptions, DoubleClickOptions, GestureOptions, HandlerSetting,
    HandlersOptions, KeyboardOptions, MousePanOptions, MouseRotateOptions,
    ScrollZoomOptions, TouchOptions,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::camera::Constraints;
use crate::error::CameraError;

/// Top-level options container. All sub-structs use `#[serde(default)]` so
/// partial TOML files (e.g. only overriding `[constraints]`) work correctly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema)]
#[serde(default)]
pub struct ControllerOptions {
    /// Projection and world orientation.
    pub camera: CameraOptions,
    /// Starting pose.
    pub initial_view: InitialView,
    /// Zoom/pitch limits and pan bounds.
    pub constraints: Constraints,
    /// Animated navigation defaults.
    pub animation: AnimationOptions,
    /// Which gesture handlers exist, and their tunables.
    #[schemars(skip)]
    pub handlers: HandlersOptions,
}

impl ControllerOptions {
    /// Generate JSON Schema describing the UI-exposed options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(ControllerOptions)
    }

    /// Parse options from TOML text. Missing fields use defaults.
    pub fn from_toml(text: &str) -> Result<Self, CameraError> {
        toml::from_str(text).map_err(|e| CameraError::OptionsParse(e.to_string()))
    }

    /// Load options from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self, CameraError> {
        let content = std::fs::read_to_string(path).map_err(CameraError::Io)?;
        Self::from_toml(&content)
    }

    /// Save options to a TOML file (pretty-printed).
    pub fn save(&self, path: &Path) -> Result<(), CameraError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CameraError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(CameraError::Io)?;
        }
        std::fs::write(path, content).map_err(CameraError::Io)
    }

    /// Copy with out-of-range values repaired: constraints sanitized,
    /// non-finite tunables reset to their defaults.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        let mut out = self.clone();
        out.constraints = self.constraints.sanitized();
        out.camera.viewport = self.camera.viewport.sanitized();

        let defaults = CameraOptions::default();
        if !(self.camera.fovy.is_finite() && self.camera.fovy > 1.0 && self.camera.fovy < 179.0) {
            log::warn!("fovy {} out of range; using {}", self.camera.fovy, defaults.fovy);
            out.camera.fovy = defaults.fovy;
        }

        let anim = AnimationOptions::default();
        let positive = |v: f64, fallback: f64, name: &str| {
            if v.is_finite() && v > 0.0 {
                v
            } else {
                log::warn!("{name} {v} invalid; using {fallback}");
                fallback
            }
        };
        out.animation.fly_curve = positive(self.animation.fly_curve, anim.fly_curve, "fly_curve");
        out.animation.fly_speed = positive(self.animation.fly_speed, anim.fly_speed, "fly_speed");
        out.animation.angular_speed_deg_per_s = positive(
            self.animation.angular_speed_deg_per_s,
            anim.angular_speed_deg_per_s,
            "angular_speed_deg_per_s",
        );
        if !(self.animation.bearing_snap.is_finite() && self.animation.bearing_snap >= 0.0) {
            out.animation.bearing_snap = anim.bearing_snap;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_toml() {
        let opts = ControllerOptions::default();
        let toml_str = toml::to_string_pretty(&opts).unwrap();
        let parsed: ControllerOptions = toml::from_str(&toml_str).unwrap();
        assert_eq!(opts, parsed);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r"
[constraints]
max_pitch = 60.0

[handlers]
keyboard = false

[handlers.scroll_zoom]
cooperative = true
";
        let opts = ControllerOptions::from_toml(toml_str).unwrap();
        assert_eq!(opts.constraints.max_pitch, 60.0);
        // Everything else should be default
        assert_eq!(opts.constraints.min_zoom, -2.0);
        assert_eq!(opts.animation.bearing_snap, 7.0);
        assert_eq!(opts.handlers.keyboard, HandlerSetting::Enabled(false));
        let scroll = opts.handlers.scroll_zoom.resolve().unwrap();
        assert!(scroll.cooperative);
        assert_eq!(scroll.max_zoom_per_event, 1.0);
        assert!(opts.handlers.touch.is_enabled());
    }

    #[test]
    fn keyboard_lookup() {
        use crate::input::handlers::KeyAction;
        let opts = ControllerOptions::default();
        let keyboard = opts.handlers.keyboard.resolve().unwrap();
        assert_eq!(keyboard.lookup("KeyQ"), Some(KeyAction::RotateLeft));
        assert_eq!(keyboard.lookup("ArrowUp"), Some(KeyAction::PanUp));
        assert_eq!(keyboard.lookup("KeyZ"), None);
    }

    #[test]
    fn malformed_values_are_repaired() {
        let mut opts = ControllerOptions::default();
        opts.constraints.min_zoom = 10.0;
        opts.constraints.max_zoom = 2.0;
        opts.camera.fovy = f64::NAN;
        opts.animation.fly_speed = -1.0;
        let fixed = opts.sanitized();
        assert_eq!(fixed.constraints.min_zoom, 2.0);
        assert_eq!(fixed.constraints.max_zoom, 10.0);
        assert_eq!(fixed.camera.fovy, 36.87);
        assert_eq!(fixed.animation.fly_speed, 1.2);
    }

    #[test]
    fn parse_errors_surface_as_options_parse() {
        let err = ControllerOptions::from_toml("[constraints]\nmin_zoom = \"low\"").unwrap_err();
        assert!(matches!(err, CameraError::OptionsParse(_)));
    }

    #[test]
    fn schema_has_expected_properties() {
        let schema_value = serde_json::to_value(ControllerOptions::json_schema()).unwrap();
        let props = schema_value["properties"].as_object().unwrap();

        assert!(props.contains_key("camera"));
        assert!(props.contains_key("constraints"));
        assert!(props.contains_key("animation"));
        assert!(!props.contains_key("handlers"));

        let animation = &props["animation"]["properties"];
        assert!(animation.get("bearing_snap").is_some());
        assert!(animation.get("easing").is_none());
    }
}
