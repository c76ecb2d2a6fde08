use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::util::easing::EasingFunction;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Animation", inline)]
#[serde(default)]
/// Defaults for animated navigation and the movement lifecycle.
pub struct AnimationOptions {
    /// `ease_to` duration when the call doesn't give one.
    #[schemars(title = "Ease Duration (ms)", range(min = 0, max = 5000))]
    pub ease_duration_ms: u64,
    /// Curve for `ease_to` and the `fly_to` path parameter.
    #[schemars(skip)]
    pub easing: EasingFunction,
    /// `fly_to` zoom-out curvature (ρ). Larger arcs zoom out further.
    #[schemars(title = "Fly Curve", range(min = 0.1, max = 3.0))]
    pub fly_curve: f64,
    /// `fly_to` speed along the path, in path lengths (screenfuls) per
    /// second.
    #[schemars(title = "Fly Speed", range(min = 0.1, max = 5.0))]
    pub fly_speed: f64,
    /// Hard cap on `fly_to` duration; longer flights are sped up to fit.
    pub max_fly_duration_ms: Option<u64>,
    /// Fastest a flight may turn, degrees per second of bearing/pitch/roll.
    pub angular_speed_deg_per_s: f64,
    /// Bearings within this many degrees of north snap to 0 when a
    /// rotation ends.
    #[schemars(title = "Bearing Snap", range(min = 0.0, max = 45.0))]
    pub bearing_snap: f64,
    /// Force (`true`) or forbid (`false`) reduced motion; `None` asks the
    /// surface.
    pub reduced_motion: Option<bool>,
    /// Quiet time after the last handler change before `moveend`.
    pub moveend_debounce_ms: u64,
    /// Length of the ease back inside the pan bounds after an overshoot.
    pub soft_bounds_ms: u64,
    /// Minimum gap between two soft-bounds corrections.
    pub soft_bounds_guard_ms: u64,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            ease_duration_ms: 500,
            easing: EasingFunction::DEFAULT,
            fly_curve: 1.42,
            fly_speed: 1.2,
            max_fly_duration_ms: None,
            angular_speed_deg_per_s: 180.0,
            bearing_snap: 7.0,
            reduced_motion: None,
            moveend_debounce_ms: 120,
            soft_bounds_ms: 180,
            soft_bounds_guard_ms: 220,
        }
    }
}
