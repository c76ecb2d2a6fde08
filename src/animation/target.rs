use glam::{DVec2, DVec3};
use web_time::Duration;

use crate::camera::{Padding, Pose};
use crate::util::easing::EasingFunction;

/// Pose fields to move to. `None` keeps the current value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraTarget {
    /// Look-at target.
    pub center: Option<DVec3>,
    /// Zoom level.
    pub zoom: Option<f64>,
    /// Bearing, degrees.
    pub bearing: Option<f64>,
    /// Pitch, degrees.
    pub pitch: Option<f64>,
    /// Roll, degrees.
    pub roll: Option<f64>,
    /// View insets.
    pub padding: Option<Padding>,
}

impl CameraTarget {
    /// Move the center.
    #[must_use]
    pub fn center(mut self, center: DVec3) -> Self {
        self.center = Some(center);
        self
    }

    /// Change zoom.
    #[must_use]
    pub fn zoom(mut self, zoom: f64) -> Self {
        self.zoom = Some(zoom);
        self
    }

    /// Change bearing.
    #[must_use]
    pub fn bearing(mut self, bearing: f64) -> Self {
        self.bearing = Some(bearing);
        self
    }

    /// Change pitch.
    #[must_use]
    pub fn pitch(mut self, pitch: f64) -> Self {
        self.pitch = Some(pitch);
        self
    }

    /// Change roll.
    #[must_use]
    pub fn roll(mut self, roll: f64) -> Self {
        self.roll = Some(roll);
        self
    }

    /// Change padding.
    #[must_use]
    pub fn padding(mut self, padding: Padding) -> Self {
        self.padding = Some(padding);
        self
    }

    /// `current` with the given fields replaced. Non-finite values are
    /// ignored.
    #[must_use]
    pub fn resolve(&self, current: &Pose) -> Pose {
        let pick = |v: Option<f64>, fallback: f64| v.filter(|v| v.is_finite()).unwrap_or(fallback);
        Pose {
            center: self.center.filter(|c| c.is_finite()).unwrap_or(current.center),
            zoom: pick(self.zoom, current.zoom),
            bearing: pick(self.bearing, current.bearing),
            pitch: pick(self.pitch, current.pitch),
            roll: pick(self.roll, current.roll),
            padding: self.padding.map_or(current.padding, Padding::sanitized),
        }
    }

    /// Whether no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<Pose> for CameraTarget {
    fn from(pose: Pose) -> Self {
        Self {
            center: Some(pose.center),
            zoom: Some(pose.zoom),
            bearing: Some(pose.bearing),
            pitch: Some(pose.pitch),
            roll: Some(pose.roll),
            padding: Some(pose.padding),
        }
    }
}

/// Parameters for [`ease_to`](crate::CameraController::ease_to).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EaseOptions {
    /// Where to go.
    pub target: CameraTarget,
    /// Screen offset (pixels) of the target center from the view center.
    pub offset: DVec2,
    /// Screen point whose ground point stays put while zooming/rotating.
    /// The center is derived from it instead of interpolated.
    pub around: Option<DVec2>,
    /// How fully `around` is held, 0..=1.
    pub anchor_tightness: f64,
    /// Length; the configured default when `None`.
    pub duration: Option<Duration>,
    /// Curve; the configured default when `None`.
    pub easing: Option<EasingFunction>,
    /// Animate even when reduced motion is requested.
    pub essential: bool,
}

impl Default for EaseOptions {
    fn default() -> Self {
        Self {
            target: CameraTarget::default(),
            offset: DVec2::ZERO,
            around: None,
            anchor_tightness: 1.0,
            duration: None,
            easing: None,
            essential: false,
        }
    }
}

impl EaseOptions {
    /// Ease to `target` with default timing.
    #[must_use]
    pub fn to(target: CameraTarget) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    /// Set the duration.
    #[must_use]
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Hold the ground under `point` in place.
    #[must_use]
    pub fn around(mut self, point: DVec2) -> Self {
        self.around = Some(point);
        self
    }
}

/// Parameters for [`fly_to`](crate::CameraController::fly_to).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlyOptions {
    /// Where to go.
    pub target: CameraTarget,
    /// Screen offset (pixels) of the target center from the view center.
    pub offset: DVec2,
    /// Length; derived from the path length and `speed` when `None`.
    pub duration: Option<Duration>,
    /// Curve; the configured default when `None`.
    pub easing: Option<EasingFunction>,
    /// Zoom-out curvature (ρ).
    pub curve: Option<f64>,
    /// Path lengths per second.
    pub speed: Option<f64>,
    /// Constant on-screen pan speed, pixels per second. Selects the
    /// constant-speed flight instead of the zoom-out arc.
    pub screen_speed: Option<f64>,
    /// Hard cap on the flight's length.
    pub max_duration: Option<Duration>,
    /// Zoom at the top of the arc; overrides `curve`.
    pub min_zoom: Option<f64>,
    /// Animate even when reduced motion is requested.
    pub essential: bool,
}

impl FlyOptions {
    /// Fly to `target` with default timing.
    #[must_use]
    pub fn to(target: CameraTarget) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }
}
