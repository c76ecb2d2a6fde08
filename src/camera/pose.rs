//! Value types describing where the camera is and what it may do: pose,
//! padding, viewport, ground points/bounds and constraints.

use glam::{DVec2, DVec3};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::util::math::{clamp, finite_or, normalize_angle_deg};

/// Lowest zoom the engine ever represents.
pub const ABSOLUTE_MIN_ZOOM: f64 = -24.0;
/// Highest zoom the engine ever represents.
pub const ABSOLUTE_MAX_ZOOM: f64 = 32.0;
/// Steepest pitch a constraint may allow. 90° would look at the horizon
/// and the ground plane would never intersect the center ray.
pub const ABSOLUTE_MAX_PITCH: f64 = 89.0;

/// Which world axis points up. Decides the ground plane (`y = 0` or
/// `z = 0`) and the direction of north.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum UpAxis {
    /// Y-up world; ground is `y = 0`, north is `-Z`.
    #[default]
    Y,
    /// Z-up world; ground is `z = 0`, north is `+Y`.
    Z,
}

impl UpAxis {
    /// World up vector.
    #[must_use]
    pub fn up(self) -> DVec3 {
        match self {
            Self::Y => DVec3::Y,
            Self::Z => DVec3::Z,
        }
    }

    /// North in ground coordinates.
    #[must_use]
    pub fn north(self) -> DVec2 {
        match self {
            Self::Y => DVec2::NEG_Y,
            Self::Z => DVec2::Y,
        }
    }

    /// Screen-up direction on the ground for a bearing (compass heading the
    /// top of the screen faces).
    #[must_use]
    pub fn heading(self, bearing_deg: f64) -> DVec2 {
        let (sin, cos) = bearing_deg.to_radians().sin_cos();
        self.north() * cos + DVec2::X * sin
    }

    /// Screen-right direction on the ground for a bearing.
    #[must_use]
    pub fn screen_right(self, bearing_deg: f64) -> DVec2 {
        let (sin, cos) = bearing_deg.to_radians().sin_cos();
        DVec2::X * cos - self.north() * sin
    }

    /// Project a world point onto the ground plane.
    #[must_use]
    pub fn to_ground(self, p: DVec3) -> GroundPoint {
        match self {
            Self::Y => GroundPoint::new(p.x, p.z),
            Self::Z => GroundPoint::new(p.x, p.y),
        }
    }

    /// Lift a ground point to world space at the given elevation.
    #[must_use]
    pub fn from_ground(self, g: GroundPoint, elevation: f64) -> DVec3 {
        match self {
            Self::Y => DVec3::new(g.gx, elevation, g.gz),
            Self::Z => DVec3::new(g.gx, g.gz, elevation),
        }
    }

    /// Height of a world point above the ground plane.
    #[must_use]
    pub fn elevation(self, p: DVec3) -> f64 {
        match self {
            Self::Y => p.y,
            Self::Z => p.z,
        }
    }

    /// Lift a ground-space vector to a world-space vector.
    #[must_use]
    pub fn ground_vector(self, v: DVec2) -> DVec3 {
        self.from_ground(GroundPoint::from(v), 0.0)
    }
}

/// A point on the ground plane, in the plane's two world axes (`x, z` for
/// Y-up, `x, y` for Z-up).
#[derive(
    Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema,
)]
pub struct GroundPoint {
    /// World X.
    pub gx: f64,
    /// World Z (Y-up) or world Y (Z-up).
    pub gz: f64,
}

impl GroundPoint {
    /// Construct a ground point.
    #[must_use]
    pub const fn new(gx: f64, gz: f64) -> Self {
        Self { gx, gz }
    }

    /// As a 2D vector.
    #[inline]
    #[must_use]
    pub fn to_vec2(self) -> DVec2 {
        DVec2::new(self.gx, self.gz)
    }
}

impl From<DVec2> for GroundPoint {
    fn from(v: DVec2) -> Self {
        Self::new(v.x, v.y)
    }
}

/// Axis-aligned rectangle on the ground plane.
#[derive(
    Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema,
)]
pub struct GroundBounds {
    /// Minimum corner.
    pub min: GroundPoint,
    /// Maximum corner.
    pub max: GroundPoint,
}

impl GroundBounds {
    /// Bounds from two opposite corners in any order.
    #[must_use]
    pub fn new(a: GroundPoint, b: GroundPoint) -> Self {
        Self {
            min: GroundPoint::new(a.gx.min(b.gx), a.gz.min(b.gz)),
            max: GroundPoint::new(a.gx.max(b.gx), a.gz.max(b.gz)),
        }
    }

    /// Smallest bounds containing every point, or `None` for no points.
    pub fn from_points(points: impl IntoIterator<Item = GroundPoint>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::new(first, first), |acc, p| {
            Self::new(
                GroundPoint::new(acc.min.gx.min(p.gx), acc.min.gz.min(p.gz)),
                GroundPoint::new(acc.max.gx.max(p.gx), acc.max.gz.max(p.gz)),
            )
        }))
    }

    /// Center of the rectangle.
    #[must_use]
    pub fn center(&self) -> GroundPoint {
        GroundPoint::from((self.min.to_vec2() + self.max.to_vec2()) * 0.5)
    }

    /// The four corners, counter-clockwise from `min`.
    #[must_use]
    pub fn corners(&self) -> [GroundPoint; 4] {
        [
            self.min,
            GroundPoint::new(self.max.gx, self.min.gz),
            self.max,
            GroundPoint::new(self.min.gx, self.max.gz),
        ]
    }

    /// Whether `p` lies inside (inclusive).
    #[must_use]
    pub fn contains(&self, p: GroundPoint) -> bool {
        (self.min.gx..=self.max.gx).contains(&p.gx)
            && (self.min.gz..=self.max.gz).contains(&p.gz)
    }

    /// Nearest point inside the rectangle.
    #[must_use]
    pub fn clamp(&self, p: GroundPoint) -> GroundPoint {
        GroundPoint::new(
            clamp(p.gx, self.min.gx, self.max.gx),
            clamp(p.gz, self.min.gz, self.max.gz),
        )
    }

    /// Distance from `p` to the rectangle; zero inside.
    #[must_use]
    pub fn overshoot(&self, p: GroundPoint) -> f64 {
        (p.to_vec2() - self.clamp(p).to_vec2()).length()
    }

    /// Rectangle grown by `margin` on every side.
    #[must_use]
    pub fn expanded(&self, margin: f64) -> Self {
        let m = DVec2::splat(margin.max(0.0));
        Self {
            min: GroundPoint::from(self.min.to_vec2() - m),
            max: GroundPoint::from(self.max.to_vec2() + m),
        }
    }
}

/// Insets (pixels) shrinking the area the camera centers its view in.
#[derive(
    Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(default)]
pub struct Padding {
    /// Top inset.
    pub top: f64,
    /// Right inset.
    pub right: f64,
    /// Bottom inset.
    pub bottom: f64,
    /// Left inset.
    pub left: f64,
}

impl Padding {
    /// Same inset on every side.
    #[must_use]
    pub const fn uniform(px: f64) -> Self {
        Self {
            top: px,
            right: px,
            bottom: px,
            left: px,
        }
    }

    /// Where the padded area's center sits relative to the viewport center.
    #[must_use]
    pub fn centroid_offset(&self) -> DVec2 {
        DVec2::new(
            (self.left - self.right) * 0.5,
            (self.top - self.bottom) * 0.5,
        )
    }

    /// Negative and non-finite insets replaced by zero.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let fix = |v: f64| finite_or(v, 0.0).max(0.0);
        Self {
            top: fix(self.top),
            right: fix(self.right),
            bottom: fix(self.bottom),
            left: fix(self.left),
        }
    }

    /// Component-wise interpolation.
    #[must_use]
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        let l = |a: f64, b: f64| a + (b - a) * t;
        Self {
            top: l(self.top, other.top),
            right: l(self.right, other.right),
            bottom: l(self.bottom, other.bottom),
            left: l(self.left, other.left),
        }
    }
}

/// Size of the element the camera renders into, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Viewport {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
    /// Physical pixels per CSS pixel.
    pub device_pixel_ratio: f64,
}

impl Viewport {
    /// Viewport with a device pixel ratio of 1.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio: 1.0,
        }
    }

    /// `(width, height)` as a vector.
    #[must_use]
    pub fn size(&self) -> DVec2 {
        DVec2::new(self.width, self.height)
    }

    /// Width / height.
    #[must_use]
    pub fn aspect(&self) -> f64 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }

    /// Whether either side is empty.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Non-finite or negative sizes replaced by zero, bad ratios by 1.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let dpr = finite_or(self.device_pixel_ratio, 1.0);
        Self {
            width: finite_or(self.width, 0.0).max(0.0),
            height: finite_or(self.height, 0.0).max(0.0),
            device_pixel_ratio: if dpr > 0.0 { dpr } else { 1.0 },
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

/// Limits the transform clamps every pose against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Constraints {
    /// Lowest zoom.
    pub min_zoom: f64,
    /// Highest zoom.
    pub max_zoom: f64,
    /// Lowest pitch, degrees.
    pub min_pitch: f64,
    /// Highest pitch, degrees.
    pub max_pitch: f64,
    /// Region the center must stay in.
    pub pan_bounds: Option<GroundBounds>,
    /// How far (screen pixels) the center may be dragged past `pan_bounds`
    /// before the hard clamp engages. The controller eases back inside
    /// once the gesture ends.
    pub pan_overshoot_px: f64,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            min_zoom: -2.0,
            max_zoom: 22.0,
            min_pitch: 0.0,
            max_pitch: 85.0,
            pan_bounds: None,
            pan_overshoot_px: 120.0,
        }
    }
}

impl Constraints {
    /// Repair out-of-range or inverted values instead of rejecting them.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let limit_zoom = |v: f64, fallback: f64| {
            clamp(finite_or(v, fallback), ABSOLUTE_MIN_ZOOM, ABSOLUTE_MAX_ZOOM)
        };
        let limit_pitch = |v: f64, fallback: f64| {
            clamp(finite_or(v, fallback), 0.0, ABSOLUTE_MAX_PITCH)
        };

        let mut min_zoom = limit_zoom(self.min_zoom, defaults.min_zoom);
        let mut max_zoom = limit_zoom(self.max_zoom, defaults.max_zoom);
        if min_zoom > max_zoom {
            log::warn!("min_zoom {min_zoom} > max_zoom {max_zoom}; swapping");
            std::mem::swap(&mut min_zoom, &mut max_zoom);
        }
        let mut min_pitch = limit_pitch(self.min_pitch, defaults.min_pitch);
        let mut max_pitch = limit_pitch(self.max_pitch, defaults.max_pitch);
        if min_pitch > max_pitch {
            log::warn!("min_pitch {min_pitch} > max_pitch {max_pitch}; swapping");
            std::mem::swap(&mut min_pitch, &mut max_pitch);
        }

        let pan_bounds = self.pan_bounds.and_then(|b| {
            let finite = [b.min.gx, b.min.gz, b.max.gx, b.max.gz]
                .iter()
                .all(|v| v.is_finite());
            if finite {
                Some(GroundBounds::new(b.min, b.max))
            } else {
                log::warn!("ignoring non-finite pan bounds");
                None
            }
        });

        Self {
            min_zoom,
            max_zoom,
            min_pitch,
            max_pitch,
            pan_bounds,
            pan_overshoot_px: finite_or(self.pan_overshoot_px, 0.0).max(0.0),
        }
    }

    /// Zoom clamped into range.
    #[must_use]
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        clamp(finite_or(zoom, self.min_zoom), self.min_zoom, self.max_zoom)
    }

    /// Pitch clamped into range.
    #[must_use]
    pub fn clamp_pitch(&self, pitch: f64) -> f64 {
        clamp(finite_or(pitch, self.min_pitch), self.min_pitch, self.max_pitch)
    }
}

/// The full camera pose in map terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Look-at target in world space (usually on the ground plane).
    pub center: DVec3,
    /// Base-2 zoom level.
    pub zoom: f64,
    /// Compass heading of the screen's top edge, degrees in `(-180, 180]`.
    pub bearing: f64,
    /// Tilt away from straight down, degrees.
    pub pitch: f64,
    /// Rotation about the view axis, degrees in `(-180, 180]`.
    pub roll: f64,
    /// View insets.
    pub padding: Padding,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            center: DVec3::ZERO,
            zoom: 0.0,
            bearing: 0.0,
            pitch: 0.0,
            roll: 0.0,
            padding: Padding::default(),
        }
    }
}

impl Pose {
    /// Angles normalized, zoom and pitch clamped to `constraints`.
    #[must_use]
    pub fn constrained(mut self, constraints: &Constraints) -> Self {
        self.zoom = constraints.clamp_zoom(self.zoom);
        self.pitch = constraints.clamp_pitch(self.pitch);
        self.bearing = normalize_angle_deg(self.bearing);
        self.roll = normalize_angle_deg(self.roll);
        self.padding = self.padding.sanitized();
        self
    }
}
