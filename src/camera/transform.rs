//! Map-style pose ownership and screen ↔ world ↔ ground conversions.
//!
//! The [`Transform`] is the only writer of the pose. Every setter clamps
//! against the current [`Constraints`], normalizes angles and re-places
//! the underlying [`Camera`]. Setters issued inside
//! [`defer_apply`](Transform::defer_apply) (or a
//! [`begin_batch`](Transform::begin_batch)/[`end_batch`](Transform::end_batch)
//! pair) trigger exactly one camera recomputation when the outermost batch
//! closes.

use glam::{DVec2, DVec3};

use super::core::{Camera, Projection};
use super::pose::{Constraints, GroundPoint, Padding, Pose, UpAxis, Viewport};
use super::ray::{Plane, Ray};
use crate::util::math::{clamp, finite_or, normalize_angle_deg, zoom_scale};

/// Below this pitch (degrees) the camera up vector follows the heading
/// instead of world up, avoiding the look-at singularity.
const TOP_DOWN_PITCH_EPSILON: f64 = 1e-4;
/// Near plane as a fraction of the camera distance.
const NEAR_FACTOR: f64 = 0.01;
/// Far plane as a multiple of the camera distance; ground hits past it are
/// treated as misses.
const FAR_FACTOR: f64 = 1000.0;
/// Orthographic cameras sit this many visible-heights above the target.
const ORTHO_DISTANCE_FACTOR: f64 = 2.0;

/// Camera pose, viewport and constraints, plus the camera they drive.
#[derive(Debug, Clone)]
pub struct Transform {
    camera: Camera,
    up_axis: UpAxis,
    center: DVec3,
    zoom: f64,
    bearing: f64,
    pitch: f64,
    roll: f64,
    padding: Padding,
    viewport: Viewport,
    constraints: Constraints,
    batch_depth: u32,
    dirty: bool,
    apply_count: u64,
}

impl Transform {
    /// Transform over `camera` with a default pose (origin, zoom clamped
    /// from 0, looking straight down, north up).
    #[must_use]
    pub fn new(
        camera: Camera,
        viewport: Viewport,
        up_axis: UpAxis,
        constraints: Constraints,
    ) -> Self {
        let constraints = constraints.sanitized();
        let mut transform = Self {
            camera,
            up_axis,
            center: DVec3::ZERO,
            zoom: constraints.clamp_zoom(0.0),
            bearing: 0.0,
            pitch: constraints.clamp_pitch(0.0),
            roll: 0.0,
            padding: Padding::default(),
            viewport: viewport.sanitized(),
            constraints,
            batch_depth: 0,
            dirty: false,
            apply_count: 0,
        };
        transform.apply();
        transform
    }

    // ── Accessors ──────────────────────────────────────────────────────

    /// The camera placed from the current pose.
    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Snapshot of the pose.
    #[must_use]
    pub fn pose(&self) -> Pose {
        Pose {
            center: self.center,
            zoom: self.zoom,
            bearing: self.bearing,
            pitch: self.pitch,
            roll: self.roll,
            padding: self.padding,
        }
    }

    /// Look-at target.
    #[must_use]
    pub fn center(&self) -> DVec3 {
        self.center
    }

    /// Center projected onto the ground plane.
    #[must_use]
    pub fn ground_center(&self) -> GroundPoint {
        self.up_axis.to_ground(self.center)
    }

    /// Zoom level.
    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// `2^zoom`: pixels per world unit at the center.
    #[must_use]
    pub fn scale(&self) -> f64 {
        zoom_scale(self.zoom)
    }

    /// Bearing in degrees.
    #[must_use]
    pub fn bearing(&self) -> f64 {
        self.bearing
    }

    /// Pitch in degrees.
    #[must_use]
    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    /// Roll in degrees.
    #[must_use]
    pub fn roll(&self) -> f64 {
        self.roll
    }

    /// View insets.
    #[must_use]
    pub fn padding(&self) -> Padding {
        self.padding
    }

    /// Viewport.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Active constraints.
    #[must_use]
    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// World up axis.
    #[must_use]
    pub fn up_axis(&self) -> UpAxis {
        self.up_axis
    }

    /// Number of camera recomputations so far.
    #[must_use]
    pub fn apply_count(&self) -> u64 {
        self.apply_count
    }

    /// Screen position of the center: the middle of the padded area.
    #[must_use]
    pub fn center_point(&self) -> DVec2 {
        self.viewport.size() * 0.5 + self.padding.centroid_offset()
    }

    // ── Setters ────────────────────────────────────────────────────────

    /// Move the look-at target.
    pub fn set_center(&mut self, center: DVec3) {
        if !center.is_finite() {
            return;
        }
        self.center = center;
        self.clamp_center();
        self.apply();
    }

    /// Move the target on the ground, keeping its elevation.
    pub fn set_ground_center(&mut self, ground: GroundPoint) {
        let elevation = self.up_axis.elevation(self.center);
        self.set_center(self.up_axis.from_ground(ground, elevation));
    }

    /// Translate the target by a ground-space delta.
    pub fn adjust_center_by_ground_delta(&mut self, delta: DVec2) {
        if !delta.is_finite() || delta == DVec2::ZERO {
            return;
        }
        self.set_center(self.center + self.up_axis.ground_vector(delta));
    }

    /// Set the zoom level.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = self.constraints.clamp_zoom(finite_or(zoom, self.zoom));
        self.clamp_center();
        self.apply();
    }

    /// Set the bearing.
    pub fn set_bearing(&mut self, bearing: f64) {
        self.bearing = normalize_angle_deg(finite_or(bearing, self.bearing));
        self.apply();
    }

    /// Set the pitch.
    pub fn set_pitch(&mut self, pitch: f64) {
        self.pitch = self.constraints.clamp_pitch(finite_or(pitch, self.pitch));
        self.apply();
    }

    /// Set the roll.
    pub fn set_roll(&mut self, roll: f64) {
        self.roll = normalize_angle_deg(finite_or(roll, self.roll));
        self.apply();
    }

    /// Set the view insets.
    pub fn set_padding(&mut self, padding: Padding) {
        self.padding = padding.sanitized();
        self.apply();
    }

    /// Resize the viewport.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport.sanitized();
        self.clamp_center();
        self.apply();
    }

    /// Replace the constraints and re-clamp the pose against them.
    pub fn set_constraints(&mut self, constraints: Constraints) {
        self.constraints = constraints.sanitized();
        self.defer_apply(|t| {
            t.set_zoom(t.zoom);
            t.set_pitch(t.pitch);
        });
    }

    /// Apply every pose field at once.
    pub fn set_pose(&mut self, pose: &Pose) {
        self.defer_apply(|t| {
            t.set_zoom(pose.zoom);
            t.set_bearing(pose.bearing);
            t.set_pitch(pose.pitch);
            t.set_roll(pose.roll);
            t.set_padding(pose.padding);
            t.set_center(pose.center);
        });
    }

    // ── Batching ───────────────────────────────────────────────────────

    /// Run `f` with camera recomputation deferred until it returns.
    ///
    /// Nested calls are fine; the camera is recomputed once, when the
    /// outermost scope closes and at least one setter ran.
    pub fn defer_apply<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.begin_batch();
        let result = f(self);
        self.end_batch();
        result
    }

    /// Open a batch scope. Must be paired with [`end_batch`](Self::end_batch).
    pub fn begin_batch(&mut self) {
        self.batch_depth += 1;
    }

    /// Close a batch scope, recomputing the camera if this was the
    /// outermost scope and anything changed.
    pub fn end_batch(&mut self) {
        self.batch_depth = self.batch_depth.saturating_sub(1);
        if self.batch_depth == 0 && self.dirty {
            self.update_camera();
        }
    }

    fn apply(&mut self) {
        if self.batch_depth > 0 {
            self.dirty = true;
        } else {
            self.update_camera();
        }
    }

    fn clamp_center(&mut self) {
        let Some(bounds) = self.constraints.pan_bounds else {
            return;
        };
        let margin = self.constraints.pan_overshoot_px / self.scale();
        let ground = self.up_axis.to_ground(self.center);
        let clamped = bounds.expanded(margin).clamp(ground);
        if clamped != ground {
            let elevation = self.up_axis.elevation(self.center);
            self.center = self.up_axis.from_ground(clamped, elevation);
        }
    }

    /// Re-place the camera from the pose.
    fn update_camera(&mut self) {
        self.dirty = false;
        self.apply_count += 1;
        self.clamp_center();

        let up = self.up_axis.up();
        let heading = self.up_axis.ground_vector(self.up_axis.heading(self.bearing));
        let scale = self.scale();
        let Viewport { width, height, .. } = self.viewport;
        let visible_height = height.max(1.0) / scale;

        let distance = match &mut self.camera.projection {
            Projection::Perspective { fov_y_deg } => {
                let half_fov = (fov_y_deg.to_radians() * 0.5).max(1e-6);
                visible_height * 0.5 / half_fov.tan()
            }
            Projection::Orthographic {
                left,
                right,
                top,
                bottom,
            } => {
                let half_w = width.max(1.0) / (2.0 * scale);
                let half_h = height.max(1.0) / (2.0 * scale);
                *left = -half_w;
                *right = half_w;
                *top = half_h;
                *bottom = -half_h;
                visible_height * ORTHO_DISTANCE_FACTOR
            }
        };

        let (sin_p, cos_p) = self.pitch.to_radians().sin_cos();
        let offset = up * cos_p - heading * sin_p;

        let camera = &mut self.camera;
        camera.near = distance * NEAR_FACTOR;
        camera.far = distance * FAR_FACTOR;
        camera.position = self.center + offset * distance;
        camera.up = if self.pitch.abs() < TOP_DOWN_PITCH_EPSILON {
            heading
        } else {
            up
        };
        camera.look_at(self.center);
        if self.roll != 0.0 {
            let forward = camera.forward();
            camera.rotate_on_world_axis(forward, self.roll.to_radians());
        }
        camera.aspect = self.viewport.aspect();

        // Shift the principal point so the center lands mid-padding.
        let shift = if self.viewport.is_degenerate() {
            DVec2::ZERO
        } else {
            let p = self.padding;
            DVec2::new((p.left - p.right) / width, (p.bottom - p.top) / height)
        };
        camera.set_view_offset(shift);
        camera.update_projection_matrix();
        camera.update_matrix_world();
    }

    // ── Conversions ────────────────────────────────────────────────────

    /// The ground plane (`y = 0` or `z = 0`).
    #[must_use]
    pub fn ground_plane(&self) -> Plane {
        Plane::from_normal_and_point(self.up_axis.up(), DVec3::ZERO)
    }

    /// Ray through a screen pixel.
    #[must_use]
    pub fn screen_ray(&self, point: DVec2) -> Option<Ray> {
        if self.viewport.is_degenerate() || !point.is_finite() {
            return None;
        }
        let ndc = DVec2::new(
            2.0 * point.x / self.viewport.width - 1.0,
            1.0 - 2.0 * point.y / self.viewport.height,
        );
        let near = self.camera.unproject(ndc.extend(-1.0));
        let far = self.camera.unproject(ndc.extend(1.0));
        let direction = (far - near).try_normalize()?;
        Some(Ray::new(near, direction))
    }

    /// World point on the ground plane under a screen pixel.
    ///
    /// `None` when the ray misses, grazes, or hits beyond the far plane
    /// (near the horizon). Callers fall back to screen-delta behavior.
    #[must_use]
    pub fn screen_to_world(&self, point: DVec2) -> Option<DVec3> {
        let ray = self.screen_ray(point)?;
        let t = ray.distance_to_plane(&self.ground_plane())?;
        (t <= self.camera.far).then(|| ray.at(t))
    }

    /// Pixel position of a world point.
    #[must_use]
    pub fn world_to_screen(&self, world: DVec3) -> DVec2 {
        let ndc = self.camera.project(world);
        DVec2::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.width,
            (1.0 - ndc.y) * 0.5 * self.viewport.height,
        )
    }

    /// Like [`world_to_screen`](Self::world_to_screen), but `None` for
    /// points behind the camera.
    #[must_use]
    pub fn world_to_screen_checked(&self, world: DVec3) -> Option<DVec2> {
        let clip = self.camera.project_clip(world);
        (clip.w > 0.0).then(|| self.world_to_screen(world))
    }

    /// Ground point under a screen pixel.
    #[must_use]
    pub fn ground_from_screen(&self, point: DVec2) -> Option<GroundPoint> {
        self.screen_to_world(point).map(|w| self.up_axis.to_ground(w))
    }

    /// Ground vector spanned by a screen-pixel delta at the current zoom
    /// and bearing (exact at zero pitch).
    #[must_use]
    pub fn screen_delta_to_ground(&self, delta: DVec2) -> DVec2 {
        let right = self.up_axis.screen_right(self.bearing);
        let heading = self.up_axis.heading(self.bearing);
        (right * delta.x - heading * delta.y) / self.scale()
    }

    /// How far (pixels at the current zoom) `ground` lies outside the pan
    /// bounds; zero without bounds.
    #[must_use]
    pub fn pan_overshoot_px(&self, ground: GroundPoint) -> f64 {
        self.constraints
            .pan_bounds
            .map_or(0.0, |b| b.overshoot(ground) * self.scale())
    }

    /// Run `f`, then translate the center so the ground point that was
    /// under `point` before is under it again, scaled by `tightness`.
    ///
    /// Returns `f`'s result and whether the anchor could be held (both
    /// rays hit the ground).
    pub fn anchored<R>(
        &mut self,
        point: DVec2,
        tightness: f64,
        f: impl FnOnce(&mut Self) -> R,
    ) -> (R, bool) {
        let before = self.ground_from_screen(point);
        let result = self.defer_apply(f);
        let Some(before) = before else {
            return (result, false);
        };
        let Some(after) = self.ground_from_screen(point) else {
            return (result, false);
        };
        let tightness = clamp(finite_or(tightness, 1.0), 0.0, 1.0);
        self.adjust_center_by_ground_delta((before.to_vec2() - after.to_vec2()) * tightness);
        (result, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::pose::GroundBounds;

    fn transform(up_axis: UpAxis) -> Transform {
        Transform::new(
            Camera::perspective(36.87, 1.0, 0.1, 1000.0),
            Viewport::new(800.0, 600.0),
            up_axis,
            Constraints::default(),
        )
    }

    #[test]
    fn center_projects_to_screen_center() {
        for axis in [UpAxis::Y, UpAxis::Z] {
            let mut t = transform(axis);
            t.defer_apply(|t| {
                t.set_zoom(3.0);
                t.set_bearing(40.0);
                t.set_pitch(50.0);
                t.set_ground_center(GroundPoint::new(12.0, -7.0));
            });
            let p = t.world_to_screen(t.center());
            assert!((p - DVec2::new(400.0, 300.0)).length() < 1e-6, "{p:?}");
        }
    }

    #[test]
    fn screen_to_world_inverts_world_to_screen() {
        let mut t = transform(UpAxis::Y);
        t.defer_apply(|t| {
            t.set_zoom(2.0);
            t.set_bearing(-30.0);
            t.set_pitch(45.0);
            t.set_roll(5.0);
        });
        for px in [DVec2::new(100.0, 500.0), DVec2::new(400.0, 300.0), DVec2::new(700.0, 250.0)] {
            let world = t.screen_to_world(px).unwrap();
            assert!(world.y.abs() < 1e-9);
            assert!((t.world_to_screen(world) - px).length() < 1e-6);
        }
    }

    #[test]
    fn visible_height_matches_zoom_when_top_down() {
        let mut t = transform(UpAxis::Z);
        t.set_zoom(1.0);
        let top = t.screen_to_world(DVec2::new(400.0, 0.0)).unwrap();
        let bottom = t.screen_to_world(DVec2::new(400.0, 600.0)).unwrap();
        // 600 px at scale 2 → 300 world units, north (+Y) at the top
        assert!(((top.y - bottom.y) - 300.0).abs() < 1e-6);
    }

    #[test]
    fn screen_delta_matches_projection_top_down() {
        let mut t = transform(UpAxis::Y);
        t.defer_apply(|t| {
            t.set_zoom(4.0);
            t.set_bearing(70.0);
        });
        let delta = DVec2::new(35.0, -12.0);
        let ground = t.screen_delta_to_ground(delta);
        let a = t.ground_from_screen(DVec2::new(400.0, 300.0)).unwrap();
        let b = t.ground_from_screen(DVec2::new(400.0, 300.0) + delta).unwrap();
        assert!(((b.to_vec2() - a.to_vec2()) - ground).length() < 1e-9);
    }

    #[test]
    fn horizon_rays_miss() {
        let mut t = transform(UpAxis::Y);
        t.set_pitch(85.0);
        assert!(t.screen_to_world(DVec2::new(400.0, 0.0)).is_none());
        assert!(t.screen_to_world(DVec2::new(400.0, 599.0)).is_some());
    }

    #[test]
    fn defer_apply_recomputes_once_even_when_nested() {
        let mut t = transform(UpAxis::Y);
        let before = t.apply_count();
        t.defer_apply(|t| {
            t.set_zoom(5.0);
            t.defer_apply(|t| {
                t.set_bearing(10.0);
                t.set_pitch(20.0);
            });
            t.set_roll(3.0);
        });
        assert_eq!(t.apply_count(), before + 1);

        t.defer_apply(|_| {});
        assert_eq!(t.apply_count(), before + 1);

        t.set_zoom(6.0);
        assert_eq!(t.apply_count(), before + 2);
    }

    #[test]
    fn setters_clamp_and_normalize() {
        let mut t = transform(UpAxis::Y);
        t.set_zoom(100.0);
        assert_eq!(t.zoom(), 22.0);
        t.set_pitch(120.0);
        assert_eq!(t.pitch(), 85.0);
        t.set_bearing(-180.0);
        assert_eq!(t.bearing(), 180.0);
        t.set_roll(725.0);
        assert_eq!(t.roll(), 5.0);
        t.set_zoom(f64::NAN);
        assert_eq!(t.zoom(), 22.0);
    }

    #[test]
    fn pan_bounds_allow_only_the_overshoot_margin() {
        let mut t = transform(UpAxis::Y);
        t.set_constraints(Constraints {
            pan_bounds: Some(GroundBounds::new(
                GroundPoint::new(-10.0, -10.0),
                GroundPoint::new(10.0, 10.0),
            )),
            pan_overshoot_px: 8.0,
            ..Constraints::default()
        });
        t.set_zoom(2.0);
        t.set_ground_center(GroundPoint::new(50.0, 0.0));
        // 8 px at scale 4 → 2 world units of slack
        assert!((t.ground_center().gx - 12.0).abs() < 1e-12);
        assert!((t.pan_overshoot_px(t.ground_center()) - 8.0).abs() < 1e-9);
    }

    #[test]
    fn padding_moves_the_center_point() {
        let mut t = transform(UpAxis::Y);
        t.set_padding(Padding {
            left: 200.0,
            top: 100.0,
            ..Padding::default()
        });
        let expected = DVec2::new(500.0, 350.0);
        assert_eq!(t.center_point(), expected);
        assert!((t.world_to_screen(t.center()) - expected).length() < 1e-6);
    }

    #[test]
    fn anchored_zoom_keeps_point_fixed() {
        let mut t = transform(UpAxis::Y);
        t.defer_apply(|t| {
            t.set_zoom(3.0);
            t.set_pitch(40.0);
            t.set_bearing(25.0);
        });
        let pointer = DVec2::new(620.0, 410.0);
        let before = t.screen_to_world(pointer).unwrap();
        let (_, held) = t.anchored(pointer, 1.0, |t| t.set_zoom(t.zoom() + 1.3));
        assert!(held);
        assert!((t.world_to_screen(before) - pointer).length() < 1.0);
    }

    #[test]
    fn orthographic_camera_places_and_picks() {
        let mut t = Transform::new(
            Camera::orthographic(1.0, 0.1, 100.0),
            Viewport::new(400.0, 400.0),
            UpAxis::Y,
            Constraints::default(),
        );
        t.set_zoom(1.0);
        let corner = t.screen_to_world(DVec2::new(400.0, 0.0)).unwrap();
        // 200 px half-extent at scale 2 → 100 world units; north is -Z
        assert!((corner.x - 100.0).abs() < 1e-9);
        assert!((corner.z + 100.0).abs() < 1e-9);
    }
}
