//! Pose-delta operators shared by the navigation API and the gesture
//! handlers.
//!
//! [`CameraHelper`] is the seam a non-planar ground (a globe projection,
//! say) would plug into; [`PlanarHelper`] is the flat-ground strategy used
//! everywhere today.

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

use super::pose::{
    Constraints, GroundBounds, Padding, ABSOLUTE_MAX_PITCH, ABSOLUTE_MAX_ZOOM,
    ABSOLUTE_MIN_ZOOM,
};
use super::transform::Transform;

/// Bisection steps for the fit-bounds zoom search.
const FIT_ITERATIONS: usize = 24;
/// Re-centering steps per candidate zoom.
const CENTERING_ITERATIONS: usize = 6;
/// Box midpoint error (pixels) accepted as centered.
const CENTERING_TOLERANCE_PX: f64 = 1e-4;

/// Inputs for [`CameraHelper::camera_for_box_and_bearing`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundsOptions {
    /// Bearing to solve at; the current bearing when `None`.
    pub bearing: Option<f64>,
    /// Pitch to solve at; the current pitch when `None`.
    pub pitch: Option<f64>,
    /// Insets the box must fit inside.
    pub padding: Padding,
    /// Extra screen-space shift of the box's center, in pixels.
    pub offset: DVec2,
    /// Upper zoom limit for the result (on top of the constraints).
    pub max_zoom: Option<f64>,
}

/// Camera that frames a ground box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsCamera {
    /// Look-at target.
    pub center: DVec3,
    /// Zoom level.
    pub zoom: f64,
    /// Bearing, degrees.
    pub bearing: f64,
    /// Pitch, degrees.
    pub pitch: f64,
}

/// Applies pose deltas to a [`Transform`].
pub trait CameraHelper {
    /// Move the view by a screen-pixel delta: the ground point `delta`
    /// pixels from the center becomes the new center.
    fn pan(&self, transform: &mut Transform, delta: DVec2);

    /// Apply roll, pitch, bearing and zoom deltas in one recomputation.
    /// Each result is individually clamped/normalized.
    fn roll_pitch_bearing_zoom(
        &self,
        transform: &mut Transform,
        d_roll: f64,
        d_pitch: f64,
        d_bearing: f64,
        d_zoom: f64,
    );

    /// Highest zoom (and matching center) at which `bounds` fits inside the
    /// padded viewport at the requested bearing and pitch. `None` when the
    /// viewport is empty or the padding leaves no room.
    fn camera_for_box_and_bearing(
        &self,
        transform: &Transform,
        bounds: &GroundBounds,
        options: &BoundsOptions,
    ) -> Option<BoundsCamera>;
}

/// Flat ground-plane strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanarHelper;

impl CameraHelper for PlanarHelper {
    fn pan(&self, transform: &mut Transform, delta: DVec2) {
        if !delta.is_finite() || delta == DVec2::ZERO {
            return;
        }
        let ground = transform.screen_delta_to_ground(delta);
        transform.adjust_center_by_ground_delta(ground);
    }

    fn roll_pitch_bearing_zoom(
        &self,
        transform: &mut Transform,
        d_roll: f64,
        d_pitch: f64,
        d_bearing: f64,
        d_zoom: f64,
    ) {
        transform.defer_apply(|t| {
            if d_roll != 0.0 {
                t.set_roll(t.roll() + d_roll);
            }
            if d_pitch != 0.0 {
                t.set_pitch(t.pitch() + d_pitch);
            }
            if d_bearing != 0.0 {
                t.set_bearing(t.bearing() + d_bearing);
            }
            if d_zoom != 0.0 {
                t.set_zoom(t.zoom() + d_zoom);
            }
        });
    }

    fn camera_for_box_and_bearing(
        &self,
        transform: &Transform,
        bounds: &GroundBounds,
        options: &BoundsOptions,
    ) -> Option<BoundsCamera> {
        let viewport = transform.viewport();
        let padding = options.padding.sanitized();
        let available = DVec2::new(
            viewport.width - padding.left - padding.right,
            viewport.height - padding.top - padding.bottom,
        );
        if viewport.is_degenerate() || available.x <= 0.0 || available.y <= 0.0 {
            log::debug!("no room to fit bounds in {available:?}");
            return None;
        }

        let up_axis = transform.up_axis();
        let bearing = options.bearing.unwrap_or_else(|| transform.bearing());
        let pitch = options.pitch.unwrap_or_else(|| transform.pitch());
        let desired = viewport.size() * 0.5 + padding.centroid_offset() + options.offset;

        // Solve on a scratch copy with wide-open limits. It keeps the live
        // padding, which is what the result will be shown with.
        let mut scratch = transform.clone();
        scratch.set_constraints(Constraints {
            min_zoom: ABSOLUTE_MIN_ZOOM,
            max_zoom: ABSOLUTE_MAX_ZOOM,
            min_pitch: 0.0,
            max_pitch: ABSOLUTE_MAX_PITCH,
            pan_bounds: None,
            pan_overshoot_px: 0.0,
        });
        scratch.defer_apply(|t| {
            t.set_bearing(bearing);
            t.set_pitch(pitch);
            t.set_roll(0.0);
            t.set_center(up_axis.from_ground(bounds.center(), 0.0));
        });

        let corners = bounds.corners().map(|c| up_axis.from_ground(c, 0.0));
        let extents = |t: &Transform| -> Option<(DVec2, DVec2)> {
            let mut min = DVec2::splat(f64::INFINITY);
            let mut max = DVec2::splat(f64::NEG_INFINITY);
            for corner in corners {
                let p = t.world_to_screen_checked(corner)?;
                min = min.min(p);
                max = max.max(p);
            }
            Some((min, max))
        };
        // Zoom to `zoom`, then walk the center until the box's screen
        // midpoint sits on `desired`. One step is exact at zero pitch.
        let place = |t: &mut Transform, zoom: f64| -> Option<(DVec2, DVec2)> {
            t.set_zoom(zoom);
            let mut bbox = extents(t)?;
            for _ in 0..CENTERING_ITERATIONS {
                let error = (bbox.0 + bbox.1) * 0.5 - desired;
                if error.length() < CENTERING_TOLERANCE_PX {
                    break;
                }
                let target = t.center_point() + error;
                match t.ground_from_screen(target) {
                    Some(ground) => t.set_ground_center(ground),
                    None => {
                        let delta = t.screen_delta_to_ground(error);
                        t.adjust_center_by_ground_delta(delta);
                    }
                }
                bbox = extents(t)?;
            }
            Some(bbox)
        };
        let fits = |t: &mut Transform, zoom: f64| {
            place(t, zoom).is_some_and(|(min, max)| {
                let size = max - min;
                size.x <= available.x && size.y <= available.y
            })
        };

        let mut lo = ABSOLUTE_MIN_ZOOM;
        let mut hi = ABSOLUTE_MAX_ZOOM;
        if fits(&mut scratch, hi) {
            lo = hi;
        } else if fits(&mut scratch, lo) {
            for _ in 0..FIT_ITERATIONS {
                let mid = (lo + hi) * 0.5;
                if fits(&mut scratch, mid) {
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
        }

        let mut zoom = transform.constraints().clamp_zoom(lo);
        if let Some(max_zoom) = options.max_zoom.filter(|z| z.is_finite()) {
            zoom = zoom.min(max_zoom);
        }
        let _ = place(&mut scratch, zoom)?;
        let center = scratch.center();

        Some(BoundsCamera {
            center,
            zoom,
            bearing: scratch.bearing(),
            pitch: scratch.pitch(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::core::Camera;
    use crate::camera::pose::{GroundPoint, UpAxis, Viewport};

    fn transform(up_axis: UpAxis) -> Transform {
        Transform::new(
            Camera::perspective(36.87, 1.0, 0.1, 1000.0),
            Viewport::new(1000.0, 800.0),
            up_axis,
            Constraints::default(),
        )
    }

    fn apply(t: &mut Transform, cam: &BoundsCamera, padding: Padding) {
        t.defer_apply(|t| {
            t.set_padding(padding);
            t.set_zoom(cam.zoom);
            t.set_bearing(cam.bearing);
            t.set_pitch(cam.pitch);
            t.set_center(cam.center);
        });
    }

    #[test]
    fn fitted_box_stays_inside_padded_viewport() {
        let bounds = GroundBounds::new(
            GroundPoint::new(-30.0, 10.0),
            GroundPoint::new(50.0, 40.0),
        );
        let padding = Padding {
            top: 40.0,
            right: 120.0,
            bottom: 20.0,
            left: 60.0,
        };
        for axis in [UpAxis::Y, UpAxis::Z] {
            for bearing in [0.0, 30.0, -75.0, 180.0] {
                let mut t = transform(axis);
                t.set_padding(padding);
                let options = BoundsOptions {
                    bearing: Some(bearing),
                    pitch: Some(0.0),
                    padding,
                    ..BoundsOptions::default()
                };
                let cam = PlanarHelper
                    .camera_for_box_and_bearing(&t, &bounds, &options)
                    .unwrap();
                apply(&mut t, &cam, padding);

                let mut min = DVec2::splat(f64::INFINITY);
                let mut max = DVec2::splat(f64::NEG_INFINITY);
                for corner in bounds.corners() {
                    let p = t.world_to_screen(axis.from_ground(corner, 0.0));
                    assert!(p.x >= padding.left - 1.0 && p.x <= 1000.0 - padding.right + 1.0);
                    assert!(p.y >= padding.top - 1.0 && p.y <= 800.0 - padding.bottom + 1.0);
                    min = min.min(p);
                    max = max.max(p);
                }
                // Tight on at least one axis.
                let size = max - min;
                let room = DVec2::new(820.0, 740.0);
                assert!((room - size).min_element() < 2.0, "{size:?}");
            }
        }
    }

    #[test]
    fn offset_shifts_the_box() {
        let bounds = GroundBounds::new(GroundPoint::new(0.0, 0.0), GroundPoint::new(10.0, 10.0));
        let mut t = transform(UpAxis::Y);
        let options = BoundsOptions {
            offset: DVec2::new(50.0, -20.0),
            padding: Padding::uniform(100.0),
            ..BoundsOptions::default()
        };
        let cam = PlanarHelper
            .camera_for_box_and_bearing(&t, &bounds, &options)
            .unwrap();
        apply(&mut t, &cam, Padding::default());
        let mid = t.world_to_screen(UpAxis::Y.from_ground(bounds.center(), 0.0));
        assert!((mid - DVec2::new(550.0, 380.0)).length() < 1e-6, "{mid:?}");
    }

    #[test]
    fn point_box_is_capped_by_max_zoom() {
        let p = GroundPoint::new(5.0, 5.0);
        let t = transform(UpAxis::Z);
        let cam = PlanarHelper
            .camera_for_box_and_bearing(&t, &GroundBounds::new(p, p), &BoundsOptions::default())
            .unwrap();
        assert_eq!(cam.zoom, 22.0);

        let capped = PlanarHelper
            .camera_for_box_and_bearing(
                &t,
                &GroundBounds::new(p, p),
                &BoundsOptions {
                    max_zoom: Some(12.0),
                    ..BoundsOptions::default()
                },
            )
            .unwrap();
        assert_eq!(capped.zoom, 12.0);
    }

    #[test]
    fn oversized_padding_gives_none() {
        let t = transform(UpAxis::Y);
        let bounds = GroundBounds::new(GroundPoint::new(0.0, 0.0), GroundPoint::new(1.0, 1.0));
        let options = BoundsOptions {
            padding: Padding::uniform(600.0),
            ..BoundsOptions::default()
        };
        assert!(PlanarHelper
            .camera_for_box_and_bearing(&t, &bounds, &options)
            .is_none());
    }

    #[test]
    fn pan_moves_center_toward_the_delta() {
        let mut t = transform(UpAxis::Y);
        t.set_zoom(1.0);
        PlanarHelper.pan(&mut t, DVec2::new(100.0, 0.0));
        // 100 px at scale 2 → 50 units east
        assert!((t.center() - DVec3::new(50.0, 0.0, 0.0)).length() < 1e-9);
        PlanarHelper.pan(&mut t, DVec2::new(0.0, -100.0));
        // screen up is north (-Z)
        assert!((t.center() - DVec3::new(50.0, 0.0, -50.0)).length() < 1e-9);
    }

    #[test]
    fn combined_delta_recomputes_once() {
        let mut t = transform(UpAxis::Y);
        let before = t.apply_count();
        PlanarHelper.roll_pitch_bearing_zoom(&mut t, 10.0, 100.0, 200.0, 1.5);
        assert_eq!(t.apply_count(), before + 1);
        assert_eq!(t.roll(), 10.0);
        assert_eq!(t.pitch(), 85.0);
        assert_eq!(t.bearing(), -160.0);
        assert_eq!(t.zoom(), 1.5);
    }
}
