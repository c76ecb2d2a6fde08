//! Programmatic navigation: jumps, eases, flights, and the incremental
//! wrappers built on them.

use glam::{DVec2, DVec3};
use web_time::Duration;

use super::{AnimationKind, CameraController};
use crate::animation::{
    Anchor, AnimationToken, CameraAnimation, CameraTarget, EaseOptions,
    FlightParams, FlyOptions,
};
use crate::camera::{BoundsCamera, BoundsOptions, GroundBounds, Padding, Pose};
use crate::events::EventKind;
use crate::util::math::{clamp, finite_or, zoom_scale};

impl CameraController {
    // ── Instant ────────────────────────────────────────────────────────

    /// Apply the target's fields at once. Stops any running animation;
    /// fires `renderFrame` only, no move lifecycle.
    pub fn jump_to(&mut self, target: CameraTarget) {
        if self.disposed {
            return;
        }
        self.stop();
        let pose = target.resolve(&self.transform.pose());
        self.transform.set_pose(&pose);
        self.fire(EventKind::RenderFrame);
    }

    /// Move the look-at target.
    pub fn set_center(&mut self, center: DVec3) {
        self.jump_to(CameraTarget::default().center(center));
    }

    /// Set zoom.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.jump_to(CameraTarget::default().zoom(zoom));
    }

    /// Set bearing.
    pub fn set_bearing(&mut self, bearing: f64) {
        self.jump_to(CameraTarget::default().bearing(bearing));
    }

    /// Set pitch.
    pub fn set_pitch(&mut self, pitch: f64) {
        self.jump_to(CameraTarget::default().pitch(pitch));
    }

    /// Set roll.
    pub fn set_roll(&mut self, roll: f64) {
        self.jump_to(CameraTarget::default().roll(roll));
    }

    /// Set padding.
    pub fn set_padding(&mut self, padding: Padding) {
        self.jump_to(CameraTarget::default().padding(padding));
    }

    // ── Animated ───────────────────────────────────────────────────────

    /// Animate to `options.target`, interpolating every field by the
    /// easing curve. With `around`, the ground point under that screen
    /// point is held in place every frame.
    ///
    /// Any running animation ends first, with its end events. Under
    /// reduced motion (and without `essential`) this jumps instead.
    pub fn ease_to(&mut self, options: EaseOptions) -> AnimationToken {
        let token = AnimationToken::new();
        if self.disposed {
            token.abort();
            return token;
        }
        let from = self.transform.pose();
        let to = self.resolve_target(&options.target, options.offset);
        if self.prefers_reduced_motion() && !options.essential {
            log::debug!("reduced motion: ease becomes a jump");
            self.jump_to(to.into());
            return token;
        }

        let anchor = options.around.and_then(|point| {
            let ground = self.transform.ground_from_screen(point);
            if ground.is_none() {
                log::trace!("ease anchor {point:?} misses the ground");
            }
            ground.map(|ground| Anchor {
                point,
                ground,
                tightness: clamp(finite_or(options.anchor_tightness, 1.0), 0.0, 1.0),
            })
        });
        let animation_options = &self.options.animation;
        let duration = options
            .duration
            .unwrap_or_else(|| Duration::from_millis(animation_options.ease_duration_ms));
        let easing = options.easing.unwrap_or(animation_options.easing);

        let animation = CameraAnimation::ease(
            from,
            to,
            self.transform.up_axis(),
            duration,
            easing,
            anchor,
            token,
        );
        self.start_animation(animation, AnimationKind::Navigation)
    }

    /// Fly to `options.target` along a zoom-out arc, or at a constant
    /// on-screen speed when `screen_speed` is set.
    ///
    /// The duration follows the path length and `speed` unless given,
    /// never shorter than the bearing/pitch/roll turn needs at the
    /// configured angular speed, and never longer than `max_duration`.
    pub fn fly_to(&mut self, options: FlyOptions) -> AnimationToken {
        let token = AnimationToken::new();
        if self.disposed {
            token.abort();
            return token;
        }
        let from = self.transform.pose();
        let to = self.resolve_target(&options.target, options.offset);
        if self.prefers_reduced_motion() && !options.essential {
            log::debug!("reduced motion: flight becomes a jump");
            self.jump_to(to.into());
            return token;
        }

        let defaults = &self.options.animation;
        let params = FlightParams {
            curve: options.curve.filter(|c| c.is_finite() && *c > 0.0).unwrap_or(defaults.fly_curve),
            speed: options.speed.filter(|s| s.is_finite() && *s > 0.0).unwrap_or(defaults.fly_speed),
            angular_speed: defaults.angular_speed_deg_per_s,
            duration: options.duration,
            max_duration: options
                .max_duration
                .or_else(|| defaults.max_fly_duration_ms.map(Duration::from_millis)),
            min_zoom: options.min_zoom,
            easing: options.easing.unwrap_or(defaults.easing),
        };
        let up_axis = self.transform.up_axis();
        let animation = match options.screen_speed.filter(|s| s.is_finite() && *s > 0.0) {
            Some(speed) => CameraAnimation::screen_speed(from, to, up_axis, speed, &params, token),
            None => CameraAnimation::flight(
                from,
                to,
                up_axis,
                self.transform.viewport(),
                &params,
                token,
            ),
        };
        self.start_animation(animation, AnimationKind::Navigation)
    }

    /// Ease the view by a screen-pixel offset.
    pub fn pan_by(&mut self, offset: DVec2, options: EaseOptions) -> AnimationToken {
        let delta = self.transform.screen_delta_to_ground(offset);
        let center = self.transform.center() + self.transform.up_axis().ground_vector(delta);
        self.pan_to(center, options)
    }

    /// Ease the look-at target to `center`.
    pub fn pan_to(&mut self, center: DVec3, mut options: EaseOptions) -> AnimationToken {
        options.target.center = Some(center);
        self.ease_to(options)
    }

    /// Ease to `zoom`.
    pub fn zoom_to(&mut self, zoom: f64, mut options: EaseOptions) -> AnimationToken {
        options.target.zoom = Some(zoom);
        self.ease_to(options)
    }

    /// Ease one zoom level in.
    pub fn zoom_in(&mut self, options: EaseOptions) -> AnimationToken {
        self.zoom_to(self.transform.zoom() + 1.0, options)
    }

    /// Ease one zoom level out.
    pub fn zoom_out(&mut self, options: EaseOptions) -> AnimationToken {
        self.zoom_to(self.transform.zoom() - 1.0, options)
    }

    /// Ease to `bearing`, the short way round.
    pub fn rotate_to(&mut self, bearing: f64, mut options: EaseOptions) -> AnimationToken {
        options.target.bearing = Some(bearing);
        self.ease_to(options)
    }

    /// Ease the bearing by `delta` degrees.
    pub fn rotate_by(&mut self, delta: f64, options: EaseOptions) -> AnimationToken {
        self.rotate_to(self.transform.bearing() + delta, options)
    }

    /// Ease to `pitch`.
    pub fn pitch_to(&mut self, pitch: f64, mut options: EaseOptions) -> AnimationToken {
        options.target.pitch = Some(pitch);
        self.ease_to(options)
    }

    /// Ease the pitch by `delta` degrees.
    pub fn pitch_by(&mut self, delta: f64, options: EaseOptions) -> AnimationToken {
        self.pitch_to(self.transform.pitch() + delta, options)
    }

    /// Ease to `roll`.
    pub fn roll_to(&mut self, roll: f64, mut options: EaseOptions) -> AnimationToken {
        options.target.roll = Some(roll);
        self.ease_to(options)
    }

    /// Ease the roll by `delta` degrees.
    pub fn roll_by(&mut self, delta: f64, options: EaseOptions) -> AnimationToken {
        self.roll_to(self.transform.roll() + delta, options)
    }

    // ── Bounds ─────────────────────────────────────────────────────────

    /// Camera that frames `bounds` inside the padded viewport, without
    /// moving. `None` when the padding leaves no room.
    #[must_use]
    pub fn camera_for_bounds(
        &self,
        bounds: &GroundBounds,
        options: &BoundsOptions,
    ) -> Option<BoundsCamera> {
        self.helper
            .camera_for_box_and_bearing(&self.transform, bounds, options)
    }

    /// Ease to the camera that frames `bounds`. Returns `None` (and stays
    /// put) when no such camera exists.
    pub fn fit_bounds(
        &mut self,
        bounds: &GroundBounds,
        options: &BoundsOptions,
        mut ease: EaseOptions,
    ) -> Option<AnimationToken> {
        let Some(camera) = self.camera_for_bounds(bounds, options) else {
            log::warn!("cannot fit {bounds:?} with {:?}", options.padding);
            return None;
        };
        ease.target = ease
            .target
            .center(camera.center)
            .zoom(camera.zoom)
            .bearing(camera.bearing)
            .pitch(camera.pitch);
        ease.offset = DVec2::ZERO;
        Some(self.ease_to(ease))
    }

    /// `target` applied to the current pose and clamped, with the center
    /// shifted so it lands `offset` pixels from the view center once the
    /// target bearing and zoom are in effect.
    fn resolve_target(&self, target: &CameraTarget, offset: DVec2) -> Pose {
        let mut pose = target
            .resolve(&self.transform.pose())
            .constrained(self.transform.constraints());
        if offset != DVec2::ZERO && offset.is_finite() {
            let up_axis = self.transform.up_axis();
            let right = up_axis.screen_right(pose.bearing);
            let heading = up_axis.heading(pose.bearing);
            let ground = (right * offset.x - heading * offset.y) / zoom_scale(pose.zoom);
            pose.center -= up_axis.ground_vector(ground);
        }
        pose
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::super::testing::{controller, record};
    use super::*;
    use crate::camera::GroundPoint;

    const FRAME: Duration = Duration::from_millis(16);

    fn run(c: &mut CameraController) {
        let mut frames = 0;
        while c.needs_update() {
            c.update(Some(FRAME));
            frames += 1;
            assert!(frames < 10_000, "animation never settled");
        }
    }

    #[test]
    fn ease_reaches_target_with_lifecycle() {
        let (mut c, _) = controller();
        let log = record(&c);
        let target = CameraTarget::default().zoom(3.0).pitch(30.0);
        let token = c.ease_to(EaseOptions::to(target).duration(Duration::from_millis(200)));
        assert!(c.is_zooming() && c.is_pitching());
        run(&mut c);
        assert!(!token.is_aborted());
        assert_eq!(c.pose().zoom, 3.0);
        assert_eq!(c.pose().pitch, 30.0);
        assert_eq!(
            *log.borrow(),
            vec!["movestart", "zoomstart", "pitchstart", "zoomend", "pitchend", "moveend"]
        );
    }

    #[test]
    fn jump_fires_only_render_frame() {
        let (mut c, _) = controller();
        let log = record(&c);
        let frames = Rc::new(Cell::new(0));
        let f = Rc::clone(&frames);
        let _ = c.on(EventKind::RenderFrame, move |_| f.set(f.get() + 1));
        c.jump_to(CameraTarget::default().zoom(6.0).bearing(-30.0));
        assert_eq!(frames.get(), 1);
        assert!(log.borrow().is_empty());
        assert_eq!(c.pose().zoom, 6.0);
        assert_eq!(c.pose().bearing, -30.0);
        assert!(!c.needs_update());
    }

    #[test]
    fn bearing_snaps_to_north_across_the_wrap() {
        for target in [3.0, 359.0, -6.5] {
            let (mut c, _) = controller();
            let _ = c.rotate_to(target, EaseOptions::default().duration(Duration::from_millis(100)));
            run(&mut c);
            assert_eq!(c.pose().bearing, 0.0, "target {target}");
        }
        let (mut c, _) = controller();
        let _ = c.rotate_to(20.0, EaseOptions::default());
        run(&mut c);
        assert!((c.pose().bearing - 20.0).abs() < 1e-9);
    }

    #[test]
    fn superseded_ease_ends_once_before_the_next_starts() {
        let (mut c, _) = controller();
        let log = record(&c);
        let first = c.zoom_to(4.0, EaseOptions::default());
        c.update(Some(FRAME));
        c.update(Some(FRAME));
        let second = c.zoom_to(1.0, EaseOptions::default());
        assert!(first.is_aborted());
        run(&mut c);
        assert!(!second.is_aborted());

        let log = log.borrow();
        let count = |name: &str| log.iter().filter(|e| **e == name).count();
        assert_eq!(count("zoomend"), 2);
        assert_eq!(count("moveend"), 2);
        assert_eq!(
            *log,
            vec![
                "movestart", "zoomstart", "zoomend", "moveend",
                "movestart", "zoomstart", "zoomend", "moveend"
            ]
        );
        assert_eq!(c.pose().zoom, 1.0);
    }

    #[test]
    fn aborted_token_ends_on_next_frame() {
        let (mut c, _) = controller();
        let log = record(&c);
        let token = c.zoom_to(8.0, EaseOptions::default());
        c.update(Some(FRAME));
        token.abort();
        c.update(Some(FRAME));
        assert!(!c.is_moving());
        assert!(c.pose().zoom < 8.0);
        assert_eq!(*log.borrow(), vec!["movestart", "zoomstart", "zoomend", "moveend"]);
    }

    #[test]
    fn anchored_ease_holds_the_ground_under_the_point() {
        let point = DVec2::new(250.0, 420.0);
        for zoom in [2.0, 6.0] {
            for bearing in [0.0, 45.0, -120.0] {
                for pitch in [0.0, 30.0, 60.0] {
                    for (dz, db, dp) in [(1.5, 0.0, 0.0), (0.0, 40.0, 0.0), (0.0, 0.0, 15.0), (-1.0, -25.0, 10.0)] {
                        let (mut c, _) = controller();
                        c.jump_to(CameraTarget::default().zoom(zoom).bearing(bearing).pitch(pitch));
                        let Some(ground) = c.transform().ground_from_screen(point) else {
                            continue;
                        };
                        let target = CameraTarget::default()
                            .zoom(zoom + dz)
                            .bearing(bearing + db)
                            .pitch(pitch + dp);
                        let _ = c.ease_to(EaseOptions::to(target).around(point).duration(Duration::from_millis(160)));
                        run(&mut c);
                        let world = c.transform().up_axis().from_ground(ground, 0.0);
                        let drift = c.transform().world_to_screen(world).distance(point);
                        assert!(
                            drift <= 1.0,
                            "z={zoom} b={bearing} p={pitch} d=({dz},{db},{dp}): drift {drift}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn anchor_tightness_is_clamped_to_unit_range() {
        let point = DVec2::new(250.0, 420.0);
        let settle = |tightness: f64| {
            let (mut c, _) = controller();
            c.jump_to(CameraTarget::default().zoom(3.0).pitch(30.0));
            let ground = c.transform().ground_from_screen(point).unwrap();
            let _ = c.ease_to(EaseOptions {
                anchor_tightness: tightness,
                ..EaseOptions::to(CameraTarget::default().zoom(4.5))
                    .around(point)
                    .duration(Duration::from_millis(160))
            });
            run(&mut c);
            let world = c.transform().up_axis().from_ground(ground, 0.0);
            (c.pose(), c.transform().world_to_screen(world).distance(point))
        };

        let (_, drift) = settle(4.0);
        assert!(drift <= 1.0, "overshot anchor by {drift}");
        assert_eq!(settle(4.0).0, settle(1.0).0);
        assert_eq!(settle(-2.0).0, settle(0.0).0);
    }

    #[test]
    fn offset_puts_target_off_center() {
        let (mut c, _) = controller();
        let target = DVec3::new(5.0, 0.0, 5.0);
        let _ = c.ease_to(EaseOptions {
            offset: DVec2::new(100.0, -50.0),
            ..EaseOptions::to(CameraTarget::default().center(target).zoom(3.0).bearing(30.0))
        });
        run(&mut c);
        let screen = c.transform().world_to_screen(target);
        let expected = c.transform().center_point() + DVec2::new(100.0, -50.0);
        assert!(screen.distance(expected) < 1e-6, "{screen:?} vs {expected:?}");
    }

    #[test]
    fn fly_to_lands_on_target() {
        let (mut c, _) = controller();
        let log = record(&c);
        let target = CameraTarget::default()
            .center(DVec3::new(400.0, 0.0, -300.0))
            .zoom(5.0)
            .bearing(90.0);
        let token = c.fly_to(FlyOptions::to(target));
        run(&mut c);
        assert!(!token.is_aborted());
        let pose = c.pose();
        assert!((pose.center - DVec3::new(400.0, 0.0, -300.0)).length() < 1e-9);
        assert_eq!(pose.zoom, 5.0);
        assert_eq!(pose.bearing, 90.0);
        assert_eq!(log.borrow().first(), Some(&"movestart"));
        assert_eq!(log.borrow().last(), Some(&"moveend"));
    }

    #[test]
    fn max_duration_caps_the_flight() {
        let (mut c, _) = controller();
        let _ = c.fly_to(FlyOptions {
            max_duration: Some(Duration::from_millis(300)),
            ..FlyOptions::to(CameraTarget::default().center(DVec3::new(1e5, 0.0, 0.0)))
        });
        let mut frames = 0;
        while c.needs_update() {
            c.update(Some(FRAME));
            frames += 1;
        }
        assert!(frames <= 300 / 16 + 2, "{frames} frames");
    }

    #[test]
    fn screen_speed_flight_finishes() {
        let (mut c, _) = controller();
        let target = DVec3::new(50.0, 0.0, 0.0);
        let _ = c.fly_to(FlyOptions {
            screen_speed: Some(800.0),
            ..FlyOptions::to(CameraTarget::default().center(target).zoom(2.0))
        });
        run(&mut c);
        assert!((c.pose().center - target).length() < 1e-9);
        assert_eq!(c.pose().zoom, 2.0);
    }

    #[test]
    fn reduced_motion_jumps_unless_essential() {
        let (mut c, _) = controller();
        c.options.animation.reduced_motion = Some(true);
        let _ = c.zoom_to(4.0, EaseOptions::default());
        assert!(!c.needs_update());
        assert_eq!(c.pose().zoom, 4.0);

        let _ = c.zoom_to(2.0, EaseOptions {
            essential: true,
            ..EaseOptions::default()
        });
        assert!(c.needs_update());
    }

    #[test]
    fn fit_bounds_contains_all_corners() {
        let bounds = GroundBounds::new(GroundPoint::new(-40.0, 10.0), GroundPoint::new(25.0, 60.0));
        let padding = Padding {
            top: 40.0,
            right: 20.0,
            bottom: 60.0,
            left: 100.0,
        };
        for (bearing, pitch) in [(0.0, 0.0), (30.0, 0.0), (-70.0, 40.0)] {
            let (mut c, _) = controller();
            let options = BoundsOptions {
                bearing: Some(bearing),
                pitch: Some(pitch),
                padding,
                ..BoundsOptions::default()
            };
            let token = c.fit_bounds(&bounds, &options, EaseOptions::default());
            assert!(token.is_some());
            run(&mut c);
            let t = c.transform();
            let size = t.viewport().size();
            for corner in bounds.corners() {
                let p = t.world_to_screen(t.up_axis().from_ground(corner, 0.0));
                assert!(p.x >= padding.left - 1.0 && p.x <= size.x - padding.right + 1.0, "{p:?}");
                assert!(p.y >= padding.top - 1.0 && p.y <= size.y - padding.bottom + 1.0, "{p:?}");
            }
        }
    }

    #[test]
    fn fit_bounds_without_room_stays_put() {
        let (mut c, _) = controller();
        let bounds = GroundBounds::new(GroundPoint::new(0.0, 0.0), GroundPoint::new(1.0, 1.0));
        let options = BoundsOptions {
            padding: Padding::uniform(500.0),
            ..BoundsOptions::default()
        };
        assert!(c.fit_bounds(&bounds, &options, EaseOptions::default()).is_none());
        assert!(!c.is_moving());
    }

    #[test]
    fn incremental_wrappers_accumulate() {
        let (mut c, _) = controller();
        let quick = || EaseOptions::default().duration(Duration::ZERO);
        let _ = c.zoom_in(quick());
        run(&mut c);
        let _ = c.zoom_in(quick());
        run(&mut c);
        let _ = c.zoom_out(quick());
        run(&mut c);
        let _ = c.rotate_by(30.0, quick());
        run(&mut c);
        let _ = c.pitch_by(20.0, quick());
        run(&mut c);
        let _ = c.roll_by(-10.0, quick());
        run(&mut c);
        let _ = c.pan_by(DVec2::new(0.0, -100.0), quick());
        run(&mut c);
        let pose = c.pose();
        assert_eq!(pose.zoom, 1.0);
        assert!((pose.bearing - 30.0).abs() < 1e-9);
        assert!((pose.pitch - 20.0).abs() < 1e-9);
        assert!((pose.roll + 10.0).abs() < 1e-9);
        // 100 px toward the top of the screen at bearing 30, zoom 1
        let expected = c.transform().up_axis().heading(30.0) * 50.0;
        let ground = c.transform().ground_center().to_vec2();
        assert!(ground.distance(expected) < 1e-9, "{ground:?}");
    }
}
