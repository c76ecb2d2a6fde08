//! Frame-stepped camera animations.
//!
//! A [`CameraAnimation`] owns its start and end poses and is advanced by
//! the controller with the frame delta. Three motions exist:
//!
//! - **ease**: every field interpolated by `easing(elapsed / duration)`,
//!   optionally holding a ground anchor under a screen point;
//! - **flight**: zoom and center follow the [`FlightPath`] arc;
//! - **screen speed**: the center moves at a constant on-screen speed
//!   while the other fields ease, finishing once both the time and the
//!   distance are used up.

use glam::{DVec2, DVec3};
use web_time::Duration;

use super::flight_path::FlightPath;
use super::token::AnimationToken;
use crate::camera::{GroundPoint, Pose, Transform, UpAxis, Viewport};
use crate::events::Axes;
use crate::util::easing::EasingFunction;
use crate::util::math::{lerp, shortest_angle_delta, zoom_scale};

/// Field changes below this don't count as moving that axis.
const CHANGE_EPSILON: f64 = 1e-9;

/// Ground point held under a screen point during an ease.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Anchor {
    pub(crate) point: DVec2,
    pub(crate) ground: GroundPoint,
    pub(crate) tightness: f64,
}

/// Flight tuning resolved from call options and configured defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FlightParams {
    pub(crate) curve: f64,
    pub(crate) speed: f64,
    pub(crate) angular_speed: f64,
    pub(crate) duration: Option<Duration>,
    pub(crate) max_duration: Option<Duration>,
    pub(crate) min_zoom: Option<f64>,
    pub(crate) easing: EasingFunction,
}

#[derive(Debug, Clone, Copy)]
enum Motion {
    Ease {
        anchor: Option<Anchor>,
    },
    Flight {
        path: FlightPath,
    },
    ScreenSpeed {
        /// Pixels per second.
        speed: f64,
        /// Ground units covered so far.
        travelled: f64,
        /// Ground units to cover.
        total: f64,
        cap: Option<Duration>,
    },
}

/// One running camera animation.
#[derive(Debug, Clone)]
pub(crate) struct CameraAnimation {
    motion: Motion,
    from: Pose,
    to: Pose,
    up_axis: UpAxis,
    duration: Duration,
    elapsed: Duration,
    easing: EasingFunction,
    token: AnimationToken,
}

impl CameraAnimation {
    /// Interpolate every field from `from` to `to`. With an anchor the
    /// center follows the anchor instead of `to.center`.
    pub(crate) fn ease(
        from: Pose,
        to: Pose,
        up_axis: UpAxis,
        duration: Duration,
        easing: EasingFunction,
        anchor: Option<Anchor>,
        token: AnimationToken,
    ) -> Self {
        Self {
            motion: Motion::Ease { anchor },
            from,
            to,
            up_axis,
            duration,
            elapsed: Duration::ZERO,
            easing,
            token,
        }
    }

    /// Fly along the zoom-out arc.
    pub(crate) fn flight(
        from: Pose,
        to: Pose,
        up_axis: UpAxis,
        viewport: Viewport,
        params: &FlightParams,
        token: AnimationToken,
    ) -> Self {
        let w0 = viewport.width.max(viewport.height).max(1.0);
        let w1 = w0 / zoom_scale(to.zoom - from.zoom);
        let ground_distance = ground(up_axis, from.center).distance(ground(up_axis, to.center));
        let u1 = ground_distance * zoom_scale(from.zoom);

        let mut rho = params.curve;
        if let Some(min_zoom) = params.min_zoom.filter(|z| z.is_finite()) {
            // pick the curvature whose arc peaks at min_zoom
            let peak = min_zoom.min(from.zoom).min(to.zoom);
            let w_max = w0 / zoom_scale(peak - from.zoom);
            if u1 > 0.0 {
                rho = (w_max / u1 * 2.0).sqrt();
            }
        }
        let path = FlightPath::new(w0, w1, u1, rho);

        let arc = if path.is_degenerate() {
            (w1 / w0).ln().abs() / rho.max(f64::EPSILON)
        } else {
            path.arc_length()
        };
        let travel = arc / params.speed.max(f64::EPSILON);
        let duration = resolve_duration(
            params.duration,
            travel,
            angular_seconds(&from, &to, params.angular_speed),
            params.max_duration,
        );
        log::debug!(
            "fly: S={arc:.3} rho={rho:.3} duration={:.0}ms",
            duration.as_secs_f64() * 1000.0
        );

        Self {
            motion: Motion::Flight { path },
            from,
            to,
            up_axis,
            duration,
            elapsed: Duration::ZERO,
            easing: params.easing,
            token,
        }
    }

    /// Pan at `screen_speed` pixels per second whatever the zoom.
    pub(crate) fn screen_speed(
        from: Pose,
        to: Pose,
        up_axis: UpAxis,
        screen_speed: f64,
        params: &FlightParams,
        token: AnimationToken,
    ) -> Self {
        let total = ground(up_axis, from.center).distance(ground(up_axis, to.center));
        // time estimate at the geometric mean of the two scales
        let mean_scale = zoom_scale((from.zoom + to.zoom) * 0.5);
        let travel = total * mean_scale / screen_speed;
        let duration = resolve_duration(
            params.duration,
            travel,
            angular_seconds(&from, &to, params.angular_speed),
            params.max_duration,
        );
        Self {
            motion: Motion::ScreenSpeed {
                speed: screen_speed,
                travelled: 0.0,
                total,
                cap: params.max_duration,
            },
            from,
            to,
            up_axis,
            duration,
            elapsed: Duration::ZERO,
            easing: params.easing,
            token,
        }
    }

    /// Axes this animation moves. Center motion alone reports no axis:
    /// programmatic pans aren't drags.
    pub(crate) fn axes(&self) -> Axes {
        let changed = |a: f64, b: f64| (a - b).abs() > CHANGE_EPSILON;
        let arcs = matches!(self.motion, Motion::Flight { path } if !path.is_degenerate());
        Axes {
            pan: false,
            zoom: changed(self.from.zoom, self.to.zoom) || arcs,
            rotate: shortest_angle_delta(self.from.bearing, self.to.bearing).abs() > CHANGE_EPSILON,
            pitch: changed(self.from.pitch, self.to.pitch),
            roll: shortest_angle_delta(self.from.roll, self.to.roll).abs() > CHANGE_EPSILON,
        }
    }

    pub(crate) fn token(&self) -> &AnimationToken {
        &self.token
    }

    pub(crate) fn duration(&self) -> Duration {
        self.duration
    }

    /// Pose the animation ends at.
    pub(crate) fn target(&self) -> &Pose {
        &self.to
    }

    /// Advance by `dt` and apply the new pose. Returns `true` once the
    /// animation has reached its end pose.
    pub(crate) fn step(&mut self, transform: &mut Transform, dt: Duration) -> bool {
        self.elapsed = self.elapsed.saturating_add(dt);
        let k = if self.duration.is_zero() {
            1.0
        } else {
            (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
        };
        let e = self.easing.evaluate(k);

        match self.motion {
            Motion::Ease { anchor } => {
                if k >= 1.0 && anchor.is_none() {
                    transform.set_pose(&self.to);
                    return true;
                }
                let mut pose = self.lerped(e);
                if anchor.is_some() {
                    pose.center = transform.center();
                }
                transform.set_pose(&pose);
                if let Some(anchor) = anchor {
                    if let Some(now) = transform.ground_from_screen(anchor.point) {
                        let drift = anchor.ground.to_vec2() - now.to_vec2();
                        transform.adjust_center_by_ground_delta(drift * anchor.tightness);
                    }
                }
                k >= 1.0
            }
            Motion::Flight { path } => {
                if k >= 1.0 {
                    transform.set_pose(&self.to);
                    return true;
                }
                let mut pose = self.lerped(e);
                if !path.is_degenerate() {
                    let s = path.arc_length() * e;
                    pose.zoom = self.from.zoom + path.zoom_delta(s);
                    pose.center = self.center_at(path.progress(s));
                }
                transform.set_pose(&pose);
                false
            }
            Motion::ScreenSpeed {
                speed,
                travelled,
                total,
                cap,
            } => {
                let capped = cap.is_some_and(|c| self.elapsed >= c);
                let mut pose = self.lerped(e);
                let scale = zoom_scale(pose.zoom);
                let travelled = (travelled + speed * dt.as_secs_f64() / scale).min(total);
                self.motion = Motion::ScreenSpeed {
                    speed,
                    travelled,
                    total,
                    cap,
                };
                let done = capped || (k >= 1.0 && travelled >= total);
                if done {
                    transform.set_pose(&self.to);
                    return true;
                }
                let fraction = if total > 0.0 { travelled / total } else { 1.0 };
                pose.center = self.center_at(fraction);
                transform.set_pose(&pose);
                false
            }
        }
    }

    /// `from` → `to` at eased fraction `e`; bearing and roll take the
    /// short way round.
    fn lerped(&self, e: f64) -> Pose {
        let (a, b) = (&self.from, &self.to);
        Pose {
            center: a.center.lerp(b.center, e),
            zoom: lerp(a.zoom, b.zoom, e),
            bearing: a.bearing + shortest_angle_delta(a.bearing, b.bearing) * e,
            pitch: lerp(a.pitch, b.pitch, e),
            roll: a.roll + shortest_angle_delta(a.roll, b.roll) * e,
            padding: a.padding.lerp(&b.padding, e),
        }
    }

    /// Point `fraction` of the way along the straight ground path, with
    /// the elevation interpolated alongside.
    fn center_at(&self, fraction: f64) -> DVec3 {
        let up = self.up_axis;
        let g0 = ground(up, self.from.center);
        let g1 = ground(up, self.to.center);
        let g = g0 + (g1 - g0) * fraction;
        let elevation = lerp(up.elevation(self.from.center), up.elevation(self.to.center), fraction);
        up.from_ground(GroundPoint::from(g), elevation)
    }
}

fn ground(up_axis: UpAxis, p: DVec3) -> DVec2 {
    up_axis.to_ground(p).to_vec2()
}

/// Seconds a turn needs at `speed` degrees per second.
fn angular_seconds(from: &Pose, to: &Pose, speed: f64) -> f64 {
    if !(speed.is_finite() && speed > 0.0) {
        return 0.0;
    }
    let turn = shortest_angle_delta(from.bearing, to.bearing)
        .abs()
        .max((to.pitch - from.pitch).abs())
        .max(shortest_angle_delta(from.roll, to.roll).abs());
    turn / speed
}

/// Explicit duration, else the longer of travel and turn time; then capped.
fn resolve_duration(
    explicit: Option<Duration>,
    travel_secs: f64,
    turn_secs: f64,
    max: Option<Duration>,
) -> Duration {
    let duration = explicit.unwrap_or_else(|| {
        let secs = travel_secs.max(turn_secs);
        if secs.is_finite() && secs > 0.0 {
            Duration::from_secs_f64(secs)
        } else {
            Duration::ZERO
        }
    });
    max.map_or(duration, |m| duration.min(m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{Camera, Constraints};

    fn transform() -> Transform {
        Transform::new(
            Camera::perspective(36.87, 1.0, 0.1, 1000.0),
            Viewport::new(800.0, 600.0),
            UpAxis::Y,
            Constraints::default(),
        )
    }

    fn params() -> FlightParams {
        FlightParams {
            curve: 1.42,
            speed: 1.2,
            angular_speed: 180.0,
            duration: None,
            max_duration: None,
            min_zoom: None,
            easing: EasingFunction::DEFAULT,
        }
    }

    fn run(anim: &mut CameraAnimation, t: &mut Transform, frames: usize) -> bool {
        (0..frames).any(|_| anim.step(t, Duration::from_millis(16)))
    }

    #[test]
    fn ease_lands_exactly_on_target() {
        let mut t = transform();
        let from = t.pose();
        let to = Pose {
            center: DVec3::new(10.0, 0.0, -4.0),
            zoom: 3.0,
            bearing: 170.0,
            pitch: 30.0,
            ..from
        };
        let mut anim = CameraAnimation::ease(
            from,
            to,
            UpAxis::Y,
            Duration::from_millis(300),
            EasingFunction::DEFAULT,
            None,
            AnimationToken::new(),
        );
        assert!(!anim.step(&mut t, Duration::from_millis(100)));
        assert!(t.zoom() > 0.0 && t.zoom() < 3.0);
        assert!(run(&mut anim, &mut t, 20));
        assert_eq!(t.pose(), to);
    }

    #[test]
    fn ease_takes_the_short_way_round() {
        let mut t = transform();
        t.set_bearing(170.0);
        let from = t.pose();
        let to = Pose { bearing: -170.0, ..from };
        let mut anim = CameraAnimation::ease(
            from,
            to,
            UpAxis::Y,
            Duration::from_millis(200),
            EasingFunction::Linear,
            None,
            AnimationToken::new(),
        );
        let _ = anim.step(&mut t, Duration::from_millis(100));
        assert!((t.bearing() - 180.0).abs() < 1e-9, "{}", t.bearing());
    }

    #[test]
    fn anchored_ease_holds_the_ground_point() {
        let mut t = transform();
        t.defer_apply(|t| {
            t.set_zoom(3.0);
            t.set_pitch(40.0);
        });
        let point = DVec2::new(620.0, 410.0);
        let ground = t.ground_from_screen(point).unwrap();
        let from = t.pose();
        let to = Pose {
            zoom: 5.0,
            bearing: 60.0,
            ..from
        };
        let anchor = Anchor {
            point,
            ground,
            tightness: 1.0,
        };
        let mut anim = CameraAnimation::ease(
            from,
            to,
            UpAxis::Y,
            Duration::from_millis(250),
            EasingFunction::DEFAULT,
            Some(anchor),
            AnimationToken::new(),
        );
        let world = t.up_axis().from_ground(ground, 0.0);
        for _ in 0..20 {
            let done = anim.step(&mut t, Duration::from_millis(16));
            assert!((t.world_to_screen(world) - point).length() < 1.0);
            if done {
                break;
            }
        }
        assert!((t.zoom() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn flight_zooms_out_mid_way_and_arrives() {
        let mut t = transform();
        t.set_zoom(8.0);
        let from = t.pose();
        let to = Pose {
            center: DVec3::new(2.0, 0.0, 0.0),
            ..from
        };
        let mut anim = CameraAnimation::flight(
            from,
            to,
            UpAxis::Y,
            t.viewport(),
            &params(),
            AnimationToken::new(),
        );
        assert!(anim.axes().zoom);
        assert!(!anim.axes().pan);
        let half = anim.duration() / 2;
        let _ = anim.step(&mut t, half);
        assert!(t.zoom() < 8.0);
        assert!(run(&mut anim, &mut t, 1000));
        assert_eq!(t.center(), to.center);
        assert_eq!(t.zoom(), 8.0);
    }

    #[test]
    fn slow_turns_stretch_short_flights() {
        let t = transform();
        let from = t.pose();
        let to = Pose {
            bearing: 90.0,
            center: DVec3::new(0.001, 0.0, 0.0),
            ..from
        };
        let p = FlightParams {
            angular_speed: 45.0,
            ..params()
        };
        let anim = CameraAnimation::flight(from, to, UpAxis::Y, t.viewport(), &p, AnimationToken::new());
        assert!(anim.duration() >= Duration::from_millis(1999));
        let capped = FlightParams {
            max_duration: Some(Duration::from_millis(500)),
            ..p
        };
        let anim = CameraAnimation::flight(from, to, UpAxis::Y, t.viewport(), &capped, AnimationToken::new());
        assert_eq!(anim.duration(), Duration::from_millis(500));
    }

    #[test]
    fn screen_speed_needs_both_time_and_distance() {
        let mut t = transform();
        t.set_zoom(4.0);
        let from = t.pose();
        let to = Pose {
            center: DVec3::new(100.0 / 16.0, 0.0, 0.0),
            ..from
        };
        let p = FlightParams {
            duration: Some(Duration::from_millis(100)),
            ..params()
        };
        // 100 px at 200 px/s takes 500 ms even though the time is up at 100
        let mut anim = CameraAnimation::screen_speed(from, to, UpAxis::Y, 200.0, &p, AnimationToken::new());
        assert!(!anim.step(&mut t, Duration::from_millis(200)));
        assert!((t.center().x - 2.5).abs() < 1e-9);
        assert!(!anim.step(&mut t, Duration::from_millis(200)));
        assert!(anim.step(&mut t, Duration::from_millis(200)));
        assert_eq!(t.center(), to.center);
    }
}
