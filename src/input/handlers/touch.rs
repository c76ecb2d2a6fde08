//! One- and two-finger touch navigation.
//!
//! A single finger pans. Two fingers start in [`TouchMode::Idle`] and lock
//! into whichever gesture first crosses its threshold:
//!
//! - **pitch**: both fingers travel vertically, in the same direction, by
//!   at least `pitch_displacement_px`, and the second finger landed within
//!   `allowed_single_touch_ms` of the first (a second finger arriving
//!   mid-pan is not a tilt);
//! - **zoom/rotate**: the finger distance or angle changes past
//!   `zoom_threshold` / `rotation_threshold_deg`;
//! - **pan**: the centroid travels past `pan_threshold_px` while no pitch
//!   is possible.
//!
//! Zoom/rotate and pitch re-evaluate every frame; pan stays locked until
//! every finger lifts. While zooming/rotating, the reference pair moves up
//! each time the pinch crosses its threshold again, so a pinch that turns
//! into a same-direction vertical slide switches to pitch.

use std::rc::Rc;

use glam::DVec2;
use web_time::{Duration, Instant};

use super::{decay, drag_ground, Binding, GestureHandler, HandlerContext, VelocitySampler};
use crate::events::Axes;
use crate::input::event::{InputEvent, PointerKind};
use crate::options::TouchOptions;
use crate::surface::Surface;
use crate::util::math::{clamp, normalize_angle_deg, scale_zoom};

/// Low-pass factor for the zoom and rotate velocity estimates.
const VELOCITY_SMOOTHING: f64 = 0.3;
/// Glides stop below these speeds.
const MIN_PAN_SPEED: f64 = 20.0;
const MIN_ZOOM_SPEED: f64 = 0.05;
const MIN_ROTATE_SPEED: f64 = 2.0;
/// Per-move finger motion below this (pixels) doesn't count as a pitch signal.
const PITCH_MOVE_MIN_PX: f64 = 1.0;

/// Gesture a multi-touch interaction has locked into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TouchMode {
    /// Fingers down, nothing recognized yet.
    #[default]
    Idle,
    /// Ground follows the finger centroid.
    Pan,
    /// Pinch zoom and twist rotate around the centroid.
    ZoomRotate,
    /// Two-finger vertical tilt.
    Pitch,
}

#[derive(Debug, Clone, Copy)]
struct Touch {
    id: u64,
    position: DVec2,
    start: DVec2,
    /// Most recent movement of this finger.
    delta: DVec2,
}

/// Two-finger reference measurements.
#[derive(Debug, Clone, Copy, Default)]
struct Pair {
    centroid: DVec2,
    distance: f64,
    angle: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Glide {
    pan: DVec2,
    zoom: f64,
    rotate: f64,
    anchor: DVec2,
}

impl Glide {
    fn is_moving(&self) -> bool {
        self.pan != DVec2::ZERO || self.zoom != 0.0 || self.rotate != 0.0
    }
}

/// Touch gesture handler.
pub struct TouchHandler {
    options: TouchOptions,
    binding: Binding,
    touches: Vec<Touch>,
    mode: TouchMode,
    first_down: Option<Instant>,
    second_down: Option<Instant>,
    start: Pair,
    prev: Pair,
    /// Reference measurements for switching between zoom/rotate and pitch:
    /// taken when the mode locked in, and again at every threshold-sized
    /// pinch step while zooming/rotating.
    locked: Pair,
    last_move: Option<Instant>,
    pan_sampler: VelocitySampler,
    zoom_velocity: f64,
    rotate_velocity: f64,
    glide: Glide,
}

impl TouchHandler {
    /// Handler with the given options (not yet enabled).
    #[must_use]
    pub fn new(options: TouchOptions) -> Self {
        let window = Duration::from_millis(options.inertia_window_ms);
        Self {
            options,
            binding: Binding::default(),
            touches: Vec::new(),
            mode: TouchMode::Idle,
            first_down: None,
            second_down: None,
            start: Pair::default(),
            prev: Pair::default(),
            locked: Pair::default(),
            last_move: None,
            pan_sampler: VelocitySampler::new(window),
            zoom_velocity: 0.0,
            rotate_velocity: 0.0,
            glide: Glide::default(),
        }
    }

    /// Current options.
    #[must_use]
    pub fn options(&self) -> &TouchOptions {
        &self.options
    }

    /// Gesture the current interaction is locked into.
    #[must_use]
    pub fn mode(&self) -> TouchMode {
        self.mode
    }

    /// Number of fingers down.
    #[must_use]
    pub fn touch_count(&self) -> usize {
        self.touches.len()
    }

    fn measure(&self) -> Pair {
        let n = self.touches.len().max(1) as f64;
        let centroid = self.touches.iter().map(|t| t.position).sum::<DVec2>() / n;
        match self.touches.as_slice() {
            [a, b, ..] => {
                let v = b.position - a.position;
                Pair {
                    centroid,
                    distance: v.length(),
                    angle: v.y.atan2(v.x).to_degrees(),
                }
            }
            _ => Pair {
                centroid,
                ..Pair::default()
            },
        }
    }

    /// Restart measurements from the current finger positions.
    fn rebase(&mut self) {
        for touch in &mut self.touches {
            touch.start = touch.position;
            touch.delta = DVec2::ZERO;
        }
        self.start = self.measure();
        self.prev = self.start;
        self.locked = self.start;
    }

    /// Both leading fingers moving vertically in the same direction, each
    /// by at least `min` pixels of `delta`.
    fn vertical_same_direction(&self, delta: impl Fn(&Touch) -> DVec2, min: f64) -> bool {
        let [a, b, ..] = self.touches.as_slice() else {
            return false;
        };
        let (da, db) = (delta(a), delta(b));
        let vertical = |d: DVec2| d.y.abs() >= min && d.y.abs() > d.x.abs();
        vertical(da) && vertical(db) && da.y.signum() == db.y.signum()
    }

    fn within_single_touch_window(&self) -> bool {
        match (self.first_down, self.second_down) {
            (Some(first), Some(second)) => {
                second.saturating_duration_since(first)
                    <= Duration::from_millis(self.options.allowed_single_touch_ms)
            }
            _ => false,
        }
    }

    /// Pick a mode for a two-finger interaction still in `Idle`.
    fn recognize(&self, now: &Pair) -> TouchMode {
        let opts = &self.options;
        let pitch_possible = opts.pitch
            && self.within_single_touch_window()
            && self.vertical_same_direction(|t| t.position - t.start, 0.0);
        if pitch_possible
            && self.vertical_same_direction(|t| t.position - t.start, opts.pitch_displacement_px)
        {
            return TouchMode::Pitch;
        }

        if self.pinched_since(&self.start, now) {
            return TouchMode::ZoomRotate;
        }

        let travelled = now.centroid.distance(self.start.centroid);
        if opts.pan && !pitch_possible && travelled >= opts.pan_threshold_px {
            return TouchMode::Pan;
        }
        TouchMode::Idle
    }

    /// Pinch or twist since `from` past the recognition thresholds.
    fn pinched_since(&self, from: &Pair, now: &Pair) -> bool {
        let zoomed = self.options.zoom
            && from.distance > 0.0
            && scale_zoom(now.distance / from.distance).abs() >= self.options.zoom_threshold;
        let rotated = self.options.rotate
            && normalize_angle_deg(now.angle - from.angle).abs()
                >= self.options.rotation_threshold_deg;
        zoomed || rotated
    }

    /// Switch between zoom/rotate and pitch as the fingers change course.
    fn reevaluate(&self, now: &Pair) -> TouchMode {
        match self.mode {
            TouchMode::ZoomRotate
                if self.options.pitch
                    && !self.pinched_since(&self.locked, now)
                    && self.vertical_same_direction(|t| t.delta, PITCH_MOVE_MIN_PX)
                    && (now.centroid.y - self.locked.centroid.y).abs()
                        >= self.options.pitch_displacement_px =>
            {
                TouchMode::Pitch
            }
            TouchMode::Pitch if self.pinched_since(&self.locked, now) => TouchMode::ZoomRotate,
            mode => mode,
        }
    }

    fn track_velocity(&mut self, now: Instant, pan: DVec2, zoom: f64, rotate: f64) {
        let dt = self
            .last_move
            .map_or(1.0 / 60.0, |t| now.saturating_duration_since(t).as_secs_f64())
            .max(1.0 / 240.0);
        self.last_move = Some(now);
        self.pan_sampler.push(now, pan);
        let a = VELOCITY_SMOOTHING;
        self.zoom_velocity = a * (zoom / dt) + (1.0 - a) * self.zoom_velocity;
        self.rotate_velocity = a * (rotate / dt) + (1.0 - a) * self.rotate_velocity;
    }

    fn update(&mut self, event: &InputEvent, moved: DVec2, ctx: &mut HandlerContext<'_>) -> bool {
        let now = self.measure();
        let tightness = clamp(self.options.anchor_tightness, 0.0, 1.0);
        let was = self.mode;

        if self.mode == TouchMode::Idle {
            self.mode = if self.touches.len() == 1 {
                let travelled = now.centroid.distance(self.start.centroid);
                if self.options.pan && travelled >= self.options.pan_threshold_px {
                    TouchMode::Pan
                } else {
                    TouchMode::Idle
                }
            } else {
                self.recognize(&now)
            };
            if self.mode != TouchMode::Idle {
                log::debug!("touch gesture locked to {:?}", self.mode);
            }
        } else if self.touches.len() >= 2 {
            self.mode = self.reevaluate(&now);
        }
        if self.mode != was && matches!(self.mode, TouchMode::ZoomRotate | TouchMode::Pitch) {
            self.locked = now;
        } else if self.mode == TouchMode::ZoomRotate && self.pinched_since(&self.locked, &now) {
            self.locked = now;
        }

        let prev = self.prev;
        let mut axes = Axes::NONE;
        let mut pan = DVec2::ZERO;
        let (mut dz, mut db) = (0.0, 0.0);

        match self.mode {
            TouchMode::Idle => {}
            TouchMode::Pan => {
                pan = now.centroid - prev.centroid;
                if pan != DVec2::ZERO {
                    drag_ground(ctx, prev.centroid, now.centroid, 1.0);
                    axes.pan = true;
                }
            }
            TouchMode::ZoomRotate => {
                if self.options.zoom && prev.distance > 0.0 && now.distance > 0.0 {
                    dz = scale_zoom(now.distance / prev.distance);
                }
                if self.options.rotate {
                    db = -normalize_angle_deg(now.angle - prev.angle);
                }
                pan = now.centroid - prev.centroid;
                let before = ctx.transform.pose();
                let grab = ctx.transform.ground_from_screen(prev.centroid);
                ctx.helper.roll_pitch_bearing_zoom(ctx.transform, 0.0, 0.0, db, dz);
                match (grab, ctx.transform.ground_from_screen(now.centroid)) {
                    (Some(g), Some(h)) => ctx
                        .transform
                        .adjust_center_by_ground_delta((g.to_vec2() - h.to_vec2()) * tightness),
                    _ => ctx.helper.pan(ctx.transform, prev.centroid - now.centroid),
                }
                let after = ctx.transform.pose();
                axes.zoom = after.zoom != before.zoom;
                axes.rotate = after.bearing != before.bearing;
                axes.pan = pan != DVec2::ZERO;
            }
            TouchMode::Pitch => {
                // each finger's move contributes half of the average slide
                let d_pitch = -moved.y * 0.5 * self.options.pitch_degrees_per_px;
                let before = ctx.transform.pitch();
                let helper = ctx.helper;
                let _ = ctx.transform.anchored(now.centroid, tightness, |t| {
                    helper.roll_pitch_bearing_zoom(t, 0.0, d_pitch, 0.0, 0.0);
                });
                axes.pitch = ctx.transform.pitch() != before;
            }
        }

        if matches!(self.mode, TouchMode::Pan | TouchMode::ZoomRotate) {
            self.track_velocity(ctx.now, pan, dz, db);
        }
        self.prev = now;
        ctx.emit(axes, Some(event));
        self.mode != TouchMode::Idle
    }

    fn release(&mut self, id: u64, now: Instant) -> bool {
        let Some(index) = self.touches.iter().position(|t| t.id == id) else {
            return false;
        };
        let _ = self.touches.remove(index);
        let was = self.mode;

        if self.touches.is_empty() {
            if self.options.inertia && matches!(was, TouchMode::Pan | TouchMode::ZoomRotate) {
                let mut glide = Glide {
                    pan: self.pan_sampler.velocity(now),
                    anchor: self.prev.centroid,
                    ..Glide::default()
                };
                if glide.pan.length() < MIN_PAN_SPEED {
                    glide.pan = DVec2::ZERO;
                }
                let recent = self
                    .last_move
                    .is_some_and(|t| now.saturating_duration_since(t) <= self.pan_sampler_window());
                if was == TouchMode::ZoomRotate && recent {
                    if self.zoom_velocity.abs() >= MIN_ZOOM_SPEED {
                        glide.zoom = self.zoom_velocity;
                    }
                    if self.rotate_velocity.abs() >= MIN_ROTATE_SPEED {
                        glide.rotate = self.rotate_velocity;
                    }
                }
                self.glide = glide;
            }
            self.reset_gesture();
        } else {
            if self.touches.len() == 1 && matches!(was, TouchMode::ZoomRotate | TouchMode::Pitch) {
                self.mode = if self.options.pan {
                    TouchMode::Pan
                } else {
                    TouchMode::Idle
                };
            }
            self.rebase();
            self.pan_sampler.clear();
        }
        was != TouchMode::Idle
    }

    fn pan_sampler_window(&self) -> Duration {
        Duration::from_millis(self.options.inertia_window_ms)
    }

    fn reset_gesture(&mut self) {
        self.touches.clear();
        self.mode = TouchMode::Idle;
        self.first_down = None;
        self.second_down = None;
        self.last_move = None;
        self.pan_sampler.clear();
        self.zoom_velocity = 0.0;
        self.rotate_velocity = 0.0;
    }
}

impl GestureHandler for TouchHandler {
    fn name(&self) -> &'static str {
        "touch"
    }

    fn enable(&mut self, surface: Option<&Rc<dyn Surface>>) {
        if self.binding.bind(surface) {
            log::debug!("touch enabled");
        }
    }

    fn disable(&mut self) {
        self.stop();
        self.binding.unbind();
    }

    fn is_enabled(&self) -> bool {
        self.binding.is_bound()
    }

    fn is_active(&self) -> bool {
        !self.touches.is_empty() && self.mode != TouchMode::Idle
    }

    fn is_animating(&self) -> bool {
        self.glide.is_moving()
    }

    fn handle_event(
        &mut self,
        event: &InputEvent,
        ctx: &mut HandlerContext<'_>,
    ) -> bool {
        if !self.is_enabled() {
            return false;
        }
        match *event {
            InputEvent::PointerDown {
                id,
                kind: PointerKind::Touch,
                position,
                ..
            } => {
                self.glide = Glide::default();
                if self.touches.is_empty() {
                    self.first_down = Some(ctx.now);
                    self.mode = TouchMode::Idle;
                }
                self.touches.retain(|t| t.id != id);
                self.touches.push(Touch {
                    id,
                    position,
                    start: position,
                    delta: DVec2::ZERO,
                });
                if self.touches.len() == 2 {
                    self.second_down = Some(ctx.now);
                }
                self.rebase();
                self.pan_sampler.clear();
                true
            }
            InputEvent::PointerMove {
                id,
                kind: PointerKind::Touch,
                position,
                ..
            } => {
                let Some(touch) = self.touches.iter_mut().find(|t| t.id == id) else {
                    return false;
                };
                let moved = position - touch.position;
                touch.delta = moved;
                touch.position = position;
                self.update(event, moved, ctx)
            }
            InputEvent::PointerUp {
                id,
                kind: PointerKind::Touch,
                ..
            }
            | InputEvent::PointerCancel {
                id,
                kind: PointerKind::Touch,
            } => self.release(id, ctx.now),
            _ => false,
        }
    }

    fn tick(&mut self, ctx: &mut HandlerContext<'_>) {
        if !self.glide.is_moving() || ctx.dt.is_zero() {
            return;
        }
        let dt = ctx.dt.as_secs_f64();
        let g = self.glide;
        let mut axes = Axes::NONE;

        if g.pan != DVec2::ZERO {
            drag_ground(ctx, g.anchor, g.anchor + g.pan * dt, 1.0);
            axes.pan = true;
        }
        if g.zoom != 0.0 || g.rotate != 0.0 {
            let helper = ctx.helper;
            let tightness = self.options.anchor_tightness;
            let _ = ctx.transform.anchored(g.anchor, tightness, |t| {
                helper.roll_pitch_bearing_zoom(t, 0.0, 0.0, g.rotate * dt, g.zoom * dt);
            });
            axes.zoom = g.zoom != 0.0;
            axes.rotate = g.rotate != 0.0;
        }

        let glide = &mut self.glide;
        glide.pan *= decay(self.options.pan_friction, ctx.dt);
        glide.zoom *= decay(self.options.zoom_friction, ctx.dt);
        glide.rotate *= decay(self.options.rotate_friction, ctx.dt);
        if glide.pan.length() < MIN_PAN_SPEED {
            glide.pan = DVec2::ZERO;
        }
        if glide.zoom.abs() < MIN_ZOOM_SPEED {
            glide.zoom = 0.0;
        }
        if glide.rotate.abs() < MIN_ROTATE_SPEED {
            glide.rotate = 0.0;
        }
        ctx.emit(axes, None);
    }

    fn stop(&mut self) {
        self.reset_gesture();
        self.glide = Glide::default();
    }
}
