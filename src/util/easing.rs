//! Easing functions for camera animation.
//!
//! `ease_to` and `fly_to` map elapsed/duration through one of these curves
//! before interpolating the pose. All curves take and return values in
//! `[0, 1]`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Newton iterations before falling back to bisection in the bezier solve.
const NEWTON_ITERATIONS: usize = 8;
/// Bisection iterations for the bezier fallback.
const BISECTION_ITERATIONS: usize = 40;
/// Accepted |x(t) - x| when solving a bezier for `t`.
const SOLVE_EPSILON: f64 = 1e-7;

/// Easing function variants for animation curves.
#[derive(
    Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema,
)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EasingFunction {
    /// Linear interpolation (no easing).
    Linear,
    /// Quadratic ease-in (slow start, fast end).
    QuadraticIn,
    /// Quadratic ease-out (fast start, slow end).
    QuadraticOut,
    /// Cubic Hermite interpolation with configurable control points.
    /// Formula: c1·3t(1-t)² + c2·3(1-t)t² + t³
    CubicHermite {
        /// First inner control value.
        c1: f64,
        /// Second inner control value.
        c2: f64,
    },
    /// CSS-style `cubic-bezier(x1, y1, x2, y2)` with fixed endpoints at
    /// (0,0) and (1,1).
    CubicBezier {
        /// First control point, x.
        x1: f64,
        /// First control point, y.
        y1: f64,
        /// Second control point, x.
        x2: f64,
        /// Second control point, y.
        y2: f64,
    },
}

impl EasingFunction {
    /// Default curve for camera motion: `cubic-bezier(0.25, 0.1, 0.25, 1)`,
    /// the CSS `ease` curve.
    pub const DEFAULT: EasingFunction = EasingFunction::CubicBezier {
        x1: 0.25,
        y1: 0.1,
        x2: 0.25,
        y2: 1.0,
    };

    /// Build a `cubic-bezier` curve. Control x values are clamped into
    /// `[0, 1]` so the curve stays a function of time.
    #[must_use]
    pub fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::CubicBezier {
            x1: x1.clamp(0.0, 1.0),
            y1,
            x2: x2.clamp(0.0, 1.0),
            y2,
        }
    }

    /// Evaluate the easing function at time t.
    ///
    /// Input t is clamped to [0.0, 1.0].
    #[inline]
    #[must_use]
    pub fn evaluate(&self, t: f64) -> f64 {
        let t = if t.is_nan() { 1.0 } else { t.clamp(0.0, 1.0) };

        match *self {
            EasingFunction::Linear => t,
            EasingFunction::QuadraticIn => t * t,
            EasingFunction::QuadraticOut => {
                let omt = 1.0 - t;
                1.0 - omt * omt
            }
            EasingFunction::CubicHermite { c1, c2 } => {
                let omt = 1.0 - t;
                c1 * 3.0 * t * omt * omt + c2 * 3.0 * omt * t * t + t * t * t
            }
            EasingFunction::CubicBezier { x1, y1, x2, y2 } => {
                // Control points on the diagonal describe the identity.
                if x1 == y1 && x2 == y2 {
                    return t;
                }
                if t == 0.0 || t == 1.0 {
                    return t;
                }
                let u = solve_bezier_parameter(t, x1, x2);
                bezier_component(u, y1, y2)
            }
        }
    }
}

impl Default for EasingFunction {
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// One coordinate of a unit cubic bezier with endpoints 0 and 1.
#[inline]
fn bezier_component(u: f64, p1: f64, p2: f64) -> f64 {
    let omu = 1.0 - u;
    3.0 * omu * omu * u * p1 + 3.0 * omu * u * u * p2 + u * u * u
}

#[inline]
fn bezier_derivative(u: f64, p1: f64, p2: f64) -> f64 {
    let omu = 1.0 - u;
    3.0 * omu * omu * p1 + 6.0 * omu * u * (p2 - p1) + 3.0 * u * u * (1.0 - p2)
}

/// Find the curve parameter whose x coordinate equals `x`.
fn solve_bezier_parameter(x: f64, x1: f64, x2: f64) -> f64 {
    let mut u = x;
    for _ in 0..NEWTON_ITERATIONS {
        let err = bezier_component(u, x1, x2) - x;
        if err.abs() < SOLVE_EPSILON {
            return u;
        }
        let slope = bezier_derivative(u, x1, x2);
        if slope.abs() < 1e-9 {
            break;
        }
        u -= err / slope;
    }

    // x(u) is monotone for control x in [0, 1], so bisection converges.
    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    u = x;
    for _ in 0..BISECTION_ITERATIONS {
        let value = bezier_component(u, x1, x2);
        if (value - x).abs() < SOLVE_EPSILON {
            break;
        }
        if value < x {
            lo = u;
        } else {
            hi = u;
        }
        u = 0.5 * (lo + hi);
    }
    u
}
