//! Scalar helpers shared by the transform, the gesture handlers and the
//! animation loop.
//!
//! Angles are in degrees unless the name says otherwise. Zoom is a base-2
//! logarithm of the world→pixel scale: zoom 0 maps one world unit to one
//! pixel, every +1 doubles it.

/// Clamp without panicking on inverted bounds.
///
/// `f64::clamp` asserts `min <= max`; option values come from user
/// configuration, so a swapped pair must degrade instead of aborting.
#[inline]
#[must_use]
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Wrap an angle into `(-180, 180]`.
///
/// `-180` maps to `180`. Non-finite input collapses to `0`.
#[must_use]
pub fn normalize_angle_deg(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Signed shortest rotation from `from` to `to`, in `(-180, 180]`.
#[inline]
#[must_use]
pub fn shortest_angle_delta(from: f64, to: f64) -> f64 {
    normalize_angle_deg(to - from)
}

/// World→pixel scale factor for a zoom delta (`2^zoom`).
#[inline]
#[must_use]
pub fn zoom_scale(zoom: f64) -> f64 {
    zoom.exp2()
}

/// Zoom delta for a scale factor (`log2(scale)`).
#[inline]
#[must_use]
pub fn scale_zoom(scale: f64) -> f64 {
    scale.log2()
}

/// Linear interpolation.
#[inline]
#[must_use]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Damping factor applied to a pan delta while the center sits outside the
/// pan bounds: `1 / (1 + overshoot * strength)`.
///
/// Equal to 1 at zero overshoot and strictly decreasing in both arguments.
/// Negative inputs are treated as zero.
#[inline]
#[must_use]
pub fn rubberband_factor(overshoot: f64, strength: f64) -> f64 {
    1.0 / (1.0 + overshoot.max(0.0) * strength.max(0.0))
}

/// Replace a non-finite value with `fallback`.
#[inline]
#[must_use]
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_maps_into_half_open_range() {
        for input in [-900.0, -540.0, -360.0, -181.0, -1.0, 0.0, 179.5, 360.0, 721.0] {
            let out = normalize_angle_deg(input);
            assert!(out > -180.0 && out <= 180.0, "{input} -> {out}");
        }
        assert_eq!(normalize_angle_deg(-180.0), 180.0);
        assert_eq!(normalize_angle_deg(540.0), 180.0);
        assert_eq!(normalize_angle_deg(359.0), -1.0);
        assert_eq!(normalize_angle_deg(f64::NAN), 0.0);
    }

    #[test]
    fn shortest_delta_crosses_the_wrap() {
        assert_eq!(shortest_angle_delta(170.0, -170.0), 20.0);
        assert_eq!(shortest_angle_delta(-170.0, 170.0), -20.0);
        assert_eq!(shortest_angle_delta(0.0, 359.0), -1.0);
    }

    #[test]
    fn zoom_and_scale_are_inverse() {
        for d in [-24.0, -3.0, -0.5, 0.0, 0.25, 1.0, 7.0, 22.0] {
            assert!((scale_zoom(zoom_scale(d)) - d).abs() < 1e-12, "{d}");
        }
        assert_eq!(zoom_scale(1.0), 2.0);
        assert_eq!(scale_zoom(8.0), 3.0);
    }

    #[test]
    fn rubberband_is_one_at_rest_and_decreasing() {
        assert_eq!(rubberband_factor(0.0, 5.0), 1.0);
        assert_eq!(rubberband_factor(3.0, 0.0), 1.0);
        let mut last = 1.0;
        for overshoot in [0.1, 0.5, 1.0, 4.0] {
            let f = rubberband_factor(overshoot, 2.0);
            assert!(f < last);
            last = f;
        }
        assert!(rubberband_factor(1.0, 4.0) < rubberband_factor(1.0, 2.0));
    }

    #[test]
    fn clamp_tolerates_inverted_bounds() {
        assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp(-5.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp(5.0, 10.0, 0.0), 0.0);
    }
}
