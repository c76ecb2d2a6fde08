//! Closed-form "fly to" path (van Wijk & Nuij, *Smooth and efficient zooming
//! and panning*).
//!
//! The camera zooms out while travelling and back in on arrival, so the
//! apparent speed stays roughly constant. Widths and distances are in
//! screen pixels measured at the start zoom.

use crate::util::math::scale_zoom;

/// Ground distances below this are treated as "no travel".
const DEGENERATE_DISTANCE: f64 = 1e-9;

/// Solved hyperbolic path between two views.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightPath {
    w0: f64,
    w1: f64,
    u1: f64,
    rho: f64,
    b: f64,
    r0: f64,
    r1: f64,
    arc_length: f64,
}

impl FlightPath {
    /// Solve the path.
    ///
    /// - `w0`, `w1`: visible width at the start and end (pixels at start
    ///   zoom; `w1 = w0 / 2^(z1 - z0)`)
    /// - `u1`: ground distance between the centers, pixels at start zoom
    /// - `rho`: curvature; larger values zoom out further mid-flight
    #[must_use]
    pub fn new(w0: f64, w1: f64, u1: f64, rho: f64) -> Self {
        let rho = if rho.is_finite() && rho > 0.0 { rho } else { 1.42 };
        let degenerate = Self {
            w0,
            w1,
            u1,
            rho,
            b: 0.0,
            r0: 0.0,
            r1: 0.0,
            arc_length: 0.0,
        };

        let travels = u1 >= DEGENERATE_DISTANCE && w0 > 0.0 && w1 > 0.0;
        if !travels {
            return degenerate;
        }

        let rho2 = rho * rho;
        let b_at = |end: bool| {
            let (wi, sign) = if end { (w1, -1.0) } else { (w0, 1.0) };
            (w1 * w1 - w0 * w0 + sign * rho2 * rho2 * u1 * u1)
                / (2.0 * wi * rho2 * u1)
        };
        let r_at = |b: f64| ((b * b + 1.0).sqrt() - b).ln();

        let b = b_at(false);
        let r0 = r_at(b);
        let r1 = r_at(b_at(true));
        let arc_length = (r1 - r0) / rho;

        if !arc_length.is_finite() || arc_length < 0.0 {
            log::debug!(
                "flight path degenerate (w0={w0}, w1={w1}, u1={u1}); easing instead"
            );
            return degenerate;
        }

        Self {
            w0,
            w1,
            u1,
            rho,
            b,
            r0,
            r1,
            arc_length,
        }
    }

    /// Total arclength `S`. Zero for a degenerate (pure ease) path.
    #[inline]
    #[must_use]
    pub fn arc_length(&self) -> f64 {
        self.arc_length
    }

    /// Whether the path collapsed to a plain ease (no ground travel).
    #[inline]
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.arc_length == 0.0
    }

    /// The solved `(b, r0, r1, S)` parameters.
    #[must_use]
    pub fn parameters(&self) -> (f64, f64, f64, f64) {
        (self.b, self.r0, self.r1, self.arc_length)
    }

    /// Visible width at arclength `s`. `width(0) == w0`.
    #[must_use]
    pub fn width(&self, s: f64) -> f64 {
        if self.is_degenerate() {
            return self.w0;
        }
        self.w0 * (self.r0.cosh() / (self.r0 + self.rho * s).cosh())
    }

    /// Ground pixels travelled at arclength `s`. `u(S) ≈ u1`.
    #[must_use]
    pub fn distance(&self, s: f64) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        let rho2 = self.rho * self.rho;
        self.w0
            * (self.r0.cosh() * (self.r0 + self.rho * s).tanh()
                - self.r0.sinh())
            / rho2
    }

    /// Fraction of the straight-line center path covered at `s`.
    #[must_use]
    pub fn progress(&self, s: f64) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        self.distance(s) / self.u1
    }

    /// Zoom offset from the start zoom at arclength `s`.
    #[must_use]
    pub fn zoom_delta(&self, s: f64) -> f64 {
        scale_zoom(self.w0 / self.width(s))
    }

    /// End width this path was solved for.
    #[inline]
    #[must_use]
    pub fn end_width(&self) -> f64 {
        self.w1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RHO: f64 = 1.42;

    #[test]
    fn width_starts_exactly_at_w0() {
        for (w0, w1, u1) in [(800.0, 800.0, 100.0), (600.0, 37.5, 2.0e5)] {
            let path = FlightPath::new(w0, w1, u1, RHO);
            assert_eq!(path.width(0.0), w0);
            assert!(path.distance(0.0).abs() < 1e-6);
        }
    }

    #[test]
    fn distance_reaches_u1_at_the_end() {
        let cases = [
            (800.0, 800.0, 100.0),
            (800.0, 200.0, 5000.0),
            (800.0, 3200.0, 1.0e6),
            (600.0, 600.0 / 1024.0, 1.0e5),
        ];
        for (w0, w1, u1) in cases {
            let path = FlightPath::new(w0, w1, u1, RHO);
            let end = path.distance(path.arc_length());
            assert!(((end - u1) / u1).abs() < 0.05, "{w0} {w1} {u1}: {end}");
            let width_err = (path.width(path.arc_length()) - w1) / w1;
            assert!(width_err.abs() < 0.05);
        }
    }

    #[test]
    fn arclength_grows_with_distance() {
        let mut last = 0.0;
        for u1 in [10.0, 100.0, 1000.0, 1.0e4, 1.0e5, 1.0e6] {
            let s = FlightPath::new(800.0, 400.0, u1, RHO).arc_length();
            assert!(s > last, "S({u1}) = {s} not above {last}");
            last = s;
        }
    }

    #[test]
    fn zero_distance_is_a_pure_ease() {
        let path = FlightPath::new(800.0, 100.0, 0.0, RHO);
        assert!(path.is_degenerate());
        assert_eq!(path.arc_length(), 0.0);
        assert_eq!(path.progress(1.0), 0.0);
        assert_eq!(path.zoom_delta(0.0), 0.0);
    }

    #[test]
    fn mid_flight_zooms_out() {
        let path = FlightPath::new(800.0, 800.0, 1.0e5, RHO);
        let mid = path.arc_length() / 2.0;
        assert!(path.width(mid) > 800.0);
        assert!(path.zoom_delta(mid) < 0.0);
    }
}
