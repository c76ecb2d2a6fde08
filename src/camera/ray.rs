//! Ray and plane primitives for screen → ground picking.

use glam::DVec3;

/// |n · d| below this counts as a ray grazing the plane.
const GRAZING_EPSILON: f64 = 1e-6;

/// A plane in 3D space: `normal · p + distance = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal pointing into the positive half-space.
    pub normal: DVec3,
    /// Signed distance from origin (`n · p + d = 0`).
    pub distance: f64,
}

impl Plane {
    /// Plane through `point` with the given normal (normalized here).
    #[must_use]
    pub fn from_normal_and_point(normal: DVec3, point: DVec3) -> Self {
        let normal = normal.normalize_or_zero();
        Self {
            normal,
            distance: -normal.dot(point),
        }
    }

    /// Signed distance from point to plane (positive = in front, negative =
    /// behind)
    #[inline]
    #[must_use]
    pub fn distance_to_point(&self, point: DVec3) -> f64 {
        self.normal.dot(point) + self.distance
    }
}

/// Half-line from `origin` along a unit `direction`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start point.
    pub origin: DVec3,
    /// Unit direction.
    pub direction: DVec3,
}

impl Ray {
    /// Ray from an origin and a (not necessarily unit) direction.
    #[must_use]
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Point at parameter `t` along the ray.
    #[inline]
    #[must_use]
    pub fn at(&self, t: f64) -> DVec3 {
        self.origin + self.direction * t
    }

    /// Parameter at which the ray meets `plane`, or `None` when the ray runs
    /// parallel to it (or nearly so) or points away from it.
    #[must_use]
    pub fn distance_to_plane(&self, plane: &Plane) -> Option<f64> {
        let denom = plane.normal.dot(self.direction);
        if denom.abs() < GRAZING_EPSILON {
            return None;
        }
        let t = -plane.distance_to_point(self.origin) / denom;
        (t >= 0.0 && t.is_finite()).then_some(t)
    }

    /// Intersection point with `plane`, if any.
    #[must_use]
    pub fn intersect_plane(&self, plane: &Plane) -> Option<DVec3> {
        self.distance_to_plane(plane).map(|t| self.at(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hits_ground_from_above() {
        let ground = Plane::from_normal_and_point(DVec3::Y, DVec3::ZERO);
        let ray = Ray::new(DVec3::new(1.0, 10.0, 0.0), DVec3::new(0.0, -1.0, 1.0));
        let hit = ray.intersect_plane(&ground).unwrap();
        assert!((hit - DVec3::new(1.0, 0.0, 10.0)).length() < 1e-12);
    }

    #[test]
    fn parallel_and_receding_rays_miss() {
        let ground = Plane::from_normal_and_point(DVec3::Z, DVec3::ZERO);
        let parallel = Ray::new(DVec3::new(0.0, 0.0, 5.0), DVec3::X);
        assert!(parallel.intersect_plane(&ground).is_none());
        let receding = Ray::new(DVec3::new(0.0, 0.0, 5.0), DVec3::Z);
        assert!(receding.intersect_plane(&ground).is_none());
    }

    #[test]
    fn signed_distance() {
        let plane = Plane::from_normal_and_point(DVec3::Y * 2.0, DVec3::new(0.0, 3.0, 0.0));
        assert_eq!(plane.distance_to_point(DVec3::new(7.0, 5.0, 1.0)), 2.0);
        assert_eq!(plane.distance_to_point(DVec3::new(0.0, 1.0, 0.0)), -2.0);
    }
}
