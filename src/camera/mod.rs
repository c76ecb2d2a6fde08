//! Camera model: the scene camera, map-style pose types, the transform that
//! places the camera from a pose, and the pose-delta helpers.

/// Scene camera and GPU uniform types.
pub mod core;
/// Pose-delta operators and the fit-bounds solve.
pub mod helper;
/// Pose, viewport, constraint and ground-space value types.
pub mod pose;
/// Ray/plane picking primitives.
pub mod ray;
/// Pose ownership and coordinate conversions.
pub mod transform;

pub use self::core::{Camera, CameraUniform, Projection};
pub use helper::{BoundsCamera, BoundsOptions, CameraHelper, PlanarHelper};
pub use pose::{
    Constraints, GroundBounds, GroundPoint, Padding, Pose, UpAxis, Viewport,
};
pub use ray::{Plane, Ray};
pub use transform::Transform;
