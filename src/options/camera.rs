use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::camera::{GroundPoint, Padding, UpAxis, Viewport};

/// Projection used by the controller's camera.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionKind {
    /// Perspective with `fovy`.
    #[default]
    Perspective,
    /// Orthographic, sized so one zoom step halves the visible extent.
    Orthographic,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Camera", inline)]
#[serde(default)]
/// Camera projection and world orientation.
pub struct CameraOptions {
    /// Perspective or orthographic.
    pub projection: ProjectionKind,
    /// Vertical field of view in degrees (perspective only).
    #[schemars(title = "Field of View", range(min = 10.0, max = 120.0), extend("step" = 1.0))]
    pub fovy: f64,
    /// Which world axis points up.
    pub up_axis: UpAxis,
    /// Size used until the surface reports one (and always when headless).
    pub viewport: Viewport,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            projection: ProjectionKind::Perspective,
            fovy: 36.87,
            up_axis: UpAxis::default(),
            viewport: Viewport::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Initial View", inline)]
#[serde(default)]
/// Pose the controller starts in.
pub struct InitialView {
    /// Ground point at the center of the view.
    pub center: GroundPoint,
    /// Zoom level.
    pub zoom: f64,
    /// Bearing, degrees.
    pub bearing: f64,
    /// Pitch, degrees.
    pub pitch: f64,
    /// Roll, degrees.
    pub roll: f64,
    /// View insets.
    pub padding: Padding,
}

impl Default for InitialView {
    fn default() -> Self {
        Self {
            center: GroundPoint::default(),
            zoom: 0.0,
            bearing: 0.0,
            pitch: 0.0,
            roll: 0.0,
            padding: Padding::default(),
        }
    }
}
