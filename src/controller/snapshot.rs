use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::CameraController;
use crate::animation::CameraTarget;
use crate::camera::{Padding, Pose};

/// Serializable copy of the controller's pose, for saving and restoring a
/// view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateSnapshot {
    /// Look-at target.
    pub center: DVec3,
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

impl Default for StateSnapshot {
    fn default() -> Self {
        Pose::default().into()
    }
}

impl From<Pose> for StateSnapshot {
    fn from(pose: Pose) -> Self {
        Self {
            center: pose.center,
            zoom: pose.zoom,
            bearing: pose.bearing,
            pitch: pose.pitch,
            roll: pose.roll,
            padding: pose.padding,
        }
    }
}

impl From<StateSnapshot> for CameraTarget {
    fn from(s: StateSnapshot) -> Self {
        Self::default()
            .center(s.center)
            .zoom(s.zoom)
            .bearing(s.bearing)
            .pitch(s.pitch)
            .roll(s.roll)
            .padding(s.padding)
    }
}

impl CameraController {
    /// Current pose as a snapshot.
    #[must_use]
    pub fn get_state_snapshot(&self) -> StateSnapshot {
        self.transform.pose().into()
    }

    /// Jump to a saved snapshot. Values are clamped like any other pose.
    pub fn set_state_snapshot(&mut self, snapshot: &StateSnapshot) {
        self.jump_to((*snapshot).into());
    }
}
