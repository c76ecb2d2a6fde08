use glam::{DMat3, DMat4, DQuat, DVec2, DVec3, DVec4, Mat4};

/// Projection model of a [`Camera`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Pinhole projection.
    Perspective {
        /// Vertical field of view in degrees.
        fov_y_deg: f64,
    },
    /// Parallel projection; the frustum extents are in view-space units.
    Orthographic {
        /// Left extent.
        left: f64,
        /// Right extent.
        right: f64,
        /// Top extent.
        top: f64,
        /// Bottom extent.
        bottom: f64,
    },
}

/// Scene camera positioned by an eye point and orientation quaternion.
///
/// The transform owns one of these and rewrites it every time the pose
/// changes; renderers read the matrices back out (directly or through
/// [`CameraUniform`]).
#[derive(Debug, Clone)]
pub struct Camera {
    /// Eye (camera) position in world space.
    pub position: DVec3,
    /// Up hint used by [`look_at`](Self::look_at).
    pub up: DVec3,
    /// World orientation; the camera looks down its local `-Z`.
    pub quaternion: DQuat,
    /// Perspective or orthographic.
    pub projection: Projection,
    /// Viewport aspect ratio (width / height).
    pub aspect: f64,
    /// Near clipping plane distance.
    pub near: f64,
    /// Far clipping plane distance.
    pub far: f64,
    /// Principal-point shift in NDC, applied after projection.
    view_offset: DVec2,
    projection_matrix: DMat4,
    projection_matrix_inverse: DMat4,
    matrix_world: DMat4,
    matrix_world_inverse: DMat4,
}

impl Camera {
    /// Perspective camera with the given vertical field of view.
    #[must_use]
    pub fn perspective(fov_y_deg: f64, aspect: f64, near: f64, far: f64) -> Self {
        Self::with_projection(Projection::Perspective { fov_y_deg }, aspect, near, far)
    }

    /// Orthographic camera with unit extents; the transform resizes the
    /// frustum from the zoom level.
    #[must_use]
    pub fn orthographic(aspect: f64, near: f64, far: f64) -> Self {
        Self::with_projection(
            Projection::Orthographic {
                left: -aspect,
                right: aspect,
                top: 1.0,
                bottom: -1.0,
            },
            aspect,
            near,
            far,
        )
    }

    fn with_projection(
        projection: Projection,
        aspect: f64,
        near: f64,
        far: f64,
    ) -> Self {
        let mut camera = Self {
            position: DVec3::Z,
            up: DVec3::Y,
            quaternion: DQuat::IDENTITY,
            projection,
            aspect,
            near,
            far,
            view_offset: DVec2::ZERO,
            projection_matrix: DMat4::IDENTITY,
            projection_matrix_inverse: DMat4::IDENTITY,
            matrix_world: DMat4::IDENTITY,
            matrix_world_inverse: DMat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera.update_matrix_world();
        camera
    }

    /// Vertical field of view, if perspective.
    #[must_use]
    pub fn fov(&self) -> Option<f64> {
        match self.projection {
            Projection::Perspective { fov_y_deg } => Some(fov_y_deg),
            Projection::Orthographic { .. } => None,
        }
    }

    /// Whether this is a perspective camera.
    #[must_use]
    pub fn is_perspective(&self) -> bool {
        matches!(self.projection, Projection::Perspective { .. })
    }

    /// Orient the camera so its `-Z` axis points at `target`, keeping
    /// [`up`](Self::up) as close to screen-up as possible.
    pub fn look_at(&mut self, target: DVec3) {
        let Some(z) = (self.position - target).try_normalize() else {
            return;
        };
        let mut x = self.up.cross(z);
        if x.length_squared() < 1e-20 {
            // up is parallel to the view direction; any perpendicular works
            let fallback = if z.x.abs() < 0.9 { DVec3::X } else { DVec3::Z };
            x = fallback.cross(z);
        }
        let x = x.normalize();
        let y = z.cross(x);
        self.quaternion = DQuat::from_mat3(&DMat3::from_cols(x, y, z));
    }

    /// Rotate about a world-space axis through the camera position.
    pub fn rotate_on_world_axis(&mut self, axis: DVec3, angle_rad: f64) {
        let Some(axis) = axis.try_normalize() else {
            return;
        };
        self.quaternion =
            (DQuat::from_axis_angle(axis, angle_rad) * self.quaternion).normalize();
    }

    /// Direction the camera looks in.
    #[must_use]
    pub fn forward(&self) -> DVec3 {
        self.quaternion * DVec3::NEG_Z
    }

    /// Shift the principal point by `offset` NDC units.
    pub fn set_view_offset(&mut self, offset: DVec2) {
        self.view_offset = offset;
    }

    /// Rebuild the projection matrix after changing projection parameters.
    pub fn update_projection_matrix(&mut self) {
        let base = match self.projection {
            Projection::Perspective { fov_y_deg } => DMat4::perspective_rh_gl(
                fov_y_deg.to_radians(),
                self.aspect,
                self.near,
                self.far,
            ),
            Projection::Orthographic {
                left,
                right,
                top,
                bottom,
            } => DMat4::orthographic_rh_gl(
                left, right, bottom, top, self.near, self.far,
            ),
        };
        let shift = DMat4::from_translation(self.view_offset.extend(0.0));
        self.projection_matrix = shift * base;
        self.projection_matrix_inverse = self.projection_matrix.inverse();
    }

    /// Rebuild the world matrix after moving or rotating the camera.
    pub fn update_matrix_world(&mut self) {
        self.matrix_world =
            DMat4::from_rotation_translation(self.quaternion, self.position);
        self.matrix_world_inverse = self.matrix_world.inverse();
    }

    /// Projection matrix (OpenGL clip conventions, depth in `[-1, 1]`).
    #[must_use]
    pub fn projection_matrix(&self) -> DMat4 {
        self.projection_matrix
    }

    /// View matrix (inverse of the world matrix).
    #[must_use]
    pub fn view_matrix(&self) -> DMat4 {
        self.matrix_world_inverse
    }

    /// Camera-to-world matrix.
    #[must_use]
    pub fn matrix_world(&self) -> DMat4 {
        self.matrix_world
    }

    /// Combined view-projection matrix.
    #[must_use]
    pub fn view_projection(&self) -> DMat4 {
        self.projection_matrix * self.matrix_world_inverse
    }

    /// World point to homogeneous clip coordinates.
    #[must_use]
    pub fn project_clip(&self, world: DVec3) -> DVec4 {
        self.view_projection() * world.extend(1.0)
    }

    /// World point to normalized device coordinates.
    #[must_use]
    pub fn project(&self, world: DVec3) -> DVec3 {
        self.view_projection().project_point3(world)
    }

    /// Normalized device coordinates back to a world point.
    #[must_use]
    pub fn unproject(&self, ndc: DVec3) -> DVec3 {
        (self.matrix_world * self.projection_matrix_inverse).project_point3(ndc)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
/// GPU uniform buffer holding the view-projection matrix and camera metadata.
pub struct CameraUniform {
    /// Combined view-projection matrix.
    pub view_proj: [[f32; 4]; 4],
    /// Camera world-space position.
    pub position: [f32; 3],
    /// Viewport aspect ratio.
    pub aspect: f32,
    /// Camera forward direction.
    pub forward: [f32; 3],
    /// Vertical field of view in degrees (0 for orthographic cameras).
    pub fovy: f32,
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraUniform {
    /// Create a new camera uniform with identity view-projection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            position: [0.0; 3],
            aspect: 1.0,
            forward: [0.0, 0.0, -1.0],
            fovy: 0.0,
        }
    }

    /// Update uniform fields from the given camera's current state.
    pub fn update_view_proj(&mut self, camera: &Camera) {
        self.view_proj = camera.view_projection().as_mat4().to_cols_array_2d();
        self.position = camera.position.as_vec3().to_array();
        self.aspect = camera.aspect as f32;
        self.forward = camera.forward().as_vec3().to_array();
        self.fovy = camera.fov().unwrap_or(0.0) as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn look_at_points_forward_at_target() {
        let mut camera = Camera::perspective(45.0, 1.5, 0.1, 100.0);
        camera.position = DVec3::new(0.0, 10.0, 10.0);
        camera.up = DVec3::Y;
        camera.look_at(DVec3::ZERO);
        let expected = (DVec3::ZERO - camera.position).normalize();
        assert!((camera.forward() - expected).length() < 1e-12);
    }

    #[test]
    fn look_at_straight_down_with_parallel_up_still_orients() {
        let mut camera = Camera::perspective(45.0, 1.0, 0.1, 100.0);
        camera.position = DVec3::new(0.0, 10.0, 0.0);
        camera.up = DVec3::Y;
        camera.look_at(DVec3::ZERO);
        assert!((camera.forward() - DVec3::NEG_Y).length() < 1e-12);
    }

    #[test]
    fn project_unproject_round_trip() {
        let mut camera = Camera::perspective(50.0, 1.25, 0.5, 500.0);
        camera.position = DVec3::new(3.0, 20.0, 15.0);
        camera.look_at(DVec3::ZERO);
        camera.set_view_offset(DVec2::new(0.1, -0.05));
        camera.update_projection_matrix();
        camera.update_matrix_world();

        let world = DVec3::new(1.0, 0.0, -2.0);
        let ndc = camera.project(world);
        let back = camera.unproject(ndc);
        assert!((back - world).length() < 1e-9);
    }

    #[test]
    fn uniform_copies_camera_state() {
        let mut camera = Camera::orthographic(2.0, 0.1, 100.0);
        camera.position = DVec3::new(0.0, 5.0, 0.0);
        camera.look_at(DVec3::ZERO);
        camera.update_matrix_world();
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera);
        assert_eq!(uniform.position, [0.0, 5.0, 0.0]);
        assert_eq!(uniform.fovy, 0.0);
        assert_eq!(uniform.aspect, 2.0);
    }
}
