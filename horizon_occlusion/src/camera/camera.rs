/// Camera: low-level passive data container.
///
/// Stores view and projection in double precision. The occlusion wrapper
/// keeps the combined matrix in doubles for box projection and reduces it
/// to single precision for triangle rasterization.

use glam::{DMat4, DVec3, Vec3};

/// What a camera renders for. Only `Main` cameras drive occlusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraRole {
    /// The primary scene viewpoint
    Main,
    /// Shadow map pass
    Shadow,
    /// Water / mirror reflection pass
    Reflection,
    /// Any other auxiliary render-to-texture pass
    Other,
}

/// Low-level camera. Computes nothing beyond trivial derived values.
#[derive(Debug, Clone)]
pub struct Camera {
    role: CameraRole,
    view_matrix: DMat4,
    projection_matrix: DMat4,
}

impl Camera {
    /// Create a new camera with the given matrices.
    pub fn new(role: CameraRole, view: DMat4, projection: DMat4) -> Self {
        Self {
            role,
            view_matrix: view,
            projection_matrix: projection,
        }
    }

    /// Right-handed perspective camera looking from `eye` at `target`.
    ///
    /// `fov_y` is in radians. Depth range is [0, 1] (glam `perspective_rh`).
    pub fn look_at(
        role: CameraRole,
        eye: DVec3,
        target: DVec3,
        up: DVec3,
        fov_y: f64,
        aspect: f64,
        near: f64,
        far: f64,
    ) -> Self {
        Self::new(
            role,
            DMat4::look_at_rh(eye, target, up),
            DMat4::perspective_rh(fov_y, aspect, near, far),
        )
    }

    // ===== GETTERS =====

    pub fn role(&self) -> CameraRole {
        self.role
    }

    /// `true` for the primary scene camera.
    pub fn is_main(&self) -> bool {
        self.role == CameraRole::Main
    }

    /// View matrix (inverse of the camera's world transform).
    pub fn view_matrix(&self) -> &DMat4 {
        &self.view_matrix
    }

    /// Projection matrix.
    pub fn projection_matrix(&self) -> &DMat4 {
        &self.projection_matrix
    }

    /// Combined view-projection matrix (projection * view).
    pub fn view_projection_matrix(&self) -> DMat4 {
        self.projection_matrix * self.view_matrix
    }

    /// World-space eye position, taken from the inverse view matrix.
    pub fn eye_point(&self) -> Vec3 {
        self.view_matrix.inverse().w_axis.truncate().as_vec3()
    }

    // ===== SETTERS =====

    pub fn set_role(&mut self, role: CameraRole) {
        self.role = role;
    }

    pub fn set_view(&mut self, matrix: DMat4) {
        self.view_matrix = matrix;
    }

    pub fn set_projection(&mut self, matrix: DMat4) {
        self.projection_matrix = matrix;
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
