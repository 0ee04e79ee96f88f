//! Orbit camera used for picking, popup projection and camera-relative lighting

use glam::{Mat4, Quat, Vec2, Vec3, Vec4Swizzles};

use super::Ray;

/// Orbital camera that rotates around a target point
#[derive(Debug, Clone)]
pub struct Camera {
    /// Target point the camera looks at (usually the planet center)
    pub target: Vec3,
    /// Distance from target
    pub distance: f32,
    /// Azimuth angle (rotation around Y axis) in radians
    pub azimuth: f32,
    /// Elevation angle (rotation above/below XZ plane) in radians
    pub elevation: f32,
    /// Vertical field of view in radians
    pub fov: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 3.0, // Three planet radii out, looking down -Z
            azimuth: 0.0,
            elevation: 0.0,
            fov: 75.0_f32.to_radians(),
            near: 0.001,
            far: 2048.0,
        }
    }
}

impl Camera {
    pub const MIN_DISTANCE: f32 = 1.1;
    pub const MAX_DISTANCE: f32 = 100.0;

    /// Get camera position in world space
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.elevation.cos() * self.azimuth.sin();
        let y = self.distance * self.elevation.sin();
        let z = self.distance * self.elevation.cos() * self.azimuth.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Get view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    /// Get projection matrix (depth range 0..1)
    pub fn projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov, aspect_ratio, self.near, self.far)
    }

    /// Get combined view-projection matrix
    pub fn view_projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        self.projection_matrix(aspect_ratio) * self.view_matrix()
    }

    /// World-space rotation of the camera
    pub fn orientation(&self) -> Quat {
        Quat::from_mat4(&self.view_matrix().inverse()).normalize()
    }

    /// Re-express a world direction in the camera's frame
    pub fn to_camera_frame(&self, direction: Vec3) -> Vec3 {
        self.orientation().inverse() * direction
    }

    /// Orbit the camera (pointer drag)
    pub fn orbit(&mut self, delta_x: f32, delta_y: f32) {
        self.azimuth += delta_x * 0.01;
        self.elevation = (self.elevation + delta_y * 0.01).clamp(
            -std::f32::consts::FRAC_PI_2 + 0.01,
            std::f32::consts::FRAC_PI_2 - 0.01,
        );
    }

    /// Zoom the camera (wheel)
    pub fn zoom(&mut self, delta: f32) {
        self.distance =
            (self.distance * (1.0 - delta * 0.1)).clamp(Self::MIN_DISTANCE, Self::MAX_DISTANCE);
    }

    /// Pick ray through a point in normalized device coordinates
    pub fn ray_from_ndc(&self, ndc: Vec2, aspect_ratio: f32) -> Ray {
        let inverse = self.view_projection_matrix(aspect_ratio).inverse();
        let near = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
        let far = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        Ray::new(self.position(), far - near)
    }

    /// Project a world point to normalized device coordinates.
    ///
    /// Returns `None` for points behind the camera.
    pub fn project_to_ndc(&self, world: Vec3, aspect_ratio: f32) -> Option<Vec3> {
        let clip = self.view_projection_matrix(aspect_ratio) * world.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        Some(clip.xyz() / clip.w)
    }
}

/// Convert pointer pixel coordinates into normalized device coordinates
pub fn pointer_to_ndc(x: f32, y: f32, width: f32, height: f32) -> Vec2 {
    Vec2::new((x / width) * 2.0 - 1.0, -(y / height) * 2.0 + 1.0)
}
