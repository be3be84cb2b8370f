use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use crate::api::error::SceneError;

/// Host-supplied camera placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 40.0, 70.0),
            target: Vec3::ZERO,
            fov_y_degrees: 75.0,
            near: 0.1,
            far: 2000.0,
        }
    }
}

impl CameraConfig {
    pub fn validate(&self) -> Result<(), SceneError> {
        if !(self.fov_y_degrees > 0.0 && self.fov_y_degrees < 180.0) {
            return Err(SceneError::InvalidConfig(format!(
                "camera fov must be in (0, 180), got {}",
                self.fov_y_degrees
            )));
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(SceneError::InvalidConfig(format!(
                "camera clip planes must satisfy 0 < near < far, got {} / {}",
                self.near, self.far
            )));
        }
        if (self.target - self.position).length_squared() < 1e-12 {
            return Err(SceneError::InvalidConfig(
                "camera target coincides with its position".into(),
            ));
        }
        Ok(())
    }
}

/// GPU-side uniform data for the camera.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_projection: [[f32; 4]; 4],
    /// World-space eye position, w = 1.
    pub eye: [f32; 4],
}

/// Half-line used for picking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

/// Right-handed perspective camera looking at a fixed target.
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl PerspectiveCamera {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            position: config.position,
            target: config.target,
            fov_y: config.fov_y_degrees.to_radians(),
            aspect: aspect.max(1e-6),
            near: config.near,
            far: config.far,
        }
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    pub fn look_at(&mut self, position: Vec3, target: Vec3) {
        self.position = position;
        self.target = target;
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform {
            view_projection: self.view_projection().to_cols_array_2d(),
            eye: self.position.extend(1.0).to_array(),
        }
    }

    /// Ray from the eye through a point in normalized device coordinates.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inv = self.view_projection().inverse();
        let through = inv.project_point3(Vec3::new(ndc.x, ndc.y, 0.5));
        let direction = (through - self.position).normalize_or_zero();
        Ray {
            origin: self.position,
            direction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(&CameraConfig::default(), 16.0 / 9.0)
    }

    #[test]
    fn center_ray_hits_target() {
        let cam = camera();
        let ray = cam.ray_from_ndc(Vec2::ZERO);
        let expected = (cam.target - cam.position).normalize();
        assert!((ray.direction - expected).length() < 1e-4);
    }

    #[test]
    fn ray_through_projected_point() {
        let cam = camera();
        let world = Vec3::new(20.0, 0.0, 0.0);
        let clip = cam.view_projection().project_point3(world);
        let ray = cam.ray_from_ndc(Vec2::new(clip.x, clip.y));
        let to_point = (world - cam.position).normalize();
        assert!((ray.direction - to_point).length() < 1e-3);
    }

    #[test]
    fn rejects_bad_clip_planes() {
        let mut c = CameraConfig::default();
        c.near = 10.0;
        c.far = 1.0;
        assert!(c.validate().is_err());
        assert!(CameraConfig::default().validate().is_ok());
    }

    #[test]
    fn aspect_ignores_degenerate_values() {
        let mut cam = camera();
        cam.set_aspect(0.0);
        assert!((cam.aspect - 16.0 / 9.0).abs() < 1e-6);
        cam.set_aspect(2.0);
        assert!((cam.aspect - 2.0).abs() < 1e-6);
    }
}
