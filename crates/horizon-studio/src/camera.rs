use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec3};

/// Orbit camera circling the origin, looking at it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub yaw: f32,
    pub pitch: f32,
    pub radius: f32,
    /// Vertical field of view, radians. The horizontal one follows the
    /// viewport aspect.
    pub fov: f32,
    pub show_grid: bool,
}

impl OrbitCamera {
    /// Radians per pixel of drag.
    pub const SENSITIVITY: f32 = 0.005;
    /// Radius change per unit of zoom input.
    pub const ZOOM_STEP: f32 = 0.1;
    pub const MIN_RADIUS: f32 = 1.0;
    pub const MAX_RADIUS: f32 = 100.0;
    pub const MIN_FOV_DEG: f32 = 20.0;
    pub const MAX_FOV_DEG: f32 = 150.0;

    const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;
    const NEAR: f32 = 0.1;
    const FAR: f32 = 100.0;

    pub fn new(fov_deg: f32) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            radius: 10.0,
            fov: fov_deg
                .clamp(Self::MIN_FOV_DEG, Self::MAX_FOV_DEG)
                .to_radians(),
            show_grid: false,
        }
    }

    /// Orbits by a drag delta in pixels. Pitch stops just short of the poles.
    pub fn rotate(&mut self, delta_pitch: f32, delta_yaw: f32) {
        self.yaw += delta_yaw * Self::SENSITIVITY;
        self.pitch = (self.pitch + delta_pitch * Self::SENSITIVITY)
            .clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
    }

    /// Positive `delta` moves the camera towards the origin.
    pub fn zoom(&mut self, delta: f32) {
        self.radius = (self.radius - delta * Self::ZOOM_STEP).clamp(Self::MIN_RADIUS, Self::MAX_RADIUS);
    }

    pub fn set_fov_deg(&mut self, fov_deg: f32) {
        self.fov = fov_deg
            .clamp(Self::MIN_FOV_DEG, Self::MAX_FOV_DEG)
            .to_radians();
    }

    pub fn fov_deg(&self) -> f32 {
        self.fov.to_degrees()
    }

    pub fn position(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        Vec3::new(
            -self.radius * sy * cp,
            self.radius * sp,
            -self.radius * cy * cp,
        )
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), Vec3::ZERO, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov, aspect, Self::NEAR, Self::FAR)
    }

    /// Maps normalized device coordinates back to world space.
    pub fn inverse_view_projection(&self, aspect: f32) -> Mat4 {
        (self.projection_matrix(aspect) * self.view_matrix()).inverse()
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(100.0)
    }
}
