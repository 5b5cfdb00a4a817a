use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};

/// Bounds applied to the orbit camera once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraLimits {
    pub lower_radius: f32,
    pub upper_radius: f32,
    pub lower_beta: f32,
    pub upper_beta: f32,
}

impl CameraLimits {
    /// Finite bounds with each lower bound at or below its upper bound.
    pub fn is_valid(&self) -> bool {
        let finite = [
            self.lower_radius,
            self.upper_radius,
            self.lower_beta,
            self.upper_beta,
        ]
        .iter()
        .all(|v| v.is_finite());
        finite && self.lower_radius <= self.upper_radius && self.lower_beta <= self.upper_beta
    }
}

/// Keep `value` between two bounds given in either order. NaN bounds are ignored.
fn bounded(value: f32, a: f32, b: f32) -> f32 {
    value.max(a.min(b)).min(a.max(b))
}

impl Default for CameraLimits {
    fn default() -> Self {
        Self {
            lower_radius: 0.25,
            upper_radius: 10.0,
            lower_beta: 0.01,
            upper_beta: PI - 0.01,
        }
    }
}

/// Camera orbiting `target` at `radius`, positioned by azimuth `alpha` and
/// elevation `beta` (angle from +Y), both in radians.
#[derive(Debug, Clone, PartialEq)]
pub struct ArcRotateCamera {
    pub target: Vec3,
    pub alpha: f32,
    pub beta: f32,
    pub radius: f32,
    pub limits: CameraLimits,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Pixels of drag per radian of rotation.
    pub angular_sensibility: f32,
    /// Wheel lines per unit of radius.
    pub wheel_precision: f32,
    /// Pixels of drag per radius-length of panning.
    pub panning_sensibility: f32,
}

impl Default for ArcRotateCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            alpha: -FRAC_PI_2,
            beta: FRAC_PI_2,
            radius: 1.5,
            limits: CameraLimits::default(),
            fov: 0.8,
            aspect: 16.0 / 9.0,
            near: 0.01,
            far: 1000.0,
            angular_sensibility: 1000.0,
            wheel_precision: 3.0,
            panning_sensibility: 1000.0,
        }
    }
}

impl ArcRotateCamera {
    /// Azimuth restored by [`reset`](Self::reset).
    pub const RESET_ALPHA: f32 = -FRAC_PI_2;
    /// Elevation restored by [`reset`](Self::reset).
    pub const RESET_BETA: f32 = FRAC_PI_2;
    /// Radius requested by [`reset`](Self::reset); the radius limits pull it
    /// back in on the next frame.
    pub const RESET_RADIUS: f32 = 1000.0;

    pub fn position(&self) -> Vec3 {
        let (sa, ca) = self.alpha.sin_cos();
        let (sb, cb) = self.beta.sin_cos();
        self.target + self.radius * Vec3::new(ca * sb, cb, sa * sb)
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position()).normalize_or_zero()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize_or_zero()
    }

    /// Restore the initial viewing angle and push the camera far out.
    pub fn reset(&mut self) {
        self.alpha = Self::RESET_ALPHA;
        self.beta = Self::RESET_BETA;
        self.radius = Self::RESET_RADIUS;
    }

    /// Clamp radius and elevation into `limits`.
    pub fn check_limits(&mut self) {
        let l = &self.limits;
        self.radius = bounded(self.radius, l.lower_radius, l.upper_radius);
        self.beta = bounded(self.beta, l.lower_beta, l.upper_beta);
    }

    /// Pointer drag in pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.alpha -= dx / self.angular_sensibility;
        self.beta -= dy / self.angular_sensibility;
        self.check_limits();
    }

    /// Wheel movement in lines; positive moves closer.
    pub fn zoom(&mut self, lines: f32) {
        self.radius -= lines / self.wheel_precision;
        self.check_limits();
    }

    /// Secondary-button drag in pixels; moves the target in the view plane.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let right = self.right();
        let up = right.cross(self.forward()).normalize_or_zero();
        let scale = self.radius / self.panning_sensibility;
        self.target += (-right * dx + up * dy) * scale;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
