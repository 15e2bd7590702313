//! Geometry helpers and the demo camera.
//!
//! Vectors, quaternions and matrices come straight from `glam`; this module only
//! adds the projection/view construction the playground uses and the camera
//! controlled by mouse drag, scroll and arrow keys.

pub use glam::{IVec2, Mat4, Quat, Vec2, Vec3, Vec4};

use std::f32::consts::PI;

/// Camera distance from the origin before any zoom.
pub const DEFAULT_CAM_Z: f32 = 3.0;
/// Per wheel-unit zoom factor (120 wheel units per notch).
pub const CAM_ZOOM_STEP: f32 = 0.999;
/// Distance moved per arrow key press.
pub const CAM_MOVE_STEP: f32 = 0.25;
/// Radians of model rotation per pixel of mouse drag.
pub const CAM_ROTATE_SPEED: f32 = 0.01;

/// Build a right-handed perspective projection with a 0..1 depth range.
pub fn perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh(fov_degrees.to_radians(), aspect.max(1e-4), near, far)
}

/// Camera that looks down -Z at a rotating scene.
///
/// The scene (not the eye) is rotated by mouse drag, which keeps the
/// playground centered no matter how it is spun.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Eye position in world space.
    pub position: Vec3,
    /// Rotation applied to the whole scene.
    pub rotation: Quat,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
    pub(crate) wheel: f32,
}

impl Camera {
    /// Create a camera with the default framing.
    pub fn new() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, DEFAULT_CAM_Z),
            rotation: Quat::from_axis_angle(Vec3::X, PI / 6.0)
                * Quat::from_axis_angle(Vec3::Y, -PI / 4.0),
            fov_degrees: 70.0,
            near: 0.1,
            far: 20.0,
            wheel: 0.0,
        }
    }

    /// Calculate the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_translation(-self.position) * Mat4::from_quat(self.rotation)
    }

    /// Projection matrix for the given viewport aspect ratio.
    pub fn projection(&self, aspect: f32) -> Mat4 {
        perspective(self.fov_degrees, aspect, self.near, self.far)
    }

    /// Combined projection * view.
    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view_matrix()
    }

    /// World-space right axis of the view, for camera-facing billboards.
    pub fn right(&self) -> Vec3 {
        self.view_matrix().row(0).truncate()
    }

    /// World-space up axis of the view, for camera-facing billboards.
    pub fn up(&self) -> Vec3 {
        self.view_matrix().row(1).truncate()
    }

    /// Spin the scene from a mouse drag delta in pixels.
    pub fn rotate_by_drag(&mut self, delta: Vec2) {
        self.rotation = Quat::from_axis_angle(Vec3::Y, delta.x * CAM_ROTATE_SPEED)
            * Quat::from_axis_angle(Vec3::X, delta.y * CAM_ROTATE_SPEED)
            * self.rotation;
        self.rotation = self.rotation.normalize();
    }

    /// Accumulate scroll and recompute the eye distance.
    pub fn zoom(&mut self, wheel_delta: f32) {
        self.wheel += wheel_delta;
        self.position.z = DEFAULT_CAM_Z * CAM_ZOOM_STEP.powf(self.wheel);
    }

    /// Move the eye in the view plane by whole steps.
    pub fn nudge(&mut self, steps_x: i32, steps_y: i32) {
        self.position.x += steps_x as f32 * CAM_MOVE_STEP;
        self.position.y += steps_y as f32 * CAM_MOVE_STEP;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
