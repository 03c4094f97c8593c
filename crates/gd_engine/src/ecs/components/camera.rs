//! Perspective camera component
//!
//! The camera itself carries only projection parameters. Its view comes from
//! the owning entity's transform: the eye is the world position and the view
//! looks down the transform's forward (-Z) axis.

use std::any::Any;

use crate::ecs::component::{CameraCapability, Capabilities, Component};
use crate::ecs::EntityId;
use crate::foundation::math::{perspective, utils, Mat4};
use crate::scene::scene_graph::TransformId;

/// Smallest accepted near-plane distance
pub const MIN_NEAR: f32 = 1e-4;

/// Smallest accepted gap between the near and far planes
pub const MIN_DEPTH_RANGE: f32 = 1e-3;

/// Smallest accepted field of view, and its distance from a half turn
pub const MIN_FOV: f32 = 1e-3;

/// Perspective camera attached to an entity
///
/// Projection parameters are clamped on assignment so the projection matrix
/// is always well formed. Whether the camera is the active one is tracked
/// by the scene, not by the component.
#[derive(Debug, Clone)]
pub struct Camera {
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
    transform: Option<TransformId>,
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(utils::deg_to_rad(60.0), 16.0 / 9.0, 0.1, 1000.0)
    }
}

impl Camera {
    /// Create a perspective camera
    ///
    /// Non-positive aspect ratios fall back to 1. The field of view is kept
    /// inside (0, π), the near plane positive and the far plane beyond it.
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        let (near, far) = clamp_planes(near, far);
        Self {
            fov_y: clamp_fov(fov_y),
            aspect: if aspect > 0.0 && aspect.is_finite() { aspect } else { 1.0 },
            near,
            far,
            transform: None,
        }
    }

    /// Vertical field of view in radians
    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    /// Set the vertical field of view, clamped into (0, π)
    pub fn set_fov_y(&mut self, fov_y: f32) {
        self.fov_y = clamp_fov(fov_y);
    }

    /// Distance to the near clipping plane
    pub fn near(&self) -> f32 {
        self.near
    }

    /// Distance to the far clipping plane
    pub fn far(&self) -> f32 {
        self.far
    }

    /// Set both clipping planes
    ///
    /// The near plane is kept positive and the far plane at least
    /// [`MIN_DEPTH_RANGE`] beyond it, or that fraction of the near distance
    /// when it is larger.
    pub fn set_clip_planes(&mut self, near: f32, far: f32) {
        (self.near, self.far) = clamp_planes(near, far);
    }

    /// Transform this camera views from, once attached
    pub fn transform(&self) -> Option<TransformId> {
        self.transform
    }
}

fn clamp_fov(fov_y: f32) -> f32 {
    if fov_y.is_nan() {
        return utils::deg_to_rad(60.0);
    }
    fov_y.clamp(MIN_FOV, std::f32::consts::PI - MIN_FOV)
}

fn clamp_planes(near: f32, far: f32) -> (f32, f32) {
    let near = if near.is_finite() { near.clamp(MIN_NEAR, f32::MAX / 4.0) } else { MIN_NEAR };
    // The gap grows with distance so it survives float rounding
    let gap = MIN_DEPTH_RANGE.max(near * MIN_DEPTH_RANGE);
    let far = if far.is_finite() && far >= near + gap { far } else { near + gap };
    (near, far)
}

impl CameraCapability for Camera {
    fn aspect_ratio(&self) -> f32 {
        self.aspect
    }

    fn set_aspect_ratio(&mut self, aspect: f32) {
        if aspect > 0.0 && aspect.is_finite() {
            self.aspect = aspect;
        }
    }

    fn projection_matrix(&self) -> Mat4 {
        perspective(self.fov_y, self.aspect, self.near, self.far)
    }
}

impl Component for Camera {
    fn capabilities(&self) -> Capabilities {
        Capabilities::CAMERA
    }

    fn on_attach(&mut self, _entity: EntityId, transform: TransformId) {
        self.transform = Some(transform);
    }

    fn as_camera(&self) -> Option<&dyn CameraCapability> {
        Some(self)
    }

    fn as_camera_mut(&mut self) -> Option<&mut dyn CameraCapability> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec4;
    use approx::assert_relative_eq;

    #[test]
    fn test_projection_maps_near_plane_to_clip_depth() {
        let camera = Camera::perspective(utils::deg_to_rad(90.0), 1.0, 1.0, 100.0);
        let clip = camera.projection_matrix() * Vec4::new(0.0, 0.0, -1.0, 1.0);

        assert_relative_eq!(clip.z / clip.w, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_invalid_aspect_is_ignored() {
        let mut camera = Camera::default();
        camera.set_aspect_ratio(0.0);
        assert_relative_eq!(camera.aspect_ratio(), 16.0 / 9.0);
        camera.set_aspect_ratio(2.0);
        assert_relative_eq!(camera.aspect_ratio(), 2.0);
    }

    #[test]
    fn test_camera_starts_detached() {
        let camera = Camera::default();
        assert!(camera.transform().is_none());
        assert_eq!(camera.capabilities(), Capabilities::CAMERA);
    }

    #[test]
    fn test_degenerate_clip_planes_are_clamped() {
        let camera = Camera::perspective(utils::deg_to_rad(60.0), 1.0, 1.0, 1.0);
        assert_relative_eq!(camera.near(), 1.0);
        assert_relative_eq!(camera.far(), 1.0 + MIN_DEPTH_RANGE);

        let mut camera = Camera::default();
        camera.set_clip_planes(-5.0, f32::INFINITY);
        assert_relative_eq!(camera.near(), MIN_NEAR);
        assert_relative_eq!(camera.far(), MIN_NEAR + MIN_DEPTH_RANGE);

        let projection = camera.projection_matrix();
        assert!(projection.iter().all(|value| value.is_finite()));

        camera.set_clip_planes(1e30, 1e30);
        assert!(camera.far() > camera.near());
    }

    #[test]
    fn test_field_of_view_is_clamped() {
        let mut camera = Camera::default();
        camera.set_fov_y(0.0);
        assert_relative_eq!(camera.fov_y(), MIN_FOV);
        camera.set_fov_y(10.0);
        assert_relative_eq!(camera.fov_y(), std::f32::consts::PI - MIN_FOV);
        camera.set_fov_y(f32::NAN);
        assert_relative_eq!(camera.fov_y(), utils::deg_to_rad(60.0));
    }
}
