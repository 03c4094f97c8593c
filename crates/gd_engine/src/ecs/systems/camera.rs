//! Camera system
//!
//! Keeps the active camera's aspect ratio in step with the viewport and
//! caches the view, projection and view-projection matrices derived from the
//! camera entity's transform.

use std::any::Any;

use crate::ecs::system::{priority, System};
use crate::ecs::world::SceneWorld;
use crate::ecs::EntityId;
use crate::foundation::math::{Mat4, Point3, Vec3, FORWARD, UP};

/// Matrices for viewing the scene from one camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMatrices {
    /// Camera entity
    pub camera: EntityId,
    /// Eye position in world space
    pub eye: Vec3,
    /// World to view
    pub view: Mat4,
    /// View to clip
    pub projection: Mat4,
    /// World to clip
    pub view_projection: Mat4,
}

impl CameraMatrices {
    /// Matrices for the world's active camera, if it has one
    pub fn from_world(world: &SceneWorld) -> Option<Self> {
        let camera = world.active_camera()?;
        let object = world.get(camera)?;
        let projection = object.camera()?.projection_matrix();
        let transform = object.transform_id()?;
        let transforms = world.transforms();
        let eye = transforms.world_position(transform)?;
        let rotation = transforms.world_rotation(transform)?;

        let target = eye + rotation * FORWARD;
        let view = Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &(rotation * UP));

        Some(Self {
            camera,
            eye,
            view,
            projection,
            view_projection: projection * view,
        })
    }
}

/// Refreshes camera aspect and matrices each frame
#[derive(Debug, Default)]
pub struct CameraSystem {
    matrices: Option<CameraMatrices>,
}

impl CameraSystem {
    /// Create the system
    pub fn new() -> Self {
        Self::default()
    }

    /// Matrices from the most recent update or draw, if a camera was active
    pub fn matrices(&self) -> Option<&CameraMatrices> {
        self.matrices.as_ref()
    }
}

impl System for CameraSystem {
    fn name(&self) -> &str {
        "camera"
    }

    fn priority(&self) -> i32 {
        priority::CAMERA
    }

    fn update(&mut self, world: &mut SceneWorld, _delta_time: f32) {
        if let (Some(aspect), Some(camera)) = (world.aspect_ratio(), world.active_camera()) {
            if let Some(capability) = world.get_mut(camera).and_then(|object| object.camera_mut()) {
                if (capability.aspect_ratio() - aspect).abs() > f32::EPSILON {
                    log::debug!("Camera aspect ratio -> {:.3}", aspect);
                    capability.set_aspect_ratio(aspect);
                }
            }
        }
        self.matrices = CameraMatrices::from_world(world);
    }

    fn draw(&mut self, world: &SceneWorld, _delta_time: f32) {
        // Components may have moved the camera since update
        self.matrices = CameraMatrices::from_world(world);
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
    use crate::ecs::components::Camera;
    use crate::ecs::GameObject;
    use crate::foundation::math::{Pose, Vec4};
    use crate::scene::scene_graph::ReparentPolicy;
    use approx::assert_relative_eq;

    fn world_with_camera(position: Vec3) -> (SceneWorld, EntityId) {
        let mut world = SceneWorld::new(ReparentPolicy::default(), (800, 400));
        let mut object = GameObject::new("eye").with_pose(Pose::from_position(position));
        object.add_component(Camera::default()).unwrap();
        let id = world.insert(object);
        world.set_active_camera(Some(id));
        (world, id)
    }

    #[test]
    fn test_no_camera_means_no_matrices() {
        let mut world = SceneWorld::new(ReparentPolicy::default(), (800, 400));
        let mut system = CameraSystem::new();
        system.update(&mut world, 0.016);
        assert!(system.matrices().is_none());
    }

    #[test]
    fn test_aspect_follows_viewport() {
        let (mut world, id) = world_with_camera(Vec3::zeros());
        let mut system = CameraSystem::new();

        system.update(&mut world, 0.016);

        let aspect = world.get(id).unwrap().camera().unwrap().aspect_ratio();
        assert_relative_eq!(aspect, 2.0);
    }

    #[test]
    fn test_view_moves_world_into_eye_space() {
        let (mut world, _) = world_with_camera(Vec3::new(0.0, 2.0, 10.0));
        let mut system = CameraSystem::new();

        system.update(&mut world, 0.016);
        let matrices = system.matrices().unwrap();

        // A point straight ahead of the eye lands on the view -Z axis
        let ahead = matrices.view * Vec4::new(0.0, 2.0, 5.0, 1.0);
        assert_relative_eq!(ahead, Vec4::new(0.0, 0.0, -5.0, 1.0), epsilon = 1e-5);
        assert_relative_eq!(matrices.eye, Vec3::new(0.0, 2.0, 10.0));
    }
}
