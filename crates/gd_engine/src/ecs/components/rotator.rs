//! Constant-rate spin

use std::any::Any;

use crate::ecs::component::{Component, ComponentContext};
use crate::ecs::EntityId;
use crate::foundation::math::Vec3;
use crate::scene::scene_graph::{Space, TransformId};

/// Rotates the owning transform at a fixed angular velocity
#[derive(Debug, Clone)]
pub struct Rotator {
    /// XYZ Euler rates in radians per second
    pub angular_velocity: Vec3,
    /// Frame the rotation is applied in
    pub space: Space,
    transform: Option<TransformId>,
}

impl Rotator {
    /// Spin about the transform's own axes
    pub fn new(angular_velocity: Vec3) -> Self {
        Self {
            angular_velocity,
            space: Space::Local,
            transform: None,
        }
    }

    /// Spin about the world axes
    pub fn world(angular_velocity: Vec3) -> Self {
        Self {
            space: Space::World,
            ..Self::new(angular_velocity)
        }
    }
}

impl Component for Rotator {
    fn on_attach(&mut self, _entity: EntityId, transform: TransformId) {
        self.transform = Some(transform);
    }

    fn update(&mut self, ctx: &mut ComponentContext<'_>, delta_time: f32) {
        let step = self.angular_velocity * delta_time;
        if step == Vec3::zeros() {
            return;
        }
        let Some(transform) = self.transform else {
            log::warn!("Rotator on {:?} has no transform; skipping", ctx.entity);
            return;
        };
        if let Some(mut node) = ctx.transforms.node_mut(transform) {
            node.rotate_euler_by(step, self.space);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
