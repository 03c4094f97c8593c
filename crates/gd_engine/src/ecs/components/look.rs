//! Mouse-look component
//!
//! Yaw turns about the world up axis and pitch about the transform's own
//! right axis, so the horizon never rolls. Pitch is clamped short of
//! straight up/down.

use std::any::Any;

use crate::ecs::component::{Component, ComponentContext};
use crate::ecs::EntityId;
use crate::foundation::math::{utils, Quat, Vec2, Vec3};
use crate::scene::scene_graph::{Space, TransformId};

/// First-person look controller driven by the frame's pointer delta
#[derive(Debug, Clone)]
pub struct LookController {
    sensitivity: f32,
    max_pitch: f32,
    pitch: f32,
    yaw: f32,
    transform: Option<TransformId>,
}

impl Default for LookController {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SENSITIVITY)
    }
}

impl LookController {
    /// Radians of rotation per pixel of pointer movement
    pub const DEFAULT_SENSITIVITY: f32 = 0.0021;

    /// Create a controller with the given sensitivity (radians per pixel)
    pub fn new(sensitivity: f32) -> Self {
        Self {
            sensitivity: sensitivity.max(0.0),
            max_pitch: utils::deg_to_rad(89.0),
            pitch: 0.0,
            yaw: 0.0,
            transform: None,
        }
    }

    /// Radians per pixel
    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    /// Set the sensitivity, clamped to be non-negative
    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.sensitivity = sensitivity.max(0.0);
    }

    /// Accumulated pitch in radians
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Accumulated yaw in radians
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Yaw and pitch increments for one pointer delta, after clamping
    fn step(&self, delta: Vec2) -> (f32, f32) {
        let yaw = -delta.x * self.sensitivity;
        let target = (self.pitch - delta.y * self.sensitivity).clamp(-self.max_pitch, self.max_pitch);
        (yaw, target - self.pitch)
    }
}

impl Component for LookController {
    fn on_attach(&mut self, _entity: EntityId, transform: TransformId) {
        self.transform = Some(transform);
    }

    fn update(&mut self, ctx: &mut ComponentContext<'_>, _delta_time: f32) {
        let delta = ctx.input.look_delta;
        if delta == Vec2::zeros() {
            return;
        }
        let Some(transform) = self.transform else {
            log::warn!("LookController on {:?} has no transform; skipping", ctx.entity);
            return;
        };

        let (yaw, pitch) = self.step(delta);
        let Some(mut node) = ctx.transforms.node_mut(transform) else {
            return;
        };
        if yaw != 0.0 {
            node.rotate_by(Quat::from_axis_angle(&Vec3::y_axis(), yaw), Space::World);
        }
        if pitch != 0.0 {
            node.rotate_by(Quat::from_axis_angle(&Vec3::x_axis(), pitch), Space::Local);
        }
        self.yaw += yaw;
        self.pitch += pitch;
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
    use crate::events::EventBus;
    use crate::foundation::math::Pose;
    use crate::input::InputState;
    use crate::scene::scene_graph::TransformTree;
    use approx::assert_relative_eq;
    use slotmap::KeyData;

    fn drive(controller: &mut LookController, tree: &mut TransformTree, transform: TransformId, delta: Vec2) {
        let mut events = EventBus::new();
        let input = InputState { look_delta: delta, ..Default::default() };
        let mut ctx = ComponentContext {
            entity: EntityId::from(KeyData::from_ffi(1)),
            transform,
            transforms: tree,
            input: &input,
            events: &mut events,
        };
        controller.update(&mut ctx, 0.016);
    }

    fn rig() -> (LookController, TransformTree, TransformId) {
        let mut tree = TransformTree::default();
        let transform = tree.insert(Pose::identity());
        let mut controller = LookController::new(0.01);
        controller.on_attach(EntityId::from(KeyData::from_ffi(1)), transform);
        (controller, tree, transform)
    }

    #[test]
    fn test_pitch_is_clamped() {
        let (mut controller, mut tree, transform) = rig();

        drive(&mut controller, &mut tree, transform, Vec2::new(0.0, -1000.0));

        assert_relative_eq!(controller.pitch(), utils::deg_to_rad(89.0), epsilon = 1e-5);
        assert!(tree.forward(transform).unwrap().y > 0.99);
    }

    #[test]
    fn test_yaw_keeps_horizon_level() {
        let (mut controller, mut tree, transform) = rig();

        drive(&mut controller, &mut tree, transform, Vec2::new(0.0, -30.0));
        drive(&mut controller, &mut tree, transform, Vec2::new(120.0, 0.0));

        // Right stays in the horizontal plane after pitch then yaw
        assert_relative_eq!(tree.right(transform).unwrap().y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(controller.yaw(), -1.2, epsilon = 1e-5);
    }

    #[test]
    fn test_zero_delta_makes_no_mutation() {
        let (mut controller, mut tree, transform) = rig();
        let revision = tree.revision();

        drive(&mut controller, &mut tree, transform, Vec2::zeros());

        assert_eq!(tree.revision(), revision);
    }
}
