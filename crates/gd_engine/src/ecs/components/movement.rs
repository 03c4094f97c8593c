//! Keyboard-driven movement component
//!
//! Translates the owning transform along its own forward/right basis from
//! the frame's held actions. The displacement is `speed * dt` per frame, so
//! the distance covered over a fixed span of time does not depend on the
//! frame rate.

use std::any::Any;

use crate::ecs::component::{ComponentContext, Component};
use crate::ecs::EntityId;
use crate::foundation::math::Vec3;
use crate::input::{Actions, InputState};
use crate::scene::scene_graph::{Space, TransformId};

/// First-person WASD movement
#[derive(Debug, Clone)]
pub struct MovementController {
    move_speed: f32,
    boost_multiplier: f32,
    transform: Option<TransformId>,
}

impl Default for MovementController {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SPEED, Self::DEFAULT_BOOST)
    }
}

impl MovementController {
    /// Units per second without boost
    pub const DEFAULT_SPEED: f32 = 15.0;
    /// Speed multiplier while boost is held
    pub const DEFAULT_BOOST: f32 = 4.0;

    /// Create a controller; values are clamped as by the setters
    pub fn new(move_speed: f32, boost_multiplier: f32) -> Self {
        let mut controller = Self {
            move_speed: Self::DEFAULT_SPEED,
            boost_multiplier: Self::DEFAULT_BOOST,
            transform: None,
        };
        controller.set_move_speed(move_speed);
        controller.set_boost_multiplier(boost_multiplier);
        controller
    }

    /// Units per second without boost
    pub fn move_speed(&self) -> f32 {
        self.move_speed
    }

    /// Set the base speed, clamped to be non-negative
    pub fn set_move_speed(&mut self, speed: f32) {
        self.move_speed = speed.max(0.0);
    }

    /// Multiplier applied while boost is held
    pub fn boost_multiplier(&self) -> f32 {
        self.boost_multiplier
    }

    /// Set the boost multiplier, clamped to at least 1
    pub fn set_boost_multiplier(&mut self, multiplier: f32) {
        self.boost_multiplier = multiplier.max(1.0);
    }

    /// Unnormalized movement direction for the held actions
    pub fn direction(actions: Actions, forward: Vec3, right: Vec3) -> Vec3 {
        let mut direction = Vec3::zeros();
        if actions.contains(Actions::MOVE_FORWARD) {
            direction += forward;
        }
        if actions.contains(Actions::MOVE_BACKWARD) {
            direction -= forward;
        }
        if actions.contains(Actions::STRAFE_RIGHT) {
            direction += right;
        }
        if actions.contains(Actions::STRAFE_LEFT) {
            direction -= right;
        }
        direction
    }

    /// World-space displacement for one frame, `None` when nothing moves
    pub fn displacement(&self, input: &InputState, forward: Vec3, right: Vec3, delta_time: f32) -> Option<Vec3> {
        if delta_time <= 0.0 {
            return None;
        }
        let direction = Self::direction(input.actions, forward, right).try_normalize(f32::EPSILON)?;
        let boost = if input.holds(Actions::BOOST) { self.boost_multiplier } else { 1.0 };
        let displacement = direction * self.move_speed * boost * delta_time;
        (displacement.norm_squared() > 0.0).then_some(displacement)
    }
}

impl Component for MovementController {
    fn on_attach(&mut self, _entity: EntityId, transform: TransformId) {
        self.transform = Some(transform);
    }

    fn update(&mut self, ctx: &mut ComponentContext<'_>, delta_time: f32) {
        let Some(transform) = self.transform else {
            log::warn!("MovementController on {:?} has no transform; skipping", ctx.entity);
            return;
        };
        let (Some(forward), Some(right)) = (ctx.transforms.forward(transform), ctx.transforms.right(transform)) else {
            log::warn!("MovementController transform {:?} is gone; skipping", transform);
            return;
        };

        if let Some(displacement) = self.displacement(ctx.input, forward, right, delta_time) {
            if let Some(mut node) = ctx.transforms.node_mut(transform) {
                node.translate_by(displacement, Space::World);
            }
        }
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
    use crate::foundation::math::{Pose, FORWARD, RIGHT};
    use crate::scene::scene_graph::{ReparentPolicy, TransformTree};
    use approx::assert_relative_eq;
    use slotmap::KeyData;

    struct Rig {
        tree: TransformTree,
        events: EventBus,
        controller: MovementController,
        transform: TransformId,
        entity: EntityId,
    }

    impl Rig {
        fn new() -> Self {
            let mut tree = TransformTree::new(ReparentPolicy::default());
            let transform = tree.insert(Pose::identity());
            let entity = EntityId::from(KeyData::from_ffi(1));
            let mut controller = MovementController::default();
            controller.on_attach(entity, transform);
            Self { tree, events: EventBus::new(), controller, transform, entity }
        }

        fn step(&mut self, input: InputState, delta_time: f32) {
            let mut ctx = ComponentContext {
                entity: self.entity,
                transform: self.transform,
                transforms: &mut self.tree,
                input: &input,
                events: &mut self.events,
            };
            self.controller.update(&mut ctx, delta_time);
        }

        fn position(&self) -> Vec3 {
            self.tree.world_position(self.transform).unwrap()
        }
    }

    fn held(actions: Actions) -> InputState {
        InputState { actions, ..Default::default() }
    }

    #[test]
    fn test_two_half_steps_equal_one_full_step() {
        let mut halves = Rig::new();
        halves.step(held(Actions::MOVE_FORWARD), 1.0 / 30.0);
        halves.step(held(Actions::MOVE_FORWARD), 1.0 / 30.0);

        let mut full = Rig::new();
        full.step(held(Actions::MOVE_FORWARD), 1.0 / 15.0);

        assert_relative_eq!(halves.position(), full.position(), epsilon = 1e-5);
        assert_relative_eq!(full.position(), FORWARD, epsilon = 1e-5);
    }

    #[test]
    fn test_zero_input_makes_no_mutation() {
        let mut rig = Rig::new();
        let revision = rig.tree.revision();

        rig.step(InputState::default(), 0.016);
        rig.step(held(Actions::MOVE_FORWARD | Actions::MOVE_BACKWARD), 0.016);
        rig.step(held(Actions::MOVE_FORWARD), 0.0);

        assert_eq!(rig.tree.revision(), revision);
    }

    #[test]
    fn test_diagonal_is_normalized_and_boost_applies() {
        let controller = MovementController::default();
        let input = held(Actions::MOVE_FORWARD | Actions::STRAFE_RIGHT | Actions::BOOST);

        let displacement = controller.displacement(&input, FORWARD, RIGHT, 0.5).unwrap();

        assert_relative_eq!(displacement.norm(), 15.0 * 4.0 * 0.5, epsilon = 1e-4);
    }

    #[test]
    fn test_setters_clamp() {
        let mut controller = MovementController::new(-3.0, 0.25);
        assert_relative_eq!(controller.move_speed(), 0.0);
        assert_relative_eq!(controller.boost_multiplier(), 1.0);

        controller.set_move_speed(9.0);
        controller.set_boost_multiplier(2.5);
        assert_relative_eq!(controller.move_speed(), 9.0);
        assert_relative_eq!(controller.boost_multiplier(), 2.5);
    }

    #[test]
    fn test_missing_transform_is_a_no_op() {
        let mut rig = Rig::new();
        rig.controller = MovementController::default();
        let revision = rig.tree.revision();

        rig.step(held(Actions::MOVE_FORWARD), 0.1);

        assert_eq!(rig.tree.revision(), revision);
    }
}
