//! Input sampling system

use std::any::Any;

use crate::ecs::system::{priority, System};
use crate::ecs::world::SceneWorld;
use crate::input::{InputDevice, InputState};

/// Polls every device once per frame and publishes the merged state
#[derive(Default)]
pub struct InputSystem {
    devices: Vec<Box<dyn InputDevice>>,
    last: InputState,
}

impl InputSystem {
    /// Create a system with no devices
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a device
    #[must_use]
    pub fn with_device(mut self, device: Box<dyn InputDevice>) -> Self {
        self.add_device(device);
        self
    }

    /// Add a device; devices are polled in the order they were added
    pub fn add_device(&mut self, device: Box<dyn InputDevice>) {
        log::debug!("Input device '{}' registered", device.name());
        self.devices.push(device);
    }

    /// First device of concrete type `D`
    pub fn device_mut<D: InputDevice + 'static>(&mut self) -> Option<&mut D> {
        self.devices
            .iter_mut()
            .find_map(|device| device.as_any_mut().downcast_mut::<D>())
    }

    /// State published on the most recent frame
    pub fn last_state(&self) -> &InputState {
        &self.last
    }
}

impl System for InputSystem {
    fn name(&self) -> &str {
        "input"
    }

    fn priority(&self) -> i32 {
        priority::INPUT
    }

    fn update(&mut self, world: &mut SceneWorld, _delta_time: f32) {
        let mut state = InputState::default();
        for device in &mut self.devices {
            device.poll(&mut state);
        }
        self.last = state;
        world.set_input(state);
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
    use crate::input::{Actions, KeyCode, KeyboardDevice, ScriptedInput};
    use crate::scene::scene_graph::ReparentPolicy;

    #[test]
    fn test_devices_are_merged_into_world() {
        let boost = InputState { actions: Actions::BOOST, ..Default::default() };
        let mut system = InputSystem::new()
            .with_device(Box::new(KeyboardDevice::new()))
            .with_device(Box::new(ScriptedInput::new(vec![boost])));
        system
            .device_mut::<KeyboardDevice>()
            .unwrap()
            .handle_key_input(KeyCode::W, true);
        let mut world = SceneWorld::new(ReparentPolicy::default(), (1, 1));

        system.update(&mut world, 0.016);

        assert_eq!(world.input().actions, Actions::MOVE_FORWARD | Actions::BOOST);
        assert_eq!(system.last_state(), world.input());
    }

    #[test]
    fn test_state_resets_each_frame() {
        let forward = InputState { actions: Actions::MOVE_FORWARD, ..Default::default() };
        let mut system = InputSystem::new().with_device(Box::new(ScriptedInput::new(vec![forward])));
        let mut world = SceneWorld::new(ReparentPolicy::default(), (1, 1));

        system.update(&mut world, 0.016);
        system.update(&mut world, 0.016);

        assert!(world.input().actions.is_empty());
    }
}
