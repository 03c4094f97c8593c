//! Input state and devices
//!
//! Concrete device polling lives outside the core. Devices implement
//! [`InputDevice`] and write into the frame's [`InputState`], which the
//! input system stores in the scene world for components to read.

use std::any::Any;
use std::collections::{HashMap, HashSet, VecDeque};

use bitflags::bitflags;

use crate::foundation::math::Vec2;

/// Key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// W key
    W,
    /// A key
    A,
    /// S key
    S,
    /// D key
    D,
    /// Q key
    Q,
    /// E key
    E,
    /// Space key
    Space,
    /// Left shift
    LeftShift,
    /// Escape key
    Escape,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
}

bitflags! {
    /// Logical actions held during a frame
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Actions: u32 {
        /// Move along the forward axis
        const MOVE_FORWARD  = 1 << 0;
        /// Move against the forward axis
        const MOVE_BACKWARD = 1 << 1;
        /// Move against the right axis
        const STRAFE_LEFT   = 1 << 2;
        /// Move along the right axis
        const STRAFE_RIGHT  = 1 << 3;
        /// Speed multiplier held
        const BOOST         = 1 << 4;
    }
}

/// Input snapshot for one frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputState {
    /// Actions held this frame
    pub actions: Actions,
    /// Pointer movement since the previous frame, in pixels
    pub look_delta: Vec2,
}

impl InputState {
    /// Whether every action in `actions` is held
    pub fn holds(&self, actions: Actions) -> bool {
        self.actions.contains(actions)
    }

    /// Combine another device's contribution into this state
    pub fn merge(&mut self, other: &InputState) {
        self.actions |= other.actions;
        self.look_delta += other.look_delta;
    }
}

/// Key to action mapping
#[derive(Debug, Clone)]
pub struct KeyBindings {
    bindings: HashMap<KeyCode, Actions>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings = HashMap::new();
        bindings.insert(KeyCode::W, Actions::MOVE_FORWARD);
        bindings.insert(KeyCode::S, Actions::MOVE_BACKWARD);
        bindings.insert(KeyCode::A, Actions::STRAFE_LEFT);
        bindings.insert(KeyCode::D, Actions::STRAFE_RIGHT);
        bindings.insert(KeyCode::LeftShift, Actions::BOOST);
        Self { bindings }
    }
}

impl KeyBindings {
    /// Bind a key, replacing any previous binding for it
    pub fn bind(&mut self, key: KeyCode, actions: Actions) -> &mut Self {
        self.bindings.insert(key, actions);
        self
    }

    /// Union of the actions bound to the given keys
    pub fn resolve<'a, I>(&self, keys: I) -> Actions
    where
        I: IntoIterator<Item = &'a KeyCode>,
    {
        keys.into_iter()
            .filter_map(|key| self.bindings.get(key))
            .fold(Actions::empty(), |acc, actions| acc | *actions)
    }
}

/// Source of per-frame input
pub trait InputDevice {
    /// Device name for diagnostics
    fn name(&self) -> &str;

    /// Contribute this frame's input to `state`
    fn poll(&mut self, state: &mut InputState);

    /// Downcasting support
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Keyboard and pointer fed by the windowing layer
#[derive(Debug, Default)]
pub struct KeyboardDevice {
    bindings: KeyBindings,
    held: HashSet<KeyCode>,
    pointer_delta: Vec2,
}

impl KeyboardDevice {
    /// Create a device with the default WASD + shift bindings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a device with custom bindings
    pub fn with_bindings(bindings: KeyBindings) -> Self {
        Self {
            bindings,
            ..Self::default()
        }
    }

    /// Handle key input
    pub fn handle_key_input(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.held.insert(key);
        } else {
            self.held.remove(&key);
        }
    }

    /// Accumulate pointer motion until the next poll
    pub fn handle_mouse_move(&mut self, dx: f32, dy: f32) {
        self.pointer_delta += Vec2::new(dx, dy);
    }

    /// Whether a key is currently held
    pub fn is_held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }
}

impl InputDevice for KeyboardDevice {
    fn name(&self) -> &str {
        "keyboard"
    }

    fn poll(&mut self, state: &mut InputState) {
        state.actions |= self.bindings.resolve(&self.held);
        state.look_delta += std::mem::take(&mut self.pointer_delta);
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Replays a fixed sequence of frame states (headless runs and tests)
///
/// Once the script runs out a looping device starts over from the first
/// frame; otherwise it reports no input.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    frames: VecDeque<InputState>,
    script: Vec<InputState>,
    looping: bool,
}

impl ScriptedInput {
    /// Play `frames` once
    pub fn new(frames: Vec<InputState>) -> Self {
        Self {
            frames: frames.iter().copied().collect(),
            script: frames,
            looping: false,
        }
    }

    /// Play `frames` repeatedly
    pub fn looping(frames: Vec<InputState>) -> Self {
        Self {
            looping: true,
            ..Self::new(frames)
        }
    }

    /// Append a frame to the end of the script
    pub fn push(&mut self, frame: InputState) {
        self.script.push(frame);
        self.frames.push_back(frame);
    }

    /// Frames left before the script is exhausted
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl InputDevice for ScriptedInput {
    fn name(&self) -> &str {
        "scripted"
    }

    fn poll(&mut self, state: &mut InputState) {
        if self.frames.is_empty() && self.looping {
            self.frames.extend(self.script.iter().copied());
        }
        if let Some(frame) = self.frames.pop_front() {
            state.merge(&frame);
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_bindings_resolve_wasd() {
        let bindings = KeyBindings::default();
        let actions = bindings.resolve(&[KeyCode::W, KeyCode::D, KeyCode::Escape]);
        assert_eq!(actions, Actions::MOVE_FORWARD | Actions::STRAFE_RIGHT);
    }

    #[test]
    fn test_keyboard_poll_consumes_pointer_delta() {
        let mut keyboard = KeyboardDevice::new();
        keyboard.handle_key_input(KeyCode::LeftShift, true);
        keyboard.handle_mouse_move(3.0, -1.0);
        keyboard.handle_mouse_move(1.0, 0.5);

        let mut state = InputState::default();
        keyboard.poll(&mut state);
        assert!(state.holds(Actions::BOOST));
        assert_relative_eq!(state.look_delta, Vec2::new(4.0, -0.5));

        let mut next = InputState::default();
        keyboard.poll(&mut next);
        assert_relative_eq!(next.look_delta, Vec2::zeros());
        assert!(next.holds(Actions::BOOST));

        keyboard.handle_key_input(KeyCode::LeftShift, false);
        let mut released = InputState::default();
        keyboard.poll(&mut released);
        assert!(released.actions.is_empty());
    }

    #[test]
    fn test_scripted_input_plays_once_then_idles() {
        let forward = InputState { actions: Actions::MOVE_FORWARD, ..Default::default() };
        let mut device = ScriptedInput::new(vec![forward]);

        let mut first = InputState::default();
        device.poll(&mut first);
        let mut second = InputState::default();
        device.poll(&mut second);

        assert_eq!(first, forward);
        assert_eq!(second, InputState::default());
    }

    #[test]
    fn test_scripted_input_loops() {
        let left = InputState { actions: Actions::STRAFE_LEFT, ..Default::default() };
        let right = InputState { actions: Actions::STRAFE_RIGHT, ..Default::default() };
        let mut device = ScriptedInput::looping(vec![left, right]);

        let polled: Vec<Actions> = (0..4)
            .map(|_| {
                let mut state = InputState::default();
                device.poll(&mut state);
                state.actions
            })
            .collect();

        assert_eq!(polled, vec![Actions::STRAFE_LEFT, Actions::STRAFE_RIGHT, Actions::STRAFE_LEFT, Actions::STRAFE_RIGHT]);
    }
}
