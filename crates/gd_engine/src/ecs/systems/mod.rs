//! Built-in systems

pub mod camera;
pub mod input;
pub mod rendering_system;

pub use camera::{CameraMatrices, CameraSystem};
pub use input::InputSystem;
pub use rendering_system::RenderSystem;
