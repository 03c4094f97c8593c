//! Built-in components

pub mod camera;
pub mod look;
pub mod movement;
pub mod renderable;
pub mod rotator;

pub use camera::Camera;
pub use look::LookController;
pub use movement::MovementController;
pub use renderable::MeshRenderer;
pub use rotator::Rotator;
