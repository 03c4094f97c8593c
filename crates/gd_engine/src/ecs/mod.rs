//! Entities, components and systems
//!
//! A scene's entities are [`GameObject`]s holding boxed [`Component`]s; the
//! [`SceneWorld`] owns them alongside the transform arena. [`System`]s run
//! over the world in priority order.

pub mod component;
pub mod components;
pub mod entity;
pub mod system;
pub mod systems;
pub mod world;

pub use component::{CameraCapability, Capabilities, Component, ComponentContext};
pub use entity::{ComponentError, ComponentPolicy, EntityId, GameObject};
pub use system::{System, SystemId, SystemRegistry};
pub use world::SceneWorld;
