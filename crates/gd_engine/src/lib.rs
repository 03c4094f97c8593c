//! # GD Engine
//!
//! The runtime core of a small 3D engine: a transform hierarchy, game
//! objects built from components, prioritized systems, a scene that drives
//! them frame by frame, and a backend-agnostic rendering contract.
//!
//! ## Features
//!
//! - **Transform Hierarchy**: cached world matrices with dirty propagation
//! - **Component Model**: game objects own typed components looked up by type
//! - **Systems**: priority-ordered, toggleable, disposed exactly once
//! - **Scene Events**: lifecycle and camera changes delivered through a bus
//! - **Frame-Rate Independence**: one time source per frame
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gd_engine::prelude::*;
//!
//! struct MyApp;
//!
//! impl Application for MyApp {
//!     fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
//!         let mut scene = engine.create_scene("main");
//!         let camera = scene.create_object("camera").with_component(Camera::default())?;
//!         scene.add(camera)?;
//!         scene.set_active_camera("camera")?;
//!         engine.load_scene(scene);
//!         Ok(())
//!     }
//!
//!     fn update(&mut self, engine: &mut Engine, delta_time: f32) -> Result<(), AppError> {
//!         // Update game logic
//!         Ok(())
//!     }
//!
//!     fn cleanup(&mut self, engine: &mut Engine) {}
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::default().with_max_frames(60);
//!     let mut app = MyApp;
//!     Engine::run(config, &mut app)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod config;
pub mod core;

pub mod ecs;
pub mod events;
pub mod foundation;
pub mod input;
pub mod render;
pub mod scene;

mod application;
mod engine;

pub use application::{AppError, AppEvent, Application};
pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        AppError, AppEvent, Application, Engine, EngineError,
        core::{Config, EngineConfig, EngineContext},
        ecs::{
            components::{Camera, LookController, MeshRenderer, MovementController, Rotator},
            systems::{CameraSystem, InputSystem, RenderSystem},
            CameraCapability, Component, ComponentContext, EntityId, GameObject, System, SceneWorld,
        },
        events::{EventType, SceneEvent},
        foundation::{
            math::{Mat4, Pose, Quat, Vec3},
            time::{FrameTime, Timer},
        },
        input::{Actions, InputState, KeyCode, KeyboardDevice, ScriptedInput},
        render::{LoggingBackend, NullBackend, RenderBackend},
        scene::{Scene, SceneError, Space},
    };
}
