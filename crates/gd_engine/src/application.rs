//! Application trait and lifecycle management

use crate::config::ConfigError;
use crate::ecs::ComponentError;
use crate::engine::{Engine, EngineError};
use crate::input::KeyCode;
use crate::scene::{HierarchyError, SceneError};
use thiserror::Error;

/// Application lifecycle trait
///
/// Implement this trait to create your game or application using the engine.
pub trait Application {
    /// Initialize the application
    ///
    /// Called once after the engine is created. Use this to build and load
    /// the initial scene.
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError>;

    /// Update the application
    ///
    /// Called every frame before the scene is updated.
    ///
    /// # Arguments
    /// * `engine` - Mutable reference to the engine
    /// * `delta_time` - Time since last frame in seconds
    fn update(&mut self, _engine: &mut Engine, _delta_time: f32) -> Result<(), AppError> {
        Ok(())
    }

    /// Whether the main loop should stop after the current frame
    fn should_exit(&self, _engine: &Engine) -> bool {
        false
    }

    /// Cleanup the application
    ///
    /// Called once when the main loop ends, before the scene is disposed.
    fn cleanup(&mut self, engine: &mut Engine);
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Engine error propagated to application level
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Scene operation failed
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Component operation failed
    #[error("Component error: {0}")]
    Component(#[from] ComponentError),

    /// Hierarchy operation failed
    #[error("Hierarchy error: {0}")]
    Hierarchy(#[from] HierarchyError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Custom application error
    #[error("Application error: {0}")]
    Custom(String),
}

/// Events a platform layer forwards to the engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppEvent {
    /// Window was resized
    WindowResized {
        /// New window width
        width: u32,
        /// New window height
        height: u32,
    },

    /// Window close requested
    WindowCloseRequested,

    /// Key input event
    KeyInput {
        /// The key that was pressed/released
        key: KeyCode,
        /// Whether the key was pressed (true) or released (false)
        pressed: bool,
    },

    /// Relative mouse movement since the previous event
    MouseMoved {
        /// Horizontal delta in pixels
        dx: f32,
        /// Vertical delta in pixels
        dy: f32,
    },
}
