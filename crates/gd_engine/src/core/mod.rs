//! # Core Engine Module
//!
//! Engine-wide configuration and the context handed to scenes and factories.
//!
//! ## Organization
//!
//! - **Config**: serializable engine, window, time, scene and movement settings
//! - **Context**: the immutable bundle built once at startup

pub mod config;
pub mod context;

pub use config::{EngineConfig, MovementConfig, SceneConfig, TimeConfig, WindowConfig};
pub use context::EngineContext;
pub use crate::config::{Config, ConfigError};
