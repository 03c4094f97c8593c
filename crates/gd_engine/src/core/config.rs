//! # Engine configuration
//!
//! All settings are serde-derived and load from `.toml` or `.ron` through
//! the [`Config`] trait. Every section has defaults, so a file only needs
//! the values it changes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};
use crate::ecs::ComponentPolicy;
use crate::scene::scene_graph::ReparentPolicy;

/// Window and viewport settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Viewport width in pixels
    pub width: u32,
    /// Viewport height in pixels
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "GD Engine".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Time source settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// Upper bound on a single frame's delta, in seconds
    pub max_delta_seconds: f32,
    /// Fixed simulation step in seconds; `None` follows the wall clock
    pub fixed_step: Option<f32>,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            max_delta_seconds: 0.25,
            fixed_step: None,
        }
    }
}

/// Scene behaviour settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Name of the initial scene
    pub name: String,
    /// What re-parenting does to a node's local pose
    pub reparent_policy: ReparentPolicy,
    /// Component multiplicity for objects created through the scene
    pub component_policy: ComponentPolicy,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            name: "main".to_string(),
            reparent_policy: ReparentPolicy::default(),
            component_policy: ComponentPolicy::default(),
        }
    }
}

/// Default tuning for the movement controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Units per second without boost
    pub move_speed: f32,
    /// Speed multiplier while boost is held
    pub boost_multiplier: f32,
    /// Look sensitivity in radians per pixel
    pub look_sensitivity: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            move_speed: 15.0,
            boost_multiplier: 4.0,
            look_sensitivity: 0.0021,
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log level for the engine
    pub log_level: String,
    /// Stop after this many frames (headless runs)
    pub max_frames: Option<u64>,
    /// Window and viewport
    pub window: WindowConfig,
    /// Time source
    pub time: TimeConfig,
    /// Scene behaviour
    pub scene: SceneConfig,
    /// Movement tuning
    pub movement: MovementConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            max_frames: None,
            window: WindowConfig::default(),
            time: TimeConfig::default(),
            scene: SceneConfig::default(),
            movement: MovementConfig::default(),
        }
    }

    /// Set log level
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Run with a fixed time step
    #[must_use]
    pub fn with_fixed_step(mut self, step: f32) -> Self {
        self.time.fixed_step = Some(step);
        self
    }

    /// Stop after a number of frames
    #[must_use]
    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid("window width and height must be positive".into()));
        }
        if !is_positive_seconds(self.time.max_delta_seconds) {
            return Err(ConfigError::Invalid("time.max_delta_seconds must be positive and finite".into()));
        }
        if let Some(step) = self.time.fixed_step {
            if !is_positive_seconds(step) || Duration::try_from_secs_f32(step).is_err() {
                return Err(ConfigError::Invalid("time.fixed_step must be positive and finite".into()));
            }
        }
        Ok(())
    }
}

impl Config for EngineConfig {}

fn is_positive_seconds(seconds: f32) -> bool {
    seconds.is_finite() && seconds > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            max_frames = 120

            [time]
            fixed_step = 0.016

            [scene]
            reparent_policy = "keep_local"
            component_policy = "multiple"
            "#,
        )
        .unwrap();

        assert_eq!(config.max_frames, Some(120));
        assert_eq!(config.time.fixed_step, Some(0.016));
        assert_relative_eq!(config.time.max_delta_seconds, 0.25);
        assert_eq!(config.scene.reparent_policy, ReparentPolicy::KeepLocal);
        assert_eq!(config.scene.component_policy, ComponentPolicy::Multiple);
        assert_eq!(config.window, WindowConfig::default());
    }

    #[test]
    fn test_ron_roundtrip_through_files() {
        let path = std::env::temp_dir().join(format!("gd_engine_config_{}.ron", std::process::id()));
        let config = EngineConfig::new().with_fixed_step(0.02).with_max_frames(3);

        config.save_to_file(&path).unwrap();
        let loaded = EngineConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_defaults_and_unknown_extension_is_rejected() {
        let loaded = EngineConfig::load_or_default("does_not_exist.toml").unwrap();
        assert_eq!(loaded, EngineConfig::default());
        let result = EngineConfig::default().save_to_file("settings.yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let mut config = EngineConfig::default();
        config.time.fixed_step = Some(0.0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_non_finite_time_steps_are_rejected() {
        let config: EngineConfig = toml::from_str("[time]\nfixed_step = inf").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = EngineConfig::default();
        config.time.fixed_step = Some(1e20);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = EngineConfig::default();
        config.time.max_delta_seconds = f32::INFINITY;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
