//! Engine context
//!
//! Built once at startup and passed by reference to anything that needs
//! engine-wide settings. There is no global instance.

use crate::core::config::EngineConfig;

/// Engine-wide settings shared with scenes and factories
#[derive(Debug, Clone, Default)]
pub struct EngineContext {
    config: EngineConfig,
}

impl EngineContext {
    /// Wrap a validated configuration
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// The configuration the engine was started with
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Viewport size in pixels
    pub fn viewport(&self) -> (u32, u32) {
        (self.config.window.width, self.config.window.height)
    }

    /// Viewport width over height (1 for a degenerate viewport)
    #[allow(clippy::cast_precision_loss)]
    pub fn aspect_ratio(&self) -> f32 {
        let (width, height) = self.viewport();
        if width == 0 || height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_aspect_ratio_from_window() {
        let mut config = EngineConfig::default();
        config.window.width = 1920;
        config.window.height = 1080;
        let context = EngineContext::new(config);

        assert_eq!(context.viewport(), (1920, 1080));
        assert_relative_eq!(context.aspect_ratio(), 16.0 / 9.0);
    }

    #[test]
    fn test_degenerate_viewport_falls_back_to_square() {
        let mut config = EngineConfig::default();
        config.window.height = 0;
        assert_relative_eq!(EngineContext::new(config).aspect_ratio(), 1.0);
    }
}
