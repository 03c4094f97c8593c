//! Mesh renderer component
//!
//! Marks an entity as drawable and names the mesh and material the render
//! backend should use for it. The world matrix comes from the entity's
//! transform at draw time.

use std::any::Any;

use crate::ecs::component::{Capabilities, Component};

/// Component for entities that can be rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshRenderer {
    /// Mesh resource name
    pub mesh: String,

    /// Material resource name
    pub material: String,

    /// Whether this object is visible
    pub visible: bool,

    /// Whether this material is transparent (affects render order)
    pub transparent: bool,

    /// Rendering layer for sorting (higher values render later)
    pub layer: u8,
}

impl MeshRenderer {
    /// Create an opaque renderer on layer 0
    pub fn new(mesh: impl Into<String>, material: impl Into<String>) -> Self {
        Self {
            mesh: mesh.into(),
            material: material.into(),
            visible: true,
            transparent: false,
            layer: 0,
        }
    }

    /// Create a transparent renderer on the given layer
    pub fn new_transparent(mesh: impl Into<String>, material: impl Into<String>, layer: u8) -> Self {
        Self {
            transparent: true,
            layer,
            ..Self::new(mesh, material)
        }
    }

    /// Builder: move to a render layer
    #[must_use]
    pub fn on_layer(mut self, layer: u8) -> Self {
        self.layer = layer;
        self
    }

    /// Set visibility
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Check if this component should be rendered
    pub fn should_render(&self) -> bool {
        self.visible
    }
}

impl Component for MeshRenderer {
    fn capabilities(&self) -> Capabilities {
        Capabilities::DRAWABLE
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

    #[test]
    fn test_transparent_constructor() {
        let renderer = MeshRenderer::new_transparent("quad", "glass", 3);
        assert!(renderer.transparent);
        assert_eq!(renderer.layer, 3);
        assert!(renderer.should_render());
    }

    #[test]
    fn test_hidden_renderer_is_skipped() {
        let mut renderer = MeshRenderer::new("cube", "crate");
        renderer.set_visible(false);
        assert!(!renderer.should_render());
        assert_eq!(renderer.capabilities(), Capabilities::DRAWABLE);
    }
}
