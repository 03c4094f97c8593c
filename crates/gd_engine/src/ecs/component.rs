//! Component contract

use std::any::Any;

use bitflags::bitflags;

use crate::ecs::EntityId;
use crate::events::EventBus;
use crate::foundation::math::Mat4;
use crate::input::InputState;
use crate::scene::scene_graph::{TransformId, TransformTree};

bitflags! {
    /// Optional behaviours a component opts into
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u8 {
        /// Receives `update` every frame while enabled
        const UPDATABLE = 1 << 0;
        /// Collected by the render system
        const DRAWABLE  = 1 << 1;
        /// Can act as the scene's active camera
        const CAMERA    = 1 << 2;
    }
}

/// Scene state a component can touch during `update`
pub struct ComponentContext<'a> {
    /// Entity that owns the component
    pub entity: EntityId,
    /// Transform of the owning entity
    pub transform: TransformId,
    /// The scene's transform arena
    pub transforms: &'a mut TransformTree,
    /// Input sampled for this frame
    pub input: &'a InputState,
    /// The scene's event bus
    pub events: &'a mut EventBus,
}

/// Unit of behaviour or data attached to a [`GameObject`](crate::ecs::GameObject)
///
/// Lifecycle: `on_attach` once the owner is live (its transform exists in
/// the scene), `update` every frame while enabled, `on_destroy` exactly once
/// when the owner is torn down or the component is removed.
pub trait Component: Any {
    /// Human-readable type name for diagnostics
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Behaviours this component opts into
    fn capabilities(&self) -> Capabilities {
        Capabilities::UPDATABLE
    }

    /// Called when the owning entity goes live
    fn on_attach(&mut self, _entity: EntityId, _transform: TransformId) {}

    /// Per-frame update
    fn update(&mut self, _ctx: &mut ComponentContext<'_>, _delta_time: f32) {}

    /// Release resources; called at most once
    fn on_destroy(&mut self) {}

    /// Camera view of this component, if it is one
    fn as_camera(&self) -> Option<&dyn CameraCapability> {
        None
    }

    /// Mutable camera view of this component, if it is one
    fn as_camera_mut(&mut self) -> Option<&mut dyn CameraCapability> {
        None
    }

    /// Downcasting support
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcasting support
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Capability exposed by components that can drive the view
///
/// Which camera is active is owned by the scene
/// (see `Scene::active_camera`), so the capability carries projection
/// state only.
pub trait CameraCapability {
    /// Width over height
    fn aspect_ratio(&self) -> f32;

    /// Update the aspect ratio; non-positive values are ignored
    fn set_aspect_ratio(&mut self, aspect: f32);

    /// Projection matrix for the current parameters
    fn projection_matrix(&self) -> Mat4;
}
