//! Scene management
//!
//! ## Architecture
//!
//! ```text
//! Scene (entities, systems, events)
//!      ↓
//! Transform tree (poses, cached world matrices)
//!      ↓
//! Render queue (ordered draw commands handed to a backend)
//! ```
//!
//! The scene:
//! - Owns entities and runs their components after the systems each frame
//! - Keeps exactly one active camera
//! - Publishes lifecycle events on its bus
//! - Tears everything down once, entities before systems

mod render_queue;
pub mod scene_graph;
mod scene_manager;

pub use render_queue::{DrawCommand, RenderBatch, RenderQueue};
pub use scene_graph::{HierarchyError, ReparentPolicy, Space, TransformId, TransformMut, TransformTree};
pub use scene_manager::{Scene, SceneError};
