//! Render queue for batched rendering
//!
//! Collects draw commands for one frame and orders them for submission:
//! opaque commands by layer then front-to-back, transparent commands by
//! layer then back-to-front. Consecutive commands sharing a material are
//! grouped into a batch without disturbing that order.

use std::cmp::Ordering;

use crate::ecs::EntityId;
use crate::foundation::math::Mat4;

/// One mesh to draw this frame
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    /// Entity the mesh belongs to
    pub entity: EntityId,
    /// Mesh resource name
    pub mesh: String,
    /// Material resource name
    pub material: String,
    /// World transformation matrix
    pub world_matrix: Mat4,
    /// Rendering layer (higher values render later)
    pub layer: u8,
    /// Whether the material blends
    pub transparent: bool,
    /// Distance from the camera eye
    pub depth: f32,
}

/// A run of commands sharing the same material
#[derive(Debug, Clone, PartialEq)]
pub struct RenderBatch {
    /// Material used by all commands in this batch
    pub material: String,

    /// Commands in this batch, in draw order
    pub commands: Vec<DrawCommand>,
}

impl RenderBatch {
    /// Create a new empty batch for a material
    pub fn new(material: impl Into<String>) -> Self {
        Self {
            material: material.into(),
            commands: Vec::new(),
        }
    }

    /// Get the number of commands in this batch
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }
}

/// Ordered render queue for a frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderQueue {
    /// Opaque object batches (rendered front-to-back for early-z)
    opaque_batches: Vec<RenderBatch>,

    /// Transparent object batches (rendered back-to-front for alpha blending)
    transparent_batches: Vec<RenderBatch>,
}

impl RenderQueue {
    /// Create an empty render queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a queue from unordered commands
    pub fn from_commands(commands: Vec<DrawCommand>) -> Self {
        let (mut opaque, mut transparent): (Vec<_>, Vec<_>) =
            commands.into_iter().partition(|command| !command.transparent);

        opaque.sort_by(|a, b| a.layer.cmp(&b.layer).then_with(|| compare_depth(a.depth, b.depth)));
        transparent.sort_by(|a, b| a.layer.cmp(&b.layer).then_with(|| compare_depth(b.depth, a.depth)));

        Self {
            opaque_batches: Self::batch_by_material(opaque),
            transparent_batches: Self::batch_by_material(transparent),
        }
    }

    fn batch_by_material(commands: Vec<DrawCommand>) -> Vec<RenderBatch> {
        let mut batches: Vec<RenderBatch> = Vec::new();
        for command in commands {
            match batches.last_mut() {
                Some(batch) if batch.material == command.material => batch.commands.push(command),
                _ => {
                    let mut batch = RenderBatch::new(command.material.clone());
                    batch.commands.push(command);
                    batches.push(batch);
                }
            }
        }
        batches
    }

    /// Get opaque batches (front-to-back order)
    pub fn opaque_batches(&self) -> &[RenderBatch] {
        &self.opaque_batches
    }

    /// Get transparent batches (back-to-front order)
    pub fn transparent_batches(&self) -> &[RenderBatch] {
        &self.transparent_batches
    }

    /// Every command in submission order, opaque first
    pub fn commands(&self) -> impl Iterator<Item = &DrawCommand> {
        self.opaque_batches
            .iter()
            .chain(&self.transparent_batches)
            .flat_map(|batch| batch.commands.iter())
    }

    /// Get total number of opaque commands
    pub fn opaque_count(&self) -> usize {
        self.opaque_batches.iter().map(RenderBatch::command_count).sum()
    }

    /// Get total number of transparent commands
    pub fn transparent_count(&self) -> usize {
        self.transparent_batches.iter().map(RenderBatch::command_count).sum()
    }

    /// Get total number of commands in the queue
    pub fn len(&self) -> usize {
        self.opaque_count() + self.transparent_count()
    }

    /// Whether the queue holds no commands
    pub fn is_empty(&self) -> bool {
        self.opaque_batches.is_empty() && self.transparent_batches.is_empty()
    }

    /// Get total number of batches
    pub fn batch_count(&self) -> usize {
        self.opaque_batches.len() + self.transparent_batches.len()
    }
}

fn compare_depth(a: f32, b: f32) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
