//! # Rendering System
//!
//! Collects every visible, enabled [`MeshRenderer`] at draw time, orders the
//! resulting draw commands in a [`RenderQueue`] and submits them to the
//! installed [`RenderBackend`] together with the active camera's matrices.
//! Frames without an active camera are skipped.

use std::any::Any;

use crate::ecs::components::MeshRenderer;
use crate::ecs::system::{priority, System};
use crate::ecs::systems::camera::CameraMatrices;
use crate::ecs::world::SceneWorld;
use crate::foundation::math::Vec3;
use crate::render::{FrameSubmission, NullBackend, RenderBackend};
use crate::scene::{DrawCommand, RenderQueue};

/// Counts from the most recent submitted frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Opaque commands submitted
    pub opaque: usize,
    /// Transparent commands submitted
    pub transparent: usize,
    /// Material batches submitted
    pub batches: usize,
}

/// System responsible for collecting renderables and submitting them
pub struct RenderSystem {
    backend: Box<dyn RenderBackend>,
    frames_submitted: u64,
    frames_skipped: u64,
    last_stats: FrameStats,
}

impl Default for RenderSystem {
    fn default() -> Self {
        Self::new(Box::new(NullBackend))
    }
}

impl RenderSystem {
    /// Create a render system submitting to `backend`
    pub fn new(backend: Box<dyn RenderBackend>) -> Self {
        log::info!("Render system using '{}' backend", backend.name());
        Self {
            backend,
            frames_submitted: 0,
            frames_skipped: 0,
            last_stats: FrameStats::default(),
        }
    }

    /// Frames handed to the backend
    pub fn frames_submitted(&self) -> u64 {
        self.frames_submitted
    }

    /// Frames skipped for lack of an active camera
    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped
    }

    /// Counts from the most recent submitted frame
    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }

    /// Build the ordered queue for the current world state
    pub fn collect(world: &SceneWorld, eye: Vec3) -> RenderQueue {
        let transforms = world.transforms();
        let mut commands = Vec::new();

        for (entity, object) in world.entities() {
            let Some(transform) = object.transform_id() else {
                continue;
            };
            let Some(world_matrix) = transforms.world_matrix(transform) else {
                continue;
            };
            let position = Vec3::new(world_matrix.m14, world_matrix.m24, world_matrix.m34);
            let depth = (position - eye).norm();

            for renderer in object
                .enabled_components_of::<MeshRenderer>()
                .filter(|renderer| renderer.should_render())
            {
                commands.push(DrawCommand {
                    entity,
                    mesh: renderer.mesh.clone(),
                    material: renderer.material.clone(),
                    world_matrix,
                    layer: renderer.layer,
                    transparent: renderer.transparent,
                    depth,
                });
            }
        }

        RenderQueue::from_commands(commands)
    }
}

impl System for RenderSystem {
    fn name(&self) -> &str {
        "render"
    }

    fn priority(&self) -> i32 {
        priority::RENDER
    }

    fn draw(&mut self, world: &SceneWorld, _delta_time: f32) {
        let Some(matrices) = CameraMatrices::from_world(world) else {
            self.frames_skipped += 1;
            log::trace!("No active camera; frame skipped");
            return;
        };

        let queue = Self::collect(world, matrices.eye);
        let stats = FrameStats {
            opaque: queue.opaque_count(),
            transparent: queue.transparent_count(),
            batches: queue.batch_count(),
        };
        let submission = FrameSubmission {
            frame: self.frames_submitted + 1,
            camera: matrices.camera,
            eye: matrices.eye,
            view: matrices.view,
            projection: matrices.projection,
            view_projection: matrices.view_projection,
            queue,
        };

        match self.backend.submit(&submission) {
            Ok(()) => {
                self.frames_submitted += 1;
                self.last_stats = stats;
            }
            Err(e) => log::warn!("Backend '{}' rejected frame: {}", self.backend.name(), e),
        }
    }

    fn on_dispose(&mut self) {
        self.backend.shutdown();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
