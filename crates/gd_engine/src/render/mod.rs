//! # Rendering contract
//!
//! The core never talks to a graphics API. Once per frame the render system
//! hands a [`FrameSubmission`] (camera matrices plus an ordered
//! [`RenderQueue`]) to whatever [`RenderBackend`] the application installed.
//!
//! Three backends ship with the engine:
//! - [`NullBackend`] discards everything
//! - [`LoggingBackend`] logs a one-line summary per frame
//! - [`RecordingBackend`] keeps submissions for later inspection

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use crate::ecs::EntityId;
use crate::foundation::math::{Mat4, Vec3};
use crate::scene::RenderQueue;

/// High-level rendering error types
///
/// Backends map their own failures onto these variants; the render system
/// logs them and carries on with the next frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A rendering operation failed during execution
    #[error("Rendering failed: {0}")]
    RenderingFailed(String),

    /// Backend-specific error occurred
    #[error("Backend error: {0}")]
    BackendError(String),
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Everything a backend needs to draw one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSubmission {
    /// Frame number the submission belongs to
    pub frame: u64,
    /// The camera entity the frame is viewed from
    pub camera: EntityId,
    /// Camera eye in world space
    pub eye: Vec3,
    /// World to view
    pub view: Mat4,
    /// View to clip
    pub projection: Mat4,
    /// World to clip
    pub view_projection: Mat4,
    /// Ordered draw commands
    pub queue: RenderQueue,
}

/// Destination for per-frame draw submissions
pub trait RenderBackend {
    /// Backend name for diagnostics
    fn name(&self) -> &str;

    /// Draw one frame
    fn submit(&mut self, frame: &FrameSubmission) -> BackendResult<()>;

    /// Release backend resources
    fn shutdown(&mut self) {}
}

/// Discards every submission
#[derive(Debug, Default)]
pub struct NullBackend;

impl RenderBackend for NullBackend {
    fn name(&self) -> &str {
        "null"
    }

    fn submit(&mut self, _frame: &FrameSubmission) -> BackendResult<()> {
        Ok(())
    }
}

/// Logs a summary of every submission at debug level
///
/// Every `summary_interval` frames the summary is promoted to info.
#[derive(Debug)]
pub struct LoggingBackend {
    summary_interval: u64,
    frames: u64,
}

impl Default for LoggingBackend {
    fn default() -> Self {
        Self::new(60)
    }
}

impl LoggingBackend {
    /// Create a backend that logs at info level every `summary_interval` frames
    pub fn new(summary_interval: u64) -> Self {
        Self {
            summary_interval: summary_interval.max(1),
            frames: 0,
        }
    }

    /// Frames submitted so far
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl RenderBackend for LoggingBackend {
    fn name(&self) -> &str {
        "logging"
    }

    fn submit(&mut self, frame: &FrameSubmission) -> BackendResult<()> {
        self.frames += 1;
        let level = if self.frames % self.summary_interval == 0 {
            log::Level::Info
        } else {
            log::Level::Debug
        };
        log::log!(
            level,
            "frame {}: {} opaque / {} transparent in {} batches, eye ({:.2}, {:.2}, {:.2})",
            frame.frame,
            frame.queue.opaque_count(),
            frame.queue.transparent_count(),
            frame.queue.batch_count(),
            frame.eye.x,
            frame.eye.y,
            frame.eye.z,
        );
        Ok(())
    }

    fn shutdown(&mut self) {
        log::info!("Logging backend shut down after {} frames", self.frames);
    }
}

/// Shared log of submissions kept by a [`RecordingBackend`]
pub type SubmissionLog = Rc<RefCell<Vec<FrameSubmission>>>;

/// Keeps a copy of every submission
#[derive(Debug, Default)]
pub struct RecordingBackend {
    submissions: SubmissionLog,
}

impl RecordingBackend {
    /// Create a backend with an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the log that stays valid after the backend is boxed
    pub fn log(&self) -> SubmissionLog {
        Rc::clone(&self.submissions)
    }
}

impl RenderBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn submit(&mut self, frame: &FrameSubmission) -> BackendResult<()> {
        self.submissions.borrow_mut().push(frame.clone());
        Ok(())
    }
}
