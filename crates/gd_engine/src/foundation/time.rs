//! Time management utilities
//!
//! The [`Timer`] is the engine's single time source: it is advanced exactly
//! once per frame and every time-dependent computation in that frame reads
//! the same [`FrameTime`] snapshot.

use std::time::{Duration, Instant};

/// Snapshot of the time source for one frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Seconds elapsed since the previous frame (never negative)
    pub delta_seconds: f32,
    /// Seconds accumulated since the timer was created
    pub total_seconds: f64,
    /// Number of frames advanced so far
    pub frame: u64,
}

/// Frame timer driven either by the wall clock or by explicit steps
#[derive(Debug, Clone)]
pub struct Timer {
    last_frame: Instant,
    delta_time: f32,
    total_time: f64,
    frame_count: u64,
    max_delta: f32,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Default upper bound for a single frame's delta (a quarter second)
    pub const DEFAULT_MAX_DELTA: f32 = 0.25;

    /// Create a new timer
    pub fn new() -> Self {
        Self::with_max_delta(Self::DEFAULT_MAX_DELTA)
    }

    /// Create a timer whose per-frame delta is clamped to `max_delta` seconds
    pub fn with_max_delta(max_delta: f32) -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
            max_delta: max_delta.max(0.0),
        }
    }

    /// Update the timer from the wall clock (should be called once per frame)
    pub fn update(&mut self) -> FrameTime {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame);
        self.last_frame = now;
        self.record(elapsed)
    }

    /// Advance by a fixed step, ignoring the wall clock
    pub fn advance(&mut self, step: Duration) -> FrameTime {
        self.last_frame = Instant::now();
        self.record(step)
    }

    fn record(&mut self, elapsed: Duration) -> FrameTime {
        let raw = elapsed.as_secs_f32();
        if raw > self.max_delta {
            log::debug!("Frame delta {:.3}s clamped to {:.3}s", raw, self.max_delta);
        }
        self.delta_time = raw.min(self.max_delta);
        self.total_time += f64::from(self.delta_time);
        self.frame_count += 1;
        self.frame()
    }

    /// Current frame snapshot
    pub fn frame(&self) -> FrameTime {
        FrameTime {
            delta_seconds: self.delta_time,
            total_seconds: self.total_time,
            frame: self.frame_count,
        }
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the average FPS since timer creation
    #[allow(clippy::cast_precision_loss)]
    pub fn average_fps(&self) -> f64 {
        if self.total_time > 0.0 {
            self.frame_count as f64 / self.total_time
        } else {
            0.0
        }
    }

    /// Get the current FPS (based on last frame time)
    pub fn current_fps(&self) -> f32 {
        if self.delta_time > 0.0 {
            1.0 / self.delta_time
        } else {
            0.0
        }
    }
}
