//! Frame timing for the window runner.
//!
//! The simulation itself is step-based and never reads the clock; [`Time`]
//! only measures how fast frames are being produced so the window title can
//! show it.

use std::time::{Duration, Instant};

/// Frame counter with a periodically refreshed FPS estimate.
#[derive(Debug)]
pub struct Time {
    frame_count: u64,
    fps: f32,
    window_start: Instant,
    window_frames: u64,
    interval: Duration,
}

impl Time {
    pub fn new() -> Self {
        Self::with_interval(Duration::from_millis(500))
    }

    /// Create a timer that refreshes its FPS estimate every `interval`.
    pub fn with_interval(interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            frame_count: 0,
            fps: 0.0,
            window_start: now,
            window_frames: 0,
            interval,
        }
    }

    /// Record a frame. Returns the new FPS estimate when it was refreshed.
    pub fn update(&mut self) -> Option<f32> {
        self.update_at(Instant::now())
    }

    fn update_at(&mut self, now: Instant) -> Option<f32> {
        self.frame_count += 1;
        self.window_frames += 1;

        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.interval || elapsed.is_zero() {
            return None;
        }
        self.fps = self.window_frames as f32 / elapsed.as_secs_f32();
        self.window_frames = 0;
        self.window_start = now;
        Some(self.fps)
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Most recent FPS estimate, 0 until the first refresh.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}
