//! Frame timing
//!
//! The renderer owns a [`Stopwatch`] that backs the elapsed-time shader
//! uniform; applications drive a [`Timer`] once per frame for animation and
//! reporting.

use std::time::Instant;

/// Monotonic clock counting seconds since it was started
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Instant,
}

impl Stopwatch {
    /// Start counting from now
    pub fn start_new() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Seconds elapsed since the stopwatch started
    pub fn elapsed_secs(&self) -> f32 {
        self.started.elapsed().as_secs_f32()
    }

    /// Rewind to zero and keep counting
    pub fn restart(&mut self) {
        self.started = Instant::now();
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::start_new()
    }
}

/// Per-frame clock
///
/// [`Timer::update`] marks a frame boundary; the getters describe the
/// interval up to the last boundary, so readings stay fixed within a frame.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    started: Instant,
    last_frame: Instant,
    delta: f32,
    frames: u64,
}

impl Timer {
    /// Create a timer whose first frame starts now
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            started: now,
            last_frame: now,
            delta: 0.0,
            frames: 0,
        }
    }

    /// Mark a frame boundary
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.frames += 1;
    }

    /// Seconds between the last two frame boundaries
    pub fn delta_time(&self) -> f32 {
        self.delta
    }

    /// Seconds from creation to the last frame boundary
    pub fn total_time(&self) -> f32 {
        self.last_frame.duration_since(self.started).as_secs_f32()
    }

    /// Frames marked so far
    pub fn frame_count(&self) -> u64 {
        self.frames
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_counts_frames() {
        let mut timer = Timer::new();
        timer.update();
        timer.update();
        assert_eq!(timer.frame_count(), 2);
        assert!(timer.delta_time() >= 0.0);
        assert!(timer.total_time() >= timer.delta_time());
    }

    #[test]
    fn test_timer_readings_fixed_between_updates() {
        let mut timer = Timer::new();
        timer.update();
        let total = timer.total_time();
        std::thread::sleep(std::time::Duration::from_millis(1));
        assert_eq!(timer.total_time(), total);
    }

    #[test]
    fn test_stopwatch_advances() {
        let stopwatch = Stopwatch::start_new();
        std::thread::sleep(std::time::Duration::from_millis(1));
        assert!(stopwatch.elapsed_secs() > 0.0);
    }

    #[test]
    fn test_stopwatch_restart_rewinds() {
        let mut stopwatch = Stopwatch::start_new();
        std::thread::sleep(std::time::Duration::from_millis(1));
        let before = stopwatch.elapsed_secs();
        stopwatch.restart();
        assert!(stopwatch.elapsed_secs() < before);
    }
}
