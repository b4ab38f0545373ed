//! Frame pacing.
//!
//! The frame loop itself is driven by elapsed time handed to it; this
//! clock measures that time against the wall clock and holds the target
//! frame rate.

use std::time::{Duration, Instant};

/// Longest step handed to the frame loop. Longer stalls (a debugger
/// pause, a slow disk) are clamped so fades do not jump to their end.
pub const MAX_FRAME_STEP: Duration = Duration::from_millis(250);

/// Wall-clock frame timer.
#[derive(Debug, Clone)]
pub struct FrameClock {
    /// Budget for one frame
    frame_budget: Duration,
    /// Start of the current frame
    last_frame: Instant,
    /// Frames measured so far
    frames: u64,
}

impl FrameClock {
    /// Create a clock targeting `target_fps` frames per second.
    #[must_use]
    pub fn new(target_fps: u32) -> Self {
        Self {
            frame_budget: Duration::from_secs_f64(1.0 / f64::from(target_fps.max(1))),
            last_frame: Instant::now(),
            frames: 0,
        }
    }

    /// Budget for one frame.
    #[must_use]
    pub const fn frame_budget(&self) -> Duration {
        self.frame_budget
    }

    /// Frames measured so far.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Time since the previous tick, clamped to [`MAX_FRAME_STEP`]. Starts
    /// the next frame.
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame);
        self.last_frame = now;
        self.frames += 1;
        elapsed.min(MAX_FRAME_STEP)
    }

    /// Sleep for whatever is left of the current frame's budget.
    pub fn sleep_remainder(&self) {
        let elapsed = self.last_frame.elapsed();
        if elapsed >= self.frame_budget {
            return;
        }
        let sleep_time = self.frame_budget - elapsed;
        // Sleep coarse, spin the last millisecond
        if sleep_time > Duration::from_millis(1) {
            std::thread::sleep(sleep_time - Duration::from_millis(1));
        }
        while self.last_frame.elapsed() < self.frame_budget {
            std::hint::spin_loop();
        }
    }

    /// Sleep out the current frame, then tick.
    pub fn pace(&mut self) -> Duration {
        self.sleep_remainder();
        self.tick()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_budget() {
        let clock = FrameClock::new(50);
        assert!((clock.frame_budget().as_secs_f64() - 0.02).abs() < 1e-6);
        assert_eq!(FrameClock::new(0).frame_budget(), Duration::from_secs(1));
    }

    #[test]
    fn test_tick_is_clamped() {
        let mut clock = FrameClock::new(60);
        std::thread::sleep(Duration::from_millis(300));
        let dt = clock.tick();
        assert_eq!(dt, MAX_FRAME_STEP);
        assert_eq!(clock.frames(), 1);
    }

    #[test]
    fn test_pace_holds_budget() {
        let mut clock = FrameClock::new(100);
        clock.tick();
        let dt = clock.pace();
        assert!(dt >= Duration::from_millis(10));
        assert!(dt <= MAX_FRAME_STEP);
    }
}
