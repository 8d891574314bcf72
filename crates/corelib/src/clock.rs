//! Monotonic frame clock.

use std::time::Instant;

/// Elapsed time since start and time since the previous tick, in seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameTime {
    pub elapsed: f32,
    pub delta: f32,
}

impl FrameTime {
    /// Frame time at `elapsed` given the previous tick's elapsed time.
    pub fn at(elapsed: f32, previous: f32) -> Self {
        Self {
            elapsed,
            delta: (elapsed - previous).max(0.0),
        }
    }
}

/// Started once, never reset.
#[derive(Debug)]
pub struct Clock {
    start: Instant,
    previous: f32,
}

impl Clock {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
            previous: 0.0,
        }
    }

    /// Sample elapsed time and derive the delta since the last tick.
    pub fn tick(&mut self) -> FrameTime {
        let elapsed = self.start.elapsed().as_secs_f32();
        let time = FrameTime::at(elapsed, self.previous);
        self.previous = elapsed;
        time
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_are_monotonic() {
        let mut clock = Clock::start();
        let a = clock.tick();
        let b = clock.tick();
        assert!(b.elapsed >= a.elapsed);
        assert!(b.delta >= 0.0);
        assert!((b.elapsed - a.elapsed - b.delta).abs() < 1e-6);
    }

    #[test]
    fn frame_time_delta_never_negative() {
        let t = FrameTime::at(1.0, 2.0);
        assert_eq!(t.delta, 0.0);
        assert_eq!(FrameTime::at(1.5, 1.0).delta, 0.5);
    }
}
