//! Frame scheduler: one update-and-draw pass per display refresh.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use corelib::camera::CameraView;
use corelib::clock::{Clock, FrameTime};
use corelib::scene::Scene;

use crate::state::AppState;

/// Receives the one draw issued per tick.
pub trait DrawTarget {
    fn draw(&mut self, scene: &Scene, camera: &CameraView) -> Result<()>;
}

/// Shared cancel flag for the frame loop.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

pub struct FrameLoop {
    clock: Clock,
    stop: StopHandle,
    frames: u64,
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameLoop {
    pub fn new() -> Self {
        Self {
            clock: Clock::start(),
            stop: StopHandle::default(),
            frames: 0,
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_stopped()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Sample the clock, then run [`FrameLoop::tick_at`].
    pub fn tick(&mut self, state: &mut AppState, target: &mut impl DrawTarget) -> Result<FrameTime> {
        let time = self.clock.tick();
        self.tick_at(time, state, target)?;
        Ok(time)
    }

    /// Animate, ease the camera rig, then draw exactly once. The draw is
    /// unconditional: no frame is skipped however long the last one took.
    pub fn tick_at(
        &mut self,
        time: FrameTime,
        state: &mut AppState,
        target: &mut impl DrawTarget,
    ) -> Result<()> {
        state.animate(time.elapsed);
        state.follow_cursor(time.delta);
        let camera = state.camera_view();
        target.draw(&state.scene, &camera)?;
        self.frames += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[derive(Default)]
    struct Counter(u32);

    impl DrawTarget for Counter {
        fn draw(&mut self, _: &Scene, _: &CameraView) -> Result<()> {
            self.0 += 1;
            Ok(())
        }
    }

    #[test]
    fn every_tick_draws_once() {
        let mut state = AppState::new(&Config::default());
        let mut frames = FrameLoop::new();
        let mut target = Counter::default();
        for _ in 0..5 {
            frames.tick(&mut state, &mut target).unwrap();
        }
        // A huge gap between ticks still yields exactly one draw.
        frames
            .tick_at(FrameTime::at(100.0, 0.0), &mut state, &mut target)
            .unwrap();
        assert_eq!(target.0, 6);
        assert_eq!(frames.frames(), 6);
    }

    #[test]
    fn stop_handle_is_shared() {
        let frames = FrameLoop::new();
        let handle = frames.stop_handle();
        assert!(!frames.is_stopped());
        handle.stop();
        assert!(frames.is_stopped());
    }
}
