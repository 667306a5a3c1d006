//! Frame loop driving an [`Animation`].
//!
//! [`AnimationLoop`] owns timing only. Each iteration checks the running
//! flag, waits for the injected [`FrameScheduler`], checks the flag again,
//! then updates the animation and renders it if the update reported a
//! change. Stopping through a [`StopHandle`] (from any thread) guarantees no
//! further tick body runs, even if the scheduler already released a frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, trace};

use crate::animation::Animation;
use crate::error::AnimationError;

/// Source of frame ticks.
pub trait FrameScheduler {
    /// Blocks until the next frame is due. Returns `false` when no more
    /// frames will come, which ends the loop.
    fn next_frame(&mut self) -> bool;
}

/// Paces frames at a fixed interval, like a display refresh.
#[derive(Debug, Clone)]
pub struct FixedInterval {
    interval: Duration,
    next_due: Option<Instant>,
}

impl FixedInterval {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    /// Interval for `fps` frames per second. Zero fps is treated as one.
    pub fn fps(fps: u32) -> Self {
        Self::new(Duration::from_secs(1) / fps.max(1))
    }
}

impl FrameScheduler for FixedInterval {
    fn next_frame(&mut self) -> bool {
        let now = Instant::now();
        let due = self.next_due.unwrap_or(now);
        if due > now {
            thread::sleep(due - now);
        }
        // A slow frame does not cause a burst of catch-up frames.
        self.next_due = Some(due.max(now) + self.interval);
        true
    }
}

/// Releases exactly `frames` frames without waiting. Used for offline
/// rendering and tests.
#[derive(Debug, Clone, Copy)]
pub struct FrameBudget {
    remaining: u64,
}

impl FrameBudget {
    pub fn new(frames: u64) -> Self {
        Self { remaining: frames }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl FrameScheduler for FrameBudget {
    fn next_frame(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

/// Clonable handle that stops a loop, possibly from another thread.
#[derive(Debug, Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Whether a loop may run tick bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running,
}

/// Tick counters accumulated across runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Tick bodies executed.
    pub ticks: u64,
    /// Ticks that ended in a render.
    pub rendered: u64,
    /// Ticks whose update reported nothing to redraw.
    pub skipped: u64,
}

/// Drives update/render cycles on a [`FrameScheduler`] cadence.
pub struct AnimationLoop<S> {
    scheduler: S,
    running: Arc<AtomicBool>,
    stats: LoopStats,
}

impl<S: FrameScheduler> AnimationLoop<S> {
    /// Creates a stopped loop.
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            running: Arc::new(AtomicBool::new(false)),
            stats: LoopStats::default(),
        }
    }

    pub fn state(&self) -> LoopState {
        if self.running.load(Ordering::Acquire) {
            LoopState::Running
        } else {
            LoopState::Stopped
        }
    }

    /// Enters the running state. Idempotent.
    pub fn start(&mut self) {
        self.running.store(true, Ordering::Release);
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            running: Arc::clone(&self.running),
        }
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Runs ticks until the loop is stopped, the animation is destroyed, or
    /// the scheduler runs out of frames. Returns immediately when stopped.
    ///
    /// An update error stops the loop and is returned; the failing tick is
    /// not rendered.
    pub fn run(&mut self, animation: &mut dyn Animation) -> Result<LoopStats, AnimationError> {
        debug!(animation = animation.name(), "animation loop running");
        while self.is_live(animation) {
            if !self.scheduler.next_frame() {
                self.stop();
                break;
            }
            if !self.is_live(animation) {
                break;
            }
            let dirty = match animation.update() {
                Ok(dirty) => dirty,
                Err(e) => {
                    self.stop();
                    error!(animation = animation.name(), error = %e, "tick failed, loop halted");
                    return Err(e);
                }
            };
            self.stats.ticks += 1;
            if dirty {
                animation.render();
                self.stats.rendered += 1;
            } else {
                self.stats.skipped += 1;
            }
            trace!(tick = self.stats.ticks, dirty, "tick");
        }
        debug!(
            animation = animation.name(),
            ticks = self.stats.ticks,
            rendered = self.stats.rendered,
            skipped = self.stats.skipped,
            "animation loop stopped"
        );
        Ok(self.stats)
    }

    fn is_live(&self, animation: &dyn Animation) -> bool {
        self.running.load(Ordering::Acquire) && animation.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::surface::Surface;
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Counts ticks; dirty on even ticks; can be told to fail.
    struct Counter {
        surface: Surface,
        running: bool,
        updates: u64,
        renders: u64,
        fail_at: Option<u64>,
    }

    impl Counter {
        fn new() -> Self {
            Self {
                surface: Surface::new(2, 2).unwrap(),
                running: false,
                updates: 0,
                renders: 0,
                fail_at: None,
            }
        }
    }

    impl Animation for Counter {
        fn name(&self) -> &'static str {
            "counter"
        }
        fn start(&mut self) {
            self.running = true;
        }
        fn destroy(&mut self) {
            self.running = false;
        }
        fn is_running(&self) -> bool {
            self.running
        }
        fn update(&mut self) -> Result<bool, AnimationError> {
            self.updates += 1;
            if self.fail_at == Some(self.updates) {
                return Err(AnimationError::InvalidState("boom".into()));
            }
            Ok(self.updates % 2 == 0)
        }
        fn render(&mut self) {
            self.renders += 1;
            self.surface.fill(Color::WHITE);
        }
        fn surface(&self) -> &Surface {
            &self.surface
        }
        fn surface_mut(&mut self) -> &mut Surface {
            &mut self.surface
        }
        fn params(&self) -> Value {
            json!({})
        }
        fn param_schema(&self) -> Value {
            json!({})
        }
    }

    #[test]
    fn new_loop_is_stopped_and_run_is_a_no_op() {
        let mut lp = AnimationLoop::new(FrameBudget::new(10));
        let mut anim = Counter::new();
        anim.start();
        assert_eq!(lp.state(), LoopState::Stopped);
        let stats = lp.run(&mut anim).unwrap();
        assert_eq!(stats.ticks, 0);
        assert_eq!(anim.updates, 0);
    }

    #[test]
    fn budget_runs_exact_ticks_and_renders_only_dirty() {
        let mut lp = AnimationLoop::new(FrameBudget::new(10));
        let mut anim = Counter::new();
        anim.start();
        lp.start();
        let stats = lp.run(&mut anim).unwrap();
        assert_eq!(stats.ticks, 10);
        assert_eq!(stats.rendered, 5);
        assert_eq!(stats.skipped, 5);
        assert_eq!(anim.renders, 5);
        assert_eq!(lp.state(), LoopState::Stopped);
    }

    /// Releases frames forever but stops the loop while releasing frame `stop_on`.
    struct StopOnFrame {
        frames: u32,
        stop_on: u32,
        handle: Rc<RefCell<Option<StopHandle>>>,
    }

    impl FrameScheduler for StopOnFrame {
        fn next_frame(&mut self) -> bool {
            self.frames += 1;
            if self.frames == self.stop_on {
                if let Some(handle) = self.handle.borrow().as_ref() {
                    handle.stop();
                }
            }
            true
        }
    }

    #[test]
    fn stop_during_wait_prevents_tick_body() {
        let mut anim = Counter::new();
        anim.start();
        let slot = Rc::new(RefCell::new(None));
        let mut lp = AnimationLoop::new(StopOnFrame {
            frames: 0,
            stop_on: 3,
            handle: Rc::clone(&slot),
        });
        *slot.borrow_mut() = Some(lp.stop_handle());
        lp.start();
        let stats = lp.run(&mut anim).unwrap();
        assert_eq!(stats.ticks, 2);
        assert_eq!(anim.updates, 2);
    }

    #[test]
    fn stop_from_another_thread_ends_fixed_interval_loop() {
        let mut anim = Counter::new();
        anim.start();
        let mut lp = AnimationLoop::new(FixedInterval::fps(500));
        let handle = lp.stop_handle();
        lp.start();
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            handle.stop();
        });
        let stats = lp.run(&mut anim).unwrap();
        stopper.join().unwrap();
        assert!(stats.ticks > 0);
        assert_eq!(lp.state(), LoopState::Stopped);
    }

    #[test]
    fn destroyed_animation_ends_loop() {
        let mut anim = Counter::new();
        let mut lp = AnimationLoop::new(FrameBudget::new(5));
        lp.start();
        let stats = lp.run(&mut anim).unwrap();
        assert_eq!(stats.ticks, 0, "never started");
    }

    #[test]
    fn update_error_halts_loop_and_propagates() {
        let mut anim = Counter::new();
        anim.fail_at = Some(3);
        anim.start();
        let mut lp = AnimationLoop::new(FrameBudget::new(10));
        lp.start();
        let err = lp.run(&mut anim).unwrap_err();
        assert!(matches!(err, AnimationError::InvalidState(_)));
        assert_eq!(lp.state(), LoopState::Stopped);
        assert_eq!(lp.stats().ticks, 2);
        assert_eq!(anim.renders, 1);
    }

    #[test]
    fn fps_zero_is_clamped() {
        let s = FixedInterval::fps(0);
        assert_eq!(s.interval, Duration::from_secs(1));
    }

    #[test]
    fn stats_accumulate_across_runs() {
        let mut anim = Counter::new();
        anim.start();
        let mut lp = AnimationLoop::new(FrameBudget::new(4));
        lp.start();
        lp.run(&mut anim).unwrap();
        lp.start();
        let stats = lp.run(&mut anim).unwrap();
        assert_eq!(stats.ticks, 4, "budget already spent");
        assert_eq!(lp.scheduler().remaining(), 0);
    }
}
