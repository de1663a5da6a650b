//! Frame driving.
//!
//! A [`FrameDriver`] turns "the display wants a frame" notifications into
//! ticks. Exactly one tick is armed at a time: the next one is requested from
//! the [`FrameScheduler`] only after the current tick has returned, so ticks
//! never overlap and a slow tick simply delays the next one. Returning
//! [`AppControl::Exit`] from a tick (or calling [`FrameDriver::stop`]) stops
//! re-arming.

mod scheduler;

pub use scheduler::{FrameScheduler, ManualScheduler, WindowScheduler};

use crate::core::AppControl;
use crate::time::{FrameClock, FrameTime};

/// Tick bookkeeping for one render loop.
#[derive(Debug, Default)]
pub struct FrameDriver {
    running: bool,
    armed: bool,
    ticks: u64,
}

impl FrameDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the first tick. No-op when already running.
    pub fn start<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if self.running {
            return;
        }
        self.running = true;
        self.arm(scheduler);
    }

    /// Runs one tick if one is armed.
    ///
    /// Notifications that arrive while stopped are ignored and return
    /// `Continue`.
    pub fn tick<S, F>(&mut self, scheduler: &mut S, f: F) -> AppControl
    where
        S: FrameScheduler + ?Sized,
        F: FnOnce() -> AppControl,
    {
        if !self.running {
            log::trace!("frame notification while stopped; ignored");
            return AppControl::Continue;
        }
        if !self.armed {
            log::error!("frame notification without an armed tick; ignored");
            return AppControl::Continue;
        }

        self.armed = false;
        let control = f();
        self.ticks += 1;

        match control {
            AppControl::Continue if self.running => self.arm(scheduler),
            AppControl::Continue => {}
            AppControl::Exit => self.stop(),
        }
        control
    }

    /// Stops re-arming. A tick already requested from the scheduler is dropped
    /// when it arrives.
    pub fn stop(&mut self) {
        if self.running {
            log::debug!("frame driver stopped after {} tick(s)", self.ticks);
        }
        self.running = false;
        self.armed = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    fn arm<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S) {
        self.armed = true;
        scheduler.request_next_tick();
    }
}

/// Drives up to `max_ticks` ticks back to back with a [`ManualScheduler`].
///
/// `f` receives the clock's snapshot for each tick. Returns the number of
/// ticks run; fewer than `max_ticks` means a tick returned `Exit`.
pub fn run_ticks<F>(clock: &mut FrameClock, max_ticks: u64, mut f: F) -> u64
where
    F: FnMut(FrameTime) -> AppControl,
{
    let mut driver = FrameDriver::new();
    let mut scheduler = ManualScheduler::default();
    driver.start(&mut scheduler);

    while driver.ticks() < max_ticks && scheduler.take_request() {
        driver.tick(&mut scheduler, || f(clock.tick()));
    }
    driver.stop();
    driver.ticks()
}
