use winit::window::Window;

/// Source of "time to draw the next frame" notifications.
pub trait FrameScheduler {
    /// Asks for exactly one future tick.
    fn request_next_tick(&mut self);
}

/// Schedules ticks through winit redraw requests.
pub struct WindowScheduler<'a> {
    window: &'a Window,
}

impl<'a> WindowScheduler<'a> {
    pub fn new(window: &'a Window) -> Self {
        Self { window }
    }
}

impl FrameScheduler for WindowScheduler<'_> {
    fn request_next_tick(&mut self) {
        self.window.request_redraw();
    }
}

/// Scheduler for headless loops and tests: requests are counted and consumed
/// by the caller.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    pending: u32,
    requests: u64,
}

impl ManualScheduler {
    /// Consumes one pending request.
    pub fn take_request(&mut self) -> bool {
        if self.pending == 0 {
            return false;
        }
        self.pending -= 1;
        true
    }

    /// Requests not yet consumed.
    pub fn pending(&self) -> u32 {
        self.pending
    }

    /// Requests received since creation.
    pub fn requests(&self) -> u64 {
        self.requests
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_next_tick(&mut self) {
        self.pending += 1;
        self.requests += 1;
    }
}
