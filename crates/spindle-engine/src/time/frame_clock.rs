use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous frame tick, in seconds.
    pub dt: f32,

    /// Seconds since the clock started (or was last reset).
    ///
    /// Kept as `f64` so long-running animations derived from it stay precise.
    pub elapsed: f64,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

#[derive(Debug, Clone)]
enum Source {
    /// Wall clock, delta clamped.
    Wall { last: Instant, dt_min: Duration, dt_max: Duration },
    /// Fixed step per tick, independent of real time.
    Fixed { step: Duration },
}

/// Frame clock producing `FrameTime` snapshots.
///
/// `FrameClock` is designed to be used per window (or per loop) so that multi-window
/// applications do not share delta-time state.
///
/// Delta time is clamped to avoid pathological values when the application is paused
/// by the debugger, minimized, or stalls. `elapsed` is not clamped: it is the
/// wall-clock time since start, so animations keep their real-time phase.
#[derive(Debug, Clone)]
pub struct FrameClock {
    source: Source,
    start: Instant,
    elapsed: Duration,
    frame_index: u64,
}

impl FrameClock {
    /// Creates a wall-clock clock with default clamps.
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    /// Creates a wall-clock clock with custom delta-time clamps.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        let now = Instant::now();
        Self {
            source: Source::Wall { last: now, dt_min, dt_max },
            start: now,
            elapsed: Duration::ZERO,
            frame_index: 0,
        }
    }

    /// Creates a clock that advances by exactly `step` per tick.
    ///
    /// The first tick reports `elapsed == 0`. Used for headless runs and tests.
    pub fn fixed(step: Duration) -> Self {
        Self {
            source: Source::Fixed { step },
            start: Instant::now(),
            elapsed: Duration::ZERO,
            frame_index: 0,
        }
    }

    /// Resets the clock baseline.
    ///
    /// Useful after surface reconfigure events or when resuming from suspension.
    /// Does not rewind `elapsed`.
    pub fn reset(&mut self) {
        if let Source::Wall { last, .. } = &mut self.source {
            *last = Instant::now();
        }
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();

        let dt = match &mut self.source {
            Source::Wall { last, dt_min, dt_max } => {
                let raw = now.saturating_duration_since(*last);
                *last = now;
                self.elapsed = now.saturating_duration_since(self.start);
                // Clamp delta time to keep downstream systems stable.
                raw.clamp(*dt_min, *dt_max)
            }
            Source::Fixed { step } => {
                if self.frame_index > 0 {
                    self.elapsed += *step;
                }
                *step
            }
        };

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            elapsed: self.elapsed.as_secs_f64(),
            now,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn fixed_clock_steps_exactly() {
        let mut clock = FrameClock::fixed(Duration::from_millis(250));
        let t0 = clock.tick();
        let t1 = clock.tick();
        let t2 = clock.tick();
        assert_eq!(t0.elapsed, 0.0);
        assert_relative_eq!(t1.elapsed, 0.25);
        assert_relative_eq!(t2.elapsed, 0.5);
        assert_relative_eq!(t2.dt, 0.25);
        assert_eq!(t2.frame_index, 2);
    }

    #[test]
    fn wall_clock_is_monotonic() {
        let mut clock = FrameClock::new();
        let a = clock.tick();
        let b = clock.tick();
        assert!(b.elapsed >= a.elapsed);
        assert!(b.dt >= 0.0001 - f32::EPSILON);
        assert_eq!(b.frame_index, a.frame_index + 1);
    }
}
