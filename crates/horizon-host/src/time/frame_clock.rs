use std::time::{Duration, Instant};

/// Frame timing snapshot handed to the engine on every render call.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTime {
    /// Time elapsed since the previous tick, in seconds (clamped).
    pub dt: f32,

    /// Host timestamp of this tick, relative to the host's origin.
    pub now: Duration,

    /// Accumulated (clamped) time since the loop's first tick.
    pub elapsed: Duration,

    /// Monotonic tick counter, starting at 0.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots from host timestamps.
///
/// Delta time is clamped to avoid pathological values when the host stops
/// firing ticks for a while (hidden tab, minimized window, debugger pause).
/// `elapsed` is the sum of clamped deltas, so animation time does not jump
/// after a stall.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Option<Duration>,
    elapsed: Duration,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub const DEFAULT_DT_MIN: Duration = Duration::from_micros(100);
    pub const DEFAULT_DT_MAX: Duration = Duration::from_millis(250);

    pub fn new() -> Self {
        Self::with_clamps(Self::DEFAULT_DT_MIN, Self::DEFAULT_DT_MAX)
    }

    /// Creates a clock with custom delta-time clamps.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: None,
            elapsed: Duration::ZERO,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Advances the clock to `now` and returns a new `FrameTime`.
    pub fn tick(&mut self, now: Duration) -> FrameTime {
        let raw = match self.last {
            Some(last) => now.saturating_sub(last),
            None => Duration::ZERO,
        };
        let dt = raw.clamp(self.dt_min, self.dt_max);

        self.last = Some(now);
        self.elapsed += dt;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            now,
            elapsed: self.elapsed,
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

/// Host-side timestamp source for native event loops.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }

    /// Time since the clock was created.
    pub fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}
