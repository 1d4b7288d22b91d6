//! Session configuration.

use std::time::Duration;

use crate::host::CrossOrigin;
use crate::time::FrameClock;

/// What a frame loop does when the engine's render call fails.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum FailurePolicy {
    /// Log (rate limited) and keep ticking; the surface keeps its last good frame.
    #[default]
    SkipAndContinue,
    /// Stop the loop and report `FrameError::RenderFatal` through its handle.
    StopOnError,
}

/// Session-wide settings.
///
/// Keep this small; per-surface state lives in the registry.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Render failure handling for every frame loop.
    pub failure_policy: FailurePolicy,

    /// Repeated per-frame problems (missing context, skipped render errors)
    /// are logged on the first occurrence and then once every `log_every`
    /// consecutive occurrences. `0` is treated as `1`.
    pub log_every: u32,

    /// Credentials mode used for image requests.
    pub cross_origin: CrossOrigin,

    /// Lower clamp for frame delta time.
    pub dt_min: Duration,

    /// Upper clamp for frame delta time.
    pub dt_max: Duration,
}

impl HostConfig {
    pub fn frame_clock(&self) -> FrameClock {
        FrameClock::with_clamps(self.dt_min, self.dt_max.max(self.dt_min))
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::SkipAndContinue,
            // About two seconds at 60 Hz.
            log_every: 120,
            cross_origin: CrossOrigin::Anonymous,
            dt_min: FrameClock::DEFAULT_DT_MIN,
            dt_max: FrameClock::DEFAULT_DT_MAX,
        }
    }
}
