//! Time subsystem.
//!
//! Frame timing is driven by timestamps supplied by the host (the per-frame
//! callback's notion of "now"), so the same clock works for real event loops
//! and for scripted ticks in tests.
//!
//! Intended usage:
//! - one `FrameClock` per frame loop
//! - call `tick(now)` once per tick to obtain `FrameTime`

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime, MonotonicClock};
