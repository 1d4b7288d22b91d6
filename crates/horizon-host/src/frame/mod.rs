//! Per-surface frame loops.
//!
//! A loop issues at most one render call per host tick and asks the host for
//! the next tick only after the current one finished. Loops are cancelled
//! through their [`LoopHandle`].

mod frame_loop;
mod handle;
mod throttle;

pub use frame_loop::{FrameLoop, TickOutcome};
pub use handle::{LoopHandle, LoopId, LoopStatus};
pub use throttle::LogThrottle;
