use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::error::FrameError;
use crate::host::SurfaceId;

/// Identity of one frame loop (unique per session).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoopId(pub u64);

impl fmt::Display for LoopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loop#{}", self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoopStatus {
    Running,
    /// Cancelled through a handle, replaced by a newer setup, or removed.
    Stopped,
    /// Stopped by a render failure under `FailurePolicy::StopOnError`.
    Failed,
}

#[derive(Debug)]
struct LoopState {
    status: Cell<LoopStatus>,
    error: RefCell<Option<FrameError>>,
    rendered: Cell<u64>,
    skipped: Cell<u64>,
}

/// Caller-side view of a frame loop: stop token plus status.
///
/// Cloning yields another handle to the same loop.
#[derive(Debug, Clone)]
pub struct LoopHandle {
    id: LoopId,
    surface: SurfaceId,
    state: Rc<LoopState>,
}

impl LoopHandle {
    pub(crate) fn new(id: LoopId, surface: SurfaceId) -> Self {
        Self {
            id,
            surface,
            state: Rc::new(LoopState {
                status: Cell::new(LoopStatus::Running),
                error: RefCell::new(None),
                rendered: Cell::new(0),
                skipped: Cell::new(0),
            }),
        }
    }

    pub fn id(&self) -> LoopId {
        self.id
    }

    pub fn surface(&self) -> &SurfaceId {
        &self.surface
    }

    /// Requests cancellation. The loop neither draws nor reschedules after
    /// this returns. Has no effect on a loop that already ended.
    pub fn stop(&self) {
        if self.state.status.get() == LoopStatus::Running {
            self.state.status.set(LoopStatus::Stopped);
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.status.get() == LoopStatus::Running
    }

    pub fn status(&self) -> LoopStatus {
        self.state.status.get()
    }

    /// Takes the terminal error, if the loop failed.
    pub fn take_error(&self) -> Option<FrameError> {
        self.state.error.borrow_mut().take()
    }

    /// Render calls that returned successfully.
    pub fn frames_rendered(&self) -> u64 {
        self.state.rendered.get()
    }

    /// Ticks that did not produce a frame (no context, or a skipped failure).
    pub fn frames_skipped(&self) -> u64 {
        self.state.skipped.get()
    }

    pub(crate) fn fail(&self, error: FrameError) {
        self.state.status.set(LoopStatus::Failed);
        *self.state.error.borrow_mut() = Some(error);
    }

    pub(crate) fn record_rendered(&self) {
        self.state.rendered.set(self.state.rendered.get() + 1);
    }

    pub(crate) fn record_skipped(&self) {
        self.state.skipped.set(self.state.skipped.get() + 1);
    }
}
