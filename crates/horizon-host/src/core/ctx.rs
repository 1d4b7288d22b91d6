use std::time::Duration;

use winit::window::Window;

use crate::host::SurfaceId;
use crate::window::RuntimeCtx;

/// The window being redrawn.
pub struct WindowCtx<'a> {
    pub surface: &'a SurfaceId,
    pub window: &'a Window,
}

impl WindowCtx<'_> {
    /// Physical size as `(width, height)`.
    pub fn size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }
}

/// Per-redraw context passed to [`App::on_frame`](super::App::on_frame).
pub struct FrameCtx<'a> {
    pub window: WindowCtx<'a>,
    /// Runtime timestamp for this redraw, measured from runtime start.
    pub now: Duration,
    pub runtime: &'a mut RuntimeCtx,
}
