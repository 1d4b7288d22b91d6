use winit::event::WindowEvent;

use super::ctx::FrameCtx;
use crate::desktop::DesktopHost;
use crate::host::SurfaceId;
use crate::window::RuntimeCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application driven by [`Runtime`](crate::window::Runtime).
pub trait App {
    /// Host the runtime registers its windows with and drains frame
    /// requests from.
    fn host(&self) -> &DesktopHost;

    /// Called once, after every configured window exists and is registered
    /// with the host.
    fn on_start(&mut self, runtime: &mut RuntimeCtx) -> AppControl;

    fn on_window_event(&mut self, surface: &SurfaceId, event: &WindowEvent) -> AppControl {
        let _ = (surface, event);
        AppControl::Continue
    }

    /// Called for every redraw of a window, before its canvas is presented.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl;
}
