use std::collections::HashMap;

use horizon_host::Session;
use horizon_host::core::{App, AppControl, FrameCtx};
use horizon_host::desktop::DesktopHost;
use horizon_host::frame::{LoopHandle, TickOutcome};
use horizon_host::host::SurfaceId;
use horizon_host::window::RuntimeCtx;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::cli::SurfaceArg;
use crate::engine::SkyModule;
use crate::input::InputMapper;

pub struct StudioApp {
    session: Session<DesktopHost, SkyModule>,
    requested: Vec<SurfaceArg>,
    loops: HashMap<SurfaceId, LoopHandle>,
    input: InputMapper,
}

impl StudioApp {
    pub fn new(session: Session<DesktopHost, SkyModule>, requested: Vec<SurfaceArg>) -> Self {
        Self {
            session,
            requested,
            loops: HashMap::new(),
            input: InputMapper::new(),
        }
    }

    fn report_end(&mut self, surface: &SurfaceId) {
        let Some(handle) = self.loops.remove(surface) else {
            return;
        };
        match handle.take_error() {
            Some(err) => log::error!(
                "{}: {}",
                handle.id(),
                horizon_host::error::report(&err)
            ),
            None => log::info!(
                "surface `{surface}`: stopped after {} frames ({} skipped)",
                handle.frames_rendered(),
                handle.frames_skipped()
            ),
        }
    }
}

impl App for StudioApp {
    fn host(&self) -> &DesktopHost {
        self.session.host()
    }

    fn on_start(&mut self, runtime: &mut RuntimeCtx) -> AppControl {
        for arg in &self.requested {
            // Desktop fetches complete synchronously; block_on only drives
            // the setup state machine.
            match pollster::block_on(self.session.setup(arg.id.clone(), &arg.image)) {
                Ok(handle) => {
                    self.loops.insert(arg.id.clone(), handle);
                }
                Err(_) => runtime.close_surface(arg.id.clone()),
            }
        }

        if self.loops.is_empty() {
            log::error!("no surface could be set up; exiting");
            return AppControl::Exit;
        }
        AppControl::Continue
    }

    fn on_window_event(&mut self, surface: &SurfaceId, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::CloseRequested => {
                self.session.stop(surface);
                self.input.forget(surface);
                self.report_end(surface);
                AppControl::Continue
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                AppControl::Exit
            }
            _ => {
                // The camera lives in the engine; commands reach it once a
                // setup has instantiated it.
                if let Some(input) = self.input.map(surface, event) {
                    if let Some(engine) = self.session.engine() {
                        engine.with_mut(|engine| engine.apply(input));
                    }
                }
                AppControl::Continue
            }
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        let surface = ctx.window.surface;
        match self.session.tick(surface, ctx.now) {
            TickOutcome::Stopped | TickOutcome::Failed => {
                self.report_end(surface);
                self.input.forget(surface);
                ctx.runtime.close_surface(surface.clone());
            }
            TickOutcome::Rendered
            | TickOutcome::Skipped
            | TickOutcome::Idle
            | TickOutcome::NoLoop => {}
        }
        AppControl::Continue
    }
}

impl Drop for StudioApp {
    fn drop(&mut self) {
        self.session.stop_all();
        let surfaces: Vec<SurfaceId> = self.loops.keys().cloned().collect();
        for surface in surfaces {
            self.report_end(&surface);
        }
    }
}
