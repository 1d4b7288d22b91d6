use std::collections::HashMap;

use anyhow::{Context, Result};
use ouroboros::self_referencing;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::canvas::Canvas;
use crate::core::{App, AppControl, FrameCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::host::SurfaceId;
use crate::present::CanvasPresenter;
use crate::time::MonotonicClock;

/// One window to open at startup.
#[derive(Debug, Clone)]
pub struct SurfaceConfig {
    /// Key the window is registered under with the host.
    pub id: SurfaceId,
    pub title: String,
    pub size: LogicalSize<f64>,
}

impl SurfaceConfig {
    pub fn new(id: impl Into<SurfaceId>) -> Self {
        let id = id.into();
        Self {
            title: format!("horizon - {id}"),
            id,
            size: LogicalSize::new(960.0, 540.0),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    pub surfaces: Vec<SurfaceConfig>,
}

/// Commands the app issues from callbacks. Applied after the callback
/// returns.
#[derive(Debug, Default)]
pub struct RuntimeCtx {
    commands: Vec<Command>,
}

impl RuntimeCtx {
    pub fn close_surface(&mut self, id: SurfaceId) {
        self.commands.push(Command::CloseSurface(id));
    }

    pub fn exit(&mut self) {
        self.commands.push(Command::Exit);
    }
}

#[derive(Debug)]
enum Command {
    CloseSurface(SurfaceId),
    Exit,
}

pub struct Runtime;

impl Runtime {
    /// Opens the configured windows and runs the event loop until the app
    /// exits or the last window closes.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        anyhow::ensure!(!config.surfaces.is_empty(), "no surfaces configured");

        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

#[self_referencing]
struct WindowEntry {
    surface: SurfaceId,
    canvas: Canvas,
    presenter: CanvasPresenter,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A: App + 'static> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    windows: HashMap<WindowId, WindowEntry>,
    by_surface: HashMap<SurfaceId, WindowId>,
    clock: MonotonicClock,
    started: bool,
    exit_requested: bool,
}

impl<A: App + 'static> AppState<A> {
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            windows: HashMap::new(),
            by_surface: HashMap::new(),
            clock: MonotonicClock::new(),
            started: false,
            exit_requested: false,
        }
    }

    fn create_window_entry(
        &mut self,
        event_loop: &ActiveEventLoop,
        config: SurfaceConfig,
    ) -> Result<WindowId> {
        anyhow::ensure!(
            !self.by_surface.contains_key(&config.id),
            "surface `{}` configured twice",
            config.id
        );

        let attrs = Window::default_attributes()
            .with_title(config.title)
            .with_inner_size(config.size);
        let window = event_loop
            .create_window(attrs)
            .with_context(|| format!("failed to create window for `{}`", config.id))?;

        let id = window.id();
        let size = window.inner_size();
        let canvas = self
            .app
            .host()
            .register_surface(config.id.clone(), size.width, size.height);
        let gpu_init = self.gpu_init.clone();

        let entry = WindowEntryTryBuilder {
            surface: config.id.clone(),
            canvas,
            presenter: CanvasPresenter::new(),
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build();

        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                self.app.host().unregister_surface(&config.id);
                return Err(err.context(format!("GPU initialization failed for `{}`", config.id)));
            }
        };

        log::debug!("surface `{}` open as window {id:?}", config.id);
        self.by_surface.insert(config.id, id);
        self.windows.insert(id, entry);
        Ok(id)
    }

    fn destroy_window_entry(&mut self, id: WindowId) {
        if let Some(entry) = self.windows.remove(&id) {
            let surface = entry.borrow_surface();
            self.by_surface.remove(surface);
            self.app.host().unregister_surface(surface);
            log::debug!("surface `{surface}` closed");
        }
        if self.windows.is_empty() {
            self.exit_requested = true;
        }
    }

    fn apply_commands(&mut self, event_loop: &ActiveEventLoop, mut ctx: RuntimeCtx) {
        for cmd in ctx.commands.drain(..) {
            match cmd {
                Command::CloseSurface(surface) => {
                    if let Some(id) = self.by_surface.get(&surface).copied() {
                        self.destroy_window_entry(id);
                    }
                }
                Command::Exit => self.exit_requested = true,
            }
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }

    fn resize(&mut self, id: WindowId, size: PhysicalSize<u32>) {
        let Some(entry) = self.windows.get_mut(&id) else {
            return;
        };
        entry.with_gpu_mut(|gpu| gpu.resize(size));
        self.app
            .host()
            .resize_surface(entry.borrow_surface(), size.width, size.height);
        entry.with_window(|w| w.request_redraw());
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop, id: WindowId) {
        let mut runtime_ctx = RuntimeCtx::default();
        let mut control = AppControl::Continue;
        let now = self.clock.now();

        // Split borrows; ouroboros closures cannot capture `self`.
        let (app, windows) = (&mut self.app, &mut self.windows);
        if let Some(entry) = windows.get_mut(&id) {
            entry.with_mut(|fields| {
                {
                    let mut ctx = FrameCtx {
                        window: WindowCtx {
                            surface: &*fields.surface,
                            window: fields.window,
                        },
                        now,
                        runtime: &mut runtime_ctx,
                    };
                    control = app.on_frame(&mut ctx);
                }

                if control == AppControl::Continue {
                    fields.window.pre_present_notify();
                    control = fields.presenter.present(fields.gpu, &*fields.canvas);
                }
            });
        }

        if control == AppControl::Exit {
            runtime_ctx.exit();
        }
        self.apply_commands(event_loop, runtime_ctx);
    }
}

impl<A: App + 'static> ApplicationHandler for AppState<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.started {
            return;
        }
        self.started = true;

        for config in self.config.surfaces.clone() {
            if let Err(e) = self.create_window_entry(event_loop, config) {
                log::error!("{e:#}");
                self.exit_requested = true;
                event_loop.exit();
                return;
            }
        }

        let mut runtime_ctx = RuntimeCtx::default();
        if self.app.on_start(&mut runtime_ctx) == AppControl::Exit {
            runtime_ctx.exit();
        }
        self.apply_commands(event_loop, runtime_ctx);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Frame requests issued by frame loops become redraws.
        for surface in self.app.host().take_frame_requests() {
            let Some(entry) = self
                .by_surface
                .get(&surface)
                .and_then(|id| self.windows.get(id))
            else {
                continue;
            };
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let Some(surface) = self.windows.get(&window_id).map(|e| e.borrow_surface().clone()) else {
            return;
        };

        if self.app.on_window_event(&surface, &event) == AppControl::Exit {
            self.exit_requested = true;
            event_loop.exit();
            return;
        }

        match &event {
            WindowEvent::CloseRequested => {
                self.destroy_window_entry(window_id);
                if self.exit_requested {
                    event_loop.exit();
                }
            }

            WindowEvent::Resized(new_size) => self.resize(window_id, *new_size),

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self.windows.get(&window_id).map(|e| e.with_window(|w| w.inner_size())) {
                    self.resize(window_id, size);
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop, window_id),

            _ => {}
        }
    }
}
