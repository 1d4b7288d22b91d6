//! Public entry point: bootstrap, load and start, per surface.

use std::cell::RefCell;
use std::time::Duration;

use crate::config::HostConfig;
use crate::engine::{Bootstrap, Engine, EngineHandle, EngineModule};
use crate::error::{self, SetupError};
use crate::frame::{FrameLoop, LoopHandle, TickOutcome};
use crate::host::{Host, ImageRequest, SurfaceId};
use crate::loader;
use crate::registry::SurfaceRegistry;

type Registry<H, M> = SurfaceRegistry<<H as Host>::Surface, <M as EngineModule>::Engine>;

/// Settles a setup's registry entry when the setup ends, including when its
/// future is dropped mid-flight.
struct PendingSetup<'a, S, E: Engine> {
    registry: &'a RefCell<SurfaceRegistry<S, E>>,
    surface: &'a SurfaceId,
}

impl<S, E: Engine> Drop for PendingSetup<'_, S, E> {
    fn drop(&mut self) {
        self.registry.borrow_mut().settle(self.surface);
    }
}

/// Drives one engine over any number of host surfaces.
///
/// All methods take `&self`. Interior borrows are never held across an
/// `.await`, so the host may deliver ticks while a setup is suspended.
pub struct Session<H, M>
where
    H: Host,
    M: EngineModule,
{
    host: H,
    bootstrap: Bootstrap<M>,
    registry: RefCell<Registry<H, M>>,
    config: HostConfig,
}

impl<H, M> Session<H, M>
where
    H: Host,
    M: EngineModule,
    M::Engine: Engine<Image = H::Image, Context = H::Context>,
{
    pub fn new(host: H, module: M, config: HostConfig) -> Self {
        Self {
            host,
            bootstrap: Bootstrap::new(module),
            registry: RefCell::new(SurfaceRegistry::new()),
            config,
        }
    }

    /// Initializes the engine (once), loads `image_source` for `surface_id`
    /// and starts its frame loop.
    ///
    /// A loop already bound to the surface is replaced. No loop is started
    /// on error.
    pub async fn setup(
        &self,
        surface_id: impl Into<SurfaceId>,
        image_source: &str,
    ) -> Result<LoopHandle, SetupError> {
        let surface_id = surface_id.into();
        let result = self.try_setup(&surface_id, image_source).await;

        match &result {
            Ok(handle) => log::info!(
                "surface `{surface_id}`: {} started with `{image_source}`",
                handle.id()
            ),
            Err(err @ SetupError::Superseded { .. }) => log::info!("{err}"),
            Err(err) => log::error!("setup failed: {}", error::report(err)),
        }

        result
    }

    async fn try_setup(
        &self,
        surface_id: &SurfaceId,
        image_source: &str,
    ) -> Result<LoopHandle, SetupError> {
        let generation = self.registry.borrow_mut().begin(surface_id);
        let _pending = PendingSetup {
            registry: &self.registry,
            surface: surface_id,
        };

        let engine = self.bootstrap.ensure_ready().await?;
        let request = ImageRequest::new(image_source, self.config.cross_origin);
        let loaded = loader::load_texture(&self.host, &engine, surface_id, &request).await?;

        let mut registry = self.registry.borrow_mut();
        if !registry.may_install(surface_id, generation) {
            drop(registry);
            engine.with_mut(|e| e.release_texture(loaded.texture));
            return Err(SetupError::Superseded {
                surface: surface_id.clone(),
            });
        }

        let id = registry.next_loop_id();
        let (mut frame_loop, handle) = FrameLoop::start(
            id,
            loaded.surface_id,
            loaded.surface,
            loaded.texture,
            engine,
            &self.config,
        );
        frame_loop.schedule(&self.host);
        let previous = registry.install(generation, frame_loop);
        drop(registry);

        if let Some(previous) = previous {
            previous.retire();
        }

        Ok(handle)
    }

    /// Delivers one host tick to the loop bound to `surface_id`.
    ///
    /// Loops that end during the tick are unbound and their texture released.
    pub fn tick(&self, surface_id: &SurfaceId, now: Duration) -> TickOutcome {
        let mut registry = self.registry.borrow_mut();
        let Some(frame_loop) = registry.get_mut(surface_id) else {
            return TickOutcome::NoLoop;
        };

        let outcome = frame_loop.tick(&self.host, now);
        if outcome.is_terminal() {
            let id = frame_loop.id();
            let ended = registry.reap(surface_id, id);
            drop(registry);
            if let Some(ended) = ended {
                ended.retire();
            }
        }
        outcome
    }

    /// Stops and unbinds the loop on `surface_id`. Setups still loading for
    /// that surface will not start. Returns whether a loop was bound.
    pub fn stop(&self, surface_id: &SurfaceId) -> bool {
        let removed = self.registry.borrow_mut().remove(surface_id);
        match removed {
            Some(frame_loop) => {
                frame_loop.retire();
                true
            }
            None => false,
        }
    }

    pub fn stop_all(&self) {
        let loops = self.registry.borrow_mut().drain();
        if !loops.is_empty() {
            log::debug!("stopping {} frame loop(s)", loops.len());
        }
        for frame_loop in loops {
            frame_loop.retire();
        }
    }

    pub fn active_surfaces(&self) -> Vec<SurfaceId> {
        self.registry.borrow().surfaces()
    }

    pub fn handle(&self, surface_id: &SurfaceId) -> Option<LoopHandle> {
        self.registry.borrow().handle(surface_id)
    }

    /// The engine, once a setup initialized it.
    pub fn engine(&self) -> Option<EngineHandle<M::Engine>> {
        self.bootstrap.get()
    }

    pub fn bootstrap(&self) -> &Bootstrap<M> {
        &self.bootstrap
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }
}
