//! Surface bindings: which frame loop currently drives each surface.
//!
//! Every setup takes a generation for its surface before it starts loading.
//! A setup may install its loop unless a newer setup already installed one,
//! or the surface was stopped after the setup began. A setup that fails
//! therefore never cancels an older one still in flight. Installing retires
//! whatever loop was bound before.

use std::collections::HashMap;

use crate::engine::Engine;
use crate::frame::{FrameLoop, LoopHandle, LoopId};
use crate::host::SurfaceId;

/// Monotonic per-surface setup counter.
pub type Generation = u64;

struct Binding<S, E> {
    /// Last generation handed out by `begin`.
    latest: Generation,
    /// Setups at or below this generation may no longer install.
    floor: Generation,
    /// Setups that began and have not settled yet.
    pending: usize,
    active: Option<FrameLoop<S, E>>,
}

impl<S, E> Binding<S, E> {
    fn new() -> Self {
        Self {
            latest: 0,
            floor: 0,
            pending: 0,
            active: None,
        }
    }

    fn is_idle(&self) -> bool {
        self.pending == 0 && self.active.is_none()
    }
}

pub struct SurfaceRegistry<S, E> {
    bindings: HashMap<SurfaceId, Binding<S, E>>,
    next_loop: u64,
}

impl<S, E: Engine> SurfaceRegistry<S, E> {
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
            next_loop: 1,
        }
    }

    /// Starts a new setup for `surface` and returns its generation.
    ///
    /// Every `begin` must be matched by one [`settle`] once the setup is
    /// over, whatever its outcome.
    ///
    /// [`settle`]: SurfaceRegistry::settle
    pub fn begin(&mut self, surface: &SurfaceId) -> Generation {
        let binding = self
            .bindings
            .entry(surface.clone())
            .or_insert_with(Binding::new);
        binding.latest += 1;
        binding.pending += 1;
        binding.latest
    }

    /// Whether the setup holding `generation` may still install its loop.
    pub fn may_install(&self, surface: &SurfaceId, generation: Generation) -> bool {
        self.bindings
            .get(surface)
            .is_some_and(|b| generation > b.floor && generation <= b.latest)
    }

    /// Marks one setup for `surface` as over. The binding is dropped once it
    /// has neither a loop nor pending setups.
    pub fn settle(&mut self, surface: &SurfaceId) {
        if let Some(binding) = self.bindings.get_mut(surface) {
            binding.pending = binding.pending.saturating_sub(1);
        }
        self.prune(surface);
    }

    pub fn next_loop_id(&mut self) -> LoopId {
        let id = LoopId(self.next_loop);
        self.next_loop += 1;
        id
    }

    /// Binds `frame_loop`, started by the setup holding `generation`, and
    /// returns the loop it replaced. Older setups can no longer install.
    ///
    /// The caller retires the returned loop.
    pub fn install(
        &mut self,
        generation: Generation,
        frame_loop: FrameLoop<S, E>,
    ) -> Option<FrameLoop<S, E>> {
        let binding = self
            .bindings
            .entry(frame_loop.surface_id().clone())
            .or_insert_with(Binding::new);
        binding.latest = binding.latest.max(generation);
        binding.floor = binding.floor.max(generation);
        binding.active.replace(frame_loop)
    }

    pub fn get_mut(&mut self, surface: &SurfaceId) -> Option<&mut FrameLoop<S, E>> {
        self.bindings.get_mut(surface)?.active.as_mut()
    }

    pub fn handle(&self, surface: &SurfaceId) -> Option<LoopHandle> {
        self.bindings
            .get(surface)?
            .active
            .as_ref()
            .map(|l| l.handle().clone())
    }

    /// Unbinds the loop from `surface`. Setups still in flight for the
    /// surface can no longer install.
    pub fn remove(&mut self, surface: &SurfaceId) -> Option<FrameLoop<S, E>> {
        let binding = self.bindings.get_mut(surface)?;
        binding.floor = binding.latest;
        let removed = binding.active.take();
        self.prune(surface);
        removed
    }

    /// Unbinds the loop `id` after it ended on its own. Unlike [`remove`],
    /// setups in flight for the surface may still install.
    ///
    /// [`remove`]: SurfaceRegistry::remove
    pub fn reap(&mut self, surface: &SurfaceId, id: LoopId) -> Option<FrameLoop<S, E>> {
        let binding = self.bindings.get_mut(surface)?;
        if !binding.active.as_ref().is_some_and(|l| l.id() == id) {
            return None;
        }
        let reaped = binding.active.take();
        self.prune(surface);
        reaped
    }

    /// Surfaces with a bound loop, sorted by id.
    pub fn surfaces(&self) -> Vec<SurfaceId> {
        let mut out: Vec<SurfaceId> = self
            .bindings
            .iter()
            .filter(|(_, b)| b.active.is_some())
            .map(|(id, _)| id.clone())
            .collect();
        out.sort();
        out
    }

    /// Unbinds every loop, invalidating all in-flight setups.
    pub fn drain(&mut self) -> Vec<FrameLoop<S, E>> {
        let mut out = Vec::new();
        for binding in self.bindings.values_mut() {
            binding.floor = binding.latest;
            if let Some(frame_loop) = binding.active.take() {
                out.push(frame_loop);
            }
        }
        self.bindings.retain(|_, b| !b.is_idle());
        out.sort_by_key(|l| l.id());
        out
    }

    fn prune(&mut self, surface: &SurfaceId) {
        if self.bindings.get(surface).is_some_and(Binding::is_idle) {
            self.bindings.remove(surface);
        }
    }
}

impl<S, E: Engine> Default for SurfaceRegistry<S, E> {
    fn default() -> Self {
        Self::new()
    }
}
