//! Rendering engine boundary.
//!
//! The engine is an opaque, stateful collaborator: the host instantiates it
//! once, uploads textures into it and asks it to draw one frame per tick.
//! How it draws is entirely its own business.

mod bootstrap;

use std::cell::{RefCell, RefMut};
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use crate::time::FrameTime;

pub use bootstrap::Bootstrap;

/// Id of a texture uploaded into the engine.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tex#{}", self.0)
    }
}

/// Engine contract.
///
/// Calls are synchronous and never overlap: the session serializes them.
pub trait Engine {
    /// Decoded image accepted by [`Engine::load_texture`].
    type Image;

    /// Drawing context accepted by [`Engine::render`].
    type Context;

    /// One-time synchronous setup, run right after instantiation.
    fn initialize(&mut self);

    /// Takes ownership of a decoded image and returns its texture id.
    fn load_texture(&mut self, image: Self::Image) -> anyhow::Result<TextureId>;

    /// Draws one frame of `texture` into `ctx`.
    fn render(
        &mut self,
        texture: TextureId,
        ctx: &mut Self::Context,
        time: &FrameTime,
    ) -> anyhow::Result<()>;

    /// Frees a texture that will not be rendered again.
    fn release_texture(&mut self, texture: TextureId) {
        let _ = texture;
    }
}

/// Asynchronous loader for an [`Engine`] (module fetch/compile, device
/// acquisition, ...).
pub trait EngineModule {
    type Engine: Engine;

    fn instantiate(&self) -> impl Future<Output = anyhow::Result<Self::Engine>>;
}

/// Shared handle to the initialized engine.
pub struct EngineHandle<E>(Rc<RefCell<E>>);

impl<E> EngineHandle<E> {
    pub(crate) fn new(engine: E) -> Self {
        Self(Rc::new(RefCell::new(engine)))
    }

    /// Runs `f` with exclusive access to the engine.
    ///
    /// Panics if called re-entrantly from inside another engine call.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut E) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }

    /// Borrows the engine for inspection.
    pub fn borrow_mut(&self) -> RefMut<'_, E> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<E> Clone for EngineHandle<E> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<E> fmt::Debug for EngineHandle<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle")
            .field("refs", &Rc::strong_count(&self.0))
            .finish()
    }
}
