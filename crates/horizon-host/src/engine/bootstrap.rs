use std::cell::Cell;

use tokio::sync::OnceCell;

use super::{Engine, EngineHandle, EngineModule};
use crate::error::SetupError;

/// Guards one-time engine instantiation.
///
/// The first `ensure_ready` awaits [`EngineModule::instantiate`] and then runs
/// [`Engine::initialize`]; every later call returns the same handle. Callers
/// that arrive while the first instantiation is in flight wait for it instead
/// of starting another one. A failed attempt leaves the guard empty, so the
/// next call tries again.
pub struct Bootstrap<M: EngineModule> {
    module: M,
    engine: OnceCell<EngineHandle<M::Engine>>,
    attempts: Cell<u32>,
}

impl<M: EngineModule> Bootstrap<M> {
    pub fn new(module: M) -> Self {
        Self {
            module,
            engine: OnceCell::new(),
            attempts: Cell::new(0),
        }
    }

    pub async fn ensure_ready(&self) -> Result<EngineHandle<M::Engine>, SetupError> {
        let handle = self.engine.get_or_try_init(|| self.instantiate()).await?;
        Ok(handle.clone())
    }

    /// The engine, if it has been initialized.
    pub fn get(&self) -> Option<EngineHandle<M::Engine>> {
        self.engine.get().cloned()
    }

    pub fn is_ready(&self) -> bool {
        self.engine.initialized()
    }

    /// Number of instantiation attempts made so far (successful or not).
    pub fn attempts(&self) -> u32 {
        self.attempts.get()
    }

    pub fn module(&self) -> &M {
        &self.module
    }

    async fn instantiate(&self) -> Result<EngineHandle<M::Engine>, SetupError> {
        let attempt = self.attempts.get() + 1;
        self.attempts.set(attempt);
        log::debug!("instantiating engine module (attempt {attempt})");

        let mut engine = self.module.instantiate().await.map_err(|err| {
            log::warn!("engine module instantiation failed (attempt {attempt}): {err:#}");
            SetupError::EngineInitFailed(err)
        })?;

        engine.initialize();
        log::info!("engine ready after {attempt} attempt(s)");

        Ok(EngineHandle::new(engine))
    }
}
