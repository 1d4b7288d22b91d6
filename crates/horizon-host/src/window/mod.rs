//! winit event loop with one window per configured surface.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx, SurfaceConfig};
