//! Horizon host crate.
//!
//! Drives an opaque rendering engine on host-provided surfaces: the engine is
//! initialized once ([`engine::Bootstrap`]), each surface gets one texture
//! ([`loader`]) and a frame loop that renders it on every host tick
//! ([`frame`]). [`Session`] ties the three together.
//!
//! The desktop host ([`desktop`], [`window`], [`device`], [`present`]) runs
//! sessions in winit windows, presenting a CPU [`canvas`] through wgpu.

pub mod config;
pub mod engine;
pub mod error;
pub mod frame;
pub mod host;
pub mod loader;
pub mod registry;
mod session;
pub mod time;

pub mod canvas;
pub mod core;
pub mod desktop;
pub mod device;
pub mod present;
pub mod window;

pub mod logging;

pub use config::{FailurePolicy, HostConfig};
pub use error::{FrameError, SetupError};
pub use session::Session;
