//! wgpu device and window surface.
//!
//! One [`Gpu`] per window. It owns the device/queue pair, keeps the surface
//! configured to the window size and hands out [`GpuFrame`]s.

mod frame;
mod gpu;
mod init;
mod surface;

pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use init::GpuInit;
pub use surface::SurfaceErrorAction;
