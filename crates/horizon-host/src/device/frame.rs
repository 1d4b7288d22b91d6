/// One acquired swapchain image plus the encoder recording into it.
///
/// [`Gpu::submit`](super::Gpu::submit) consumes the frame, submits the
/// encoder and presents the surface texture. Dropping a frame without
/// submitting it discards the image.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
