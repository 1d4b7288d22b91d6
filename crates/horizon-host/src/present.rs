//! Blits a [`Canvas`] onto a window surface.

use crate::canvas::Canvas;
use crate::core::AppControl;
use crate::device::{Gpu, SurfaceErrorAction};

struct CanvasTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
}

/// Uploads canvas pixels to a texture and draws them with a full-screen
/// triangle.
///
/// Pipeline and texture are created lazily and rebuilt when the surface
/// format or canvas size changes. Pixels are re-uploaded only when the
/// canvas revision moved.
#[derive(Default)]
pub struct CanvasPresenter {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    sampler: Option<wgpu::Sampler>,
    target: Option<CanvasTexture>,
    uploaded_revision: Option<u64>,
}

impl CanvasPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws the current canvas contents and presents the frame.
    pub fn present(&mut self, gpu: &mut Gpu<'_>, canvas: &Canvas) -> AppControl {
        let size = gpu.size();
        if size.width == 0 || size.height == 0 || canvas.is_empty() {
            return AppControl::Continue;
        }

        self.ensure_pipeline(gpu);
        self.ensure_target(gpu, canvas.width(), canvas.height());
        self.upload(gpu, canvas);

        let mut frame = match gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                return match gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => AppControl::Exit,
                    _ => AppControl::Continue,
                };
            }
        };

        {
            let (Some(pipeline), Some(target)) = (self.pipeline.as_ref(), self.target.as_ref())
            else {
                return AppControl::Continue;
            };

            let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("horizon canvas pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(0, &target.bind_group, &[]);
            rpass.draw(0..3, 0..1);
        }

        gpu.submit(frame);
        AppControl::Continue
    }

    fn ensure_pipeline(&mut self, gpu: &Gpu<'_>) {
        let format = gpu.surface_format();
        if self.pipeline_format == Some(format) && self.pipeline.is_some() {
            return;
        }
        let device = gpu.device();

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("horizon canvas shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/canvas.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("horizon canvas bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("horizon canvas pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("horizon canvas pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        if self.sampler.is_none() {
            self.sampler = Some(device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("horizon canvas sampler"),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: wgpu::FilterMode::Nearest,
                min_filter: wgpu::FilterMode::Nearest,
                mipmap_filter: wgpu::MipmapFilterMode::Nearest,
                ..Default::default()
            }));
        }

        self.pipeline_format = Some(format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bind_group_layout);
        // Bind groups belong to the old layout.
        self.target = None;
        self.uploaded_revision = None;
    }

    fn ensure_target(&mut self, gpu: &Gpu<'_>, width: u32, height: u32) {
        if self
            .target
            .as_ref()
            .is_some_and(|t| t.width == width && t.height == height)
        {
            return;
        }
        let (Some(bgl), Some(sampler)) = (self.bind_group_layout.as_ref(), self.sampler.as_ref())
        else {
            return;
        };
        let device = gpu.device();

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("horizon canvas texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("horizon canvas bind group"),
            layout: bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        self.target = Some(CanvasTexture {
            texture,
            bind_group,
            width,
            height,
        });
        self.uploaded_revision = None;
    }

    fn upload(&mut self, gpu: &Gpu<'_>, canvas: &Canvas) {
        let Some(target) = self.target.as_ref() else {
            return;
        };
        let pixels = canvas.pixels();
        if self.uploaded_revision == Some(pixels.revision())
            || pixels.width() != target.width
            || pixels.height() != target.height
        {
            return;
        }

        gpu.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels.as_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * target.width),
                rows_per_image: Some(target.height),
            },
            wgpu::Extent3d {
                width: target.width,
                height: target.height,
                depth_or_array_layers: 1,
            },
        );
        self.uploaded_revision = Some(pixels.revision());
    }
}
