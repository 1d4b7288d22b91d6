//! Reference engine: an equirectangular sky seen from an orbit camera.

use std::collections::HashMap;
use std::f32::consts::PI;

use anyhow::Context as _;
use glam::{Vec3, Vec4};
use horizon_host::canvas::Canvas;
use horizon_host::engine::{Engine, EngineModule, TextureId};
use horizon_host::time::FrameTime;
use image::{Rgba, RgbaImage};

use crate::camera::OrbitCamera;
use crate::input::CameraInput;

const GRID_LONGITUDES: f32 = 24.0;
const GRID_LATITUDES: f32 = 12.0;
/// Half width of a grid line, degrees.
const GRID_EPS: f32 = 0.5;
const GRID_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

pub struct SkyModule {
    fov_deg: f32,
}

impl SkyModule {
    /// `fov_deg` is the initial vertical field of view.
    pub fn new(fov_deg: f32) -> Self {
        Self { fov_deg }
    }
}

impl EngineModule for SkyModule {
    type Engine = SkyEngine;

    async fn instantiate(&self) -> anyhow::Result<SkyEngine> {
        anyhow::ensure!(
            self.fov_deg.is_finite() && self.fov_deg > 0.0,
            "field of view must be a positive number of degrees, got {}",
            self.fov_deg
        );
        Ok(SkyEngine {
            initial_fov: self.fov_deg,
            camera: OrbitCamera::new(self.fov_deg),
            textures: HashMap::new(),
            next_id: 0,
            frame: RgbaImage::new(0, 0),
        })
    }
}

pub struct SkyEngine {
    initial_fov: f32,
    camera: OrbitCamera,
    textures: HashMap<TextureId, RgbaImage>,
    next_id: u64,
    /// Scratch buffer the view is traced into before it is copied to the
    /// canvas.
    frame: RgbaImage,
}

impl SkyEngine {
    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Applies one camera command. The camera is shared by every surface.
    pub fn apply(&mut self, input: CameraInput) {
        match input {
            CameraInput::Orbit {
                delta_pitch,
                delta_yaw,
            } => self.camera.rotate(delta_pitch, delta_yaw),
            CameraInput::Zoom(delta) => self.camera.zoom(delta),
            CameraInput::AdjustFov(delta) => {
                let fov = self.camera.fov_deg() + delta;
                self.camera.set_fov_deg(fov);
                log::debug!("field of view {:.0} deg", self.camera.fov_deg());
            }
            CameraInput::ToggleGrid => {
                self.camera.show_grid = !self.camera.show_grid;
                log::debug!("grid {}", if self.camera.show_grid { "on" } else { "off" });
            }
            CameraInput::Reset => self.camera = OrbitCamera::new(self.initial_fov),
        }
    }
}

impl Engine for SkyEngine {
    type Image = RgbaImage;
    type Context = Canvas;

    fn initialize(&mut self) {
        log::debug!("sky engine ready ({:.0} deg field of view)", self.camera.fov_deg());
    }

    fn load_texture(&mut self, image: RgbaImage) -> anyhow::Result<TextureId> {
        let (w, h) = image.dimensions();
        anyhow::ensure!(w > 0 && h > 0, "image is empty ({w}x{h})");

        self.next_id += 1;
        let id = TextureId(self.next_id);
        self.textures.insert(id, image);
        log::debug!("{id}: {w}x{h} sky map");
        Ok(id)
    }

    fn render(&mut self, texture: TextureId, ctx: &mut Canvas, _time: &FrameTime) -> anyhow::Result<()> {
        let sky = self
            .textures
            .get(&texture)
            .with_context(|| format!("{texture} is not loaded"))?;
        let (width, height) = (ctx.width(), ctx.height());
        if width == 0 || height == 0 {
            return Ok(());
        }
        if self.frame.dimensions() != (width, height) {
            self.frame = RgbaImage::new(width, height);
        }

        trace_sky(&self.camera, sky, &mut self.frame);
        ctx.draw(|pixmap| pixmap.put_image(&self.frame, 0, 0));
        Ok(())
    }

    fn release_texture(&mut self, texture: TextureId) {
        if self.textures.remove(&texture).is_some() {
            log::debug!("{texture} released");
        }
    }
}

/// Casts one ray per pixel of `out` and samples the equirectangular `sky`.
fn trace_sky(camera: &OrbitCamera, sky: &RgbaImage, out: &mut RgbaImage) {
    let (width, height) = out.dimensions();
    let (sw, sh) = (sky.width() as f32, sky.height() as f32);
    let inv = camera.inverse_view_projection(width as f32 / height as f32);

    for (x, y, px) in out.enumerate_pixels_mut() {
        let ndc_x = (x as f32 + 0.5) / width as f32 * 2.0 - 1.0;
        let ndc_y = 1.0 - (y as f32 + 0.5) / height as f32 * 2.0;
        let far = inv * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        let dir = (Vec3::new(far.x, far.y, far.z) / far.w).normalize();

        let lon = dir.x.atan2(dir.z);
        let lat = dir.y.clamp(-1.0, 1.0).asin();

        if camera.show_grid && on_grid(lon, lat) {
            *px = GRID_COLOR;
            continue;
        }

        let u = lon * (0.5 / PI) + 0.5;
        let v = 0.5 - lat / PI;
        let sx = (u * sw).clamp(0.0, sw - 1.0) as u32;
        let sy = (v * sh).clamp(0.0, sh - 1.0) as u32;
        *px = *sky.get_pixel(sx, sy);
    }
}

fn on_grid(lon: f32, lat: f32) -> bool {
    let near = |deg: f32, step: f32| {
        let r = deg.abs() % step;
        r < GRID_EPS || r > step - GRID_EPS
    };
    near(lon.to_degrees(), 360.0 / GRID_LONGITUDES) || near(lat.to_degrees(), 180.0 / GRID_LATITUDES)
}
