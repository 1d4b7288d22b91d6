//! Desktop implementation of [`Host`]: surfaces are windows backed by a
//! [`Canvas`], images come from local files.

use std::cell::RefCell;
use std::collections::HashMap;

use anyhow::Context as _;
use image::RgbaImage;

use crate::canvas::Canvas;
use crate::host::{Host, ImageRequest, ImageSource, SurfaceId};

/// Surface handle resolved by [`DesktopHost`].
#[derive(Debug, Clone)]
pub struct DesktopSurface {
    pub id: SurfaceId,
    pub canvas: Canvas,
}

/// Host backed by the window runtime.
///
/// The runtime registers one canvas per window and drains frame requests
/// once per event-loop iteration.
#[derive(Debug, Default)]
pub struct DesktopHost {
    surfaces: RefCell<HashMap<SurfaceId, Canvas>>,
    pending: RefCell<Vec<SurfaceId>>,
}

impl DesktopHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `id` resolvable, backed by a canvas of the given size.
    pub fn register_surface(&self, id: SurfaceId, width: u32, height: u32) -> Canvas {
        let canvas = Canvas::new(width, height);
        if self
            .surfaces
            .borrow_mut()
            .insert(id.clone(), canvas.clone())
            .is_some()
        {
            log::warn!("surface `{id}` registered twice; previous canvas dropped");
        }
        canvas
    }

    pub fn unregister_surface(&self, id: &SurfaceId) -> bool {
        self.pending.borrow_mut().retain(|s| s != id);
        self.surfaces.borrow_mut().remove(id).is_some()
    }

    /// Resizes the canvas of `id`. A zero-sized canvas has no drawing context.
    pub fn resize_surface(&self, id: &SurfaceId, width: u32, height: u32) {
        if let Some(canvas) = self.surfaces.borrow().get(id) {
            canvas.resize(width, height);
        }
    }

    pub fn canvas(&self, id: &SurfaceId) -> Option<Canvas> {
        self.surfaces.borrow().get(id).cloned()
    }

    /// Frame requests queued since the last call, deduplicated, in request
    /// order.
    pub fn take_frame_requests(&self) -> Vec<SurfaceId> {
        let mut pending = self.pending.borrow_mut();
        let mut out: Vec<SurfaceId> = Vec::with_capacity(pending.len());
        for id in pending.drain(..) {
            if !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }
}

impl Host for DesktopHost {
    type Surface = DesktopSurface;
    type Image = RgbaImage;
    type Context = Canvas;

    fn resolve_surface(&self, id: &SurfaceId) -> Option<DesktopSurface> {
        let canvas = self.canvas(id)?;
        Some(DesktopSurface {
            id: id.clone(),
            canvas,
        })
    }

    async fn fetch_image(&self, request: &ImageRequest) -> anyhow::Result<RgbaImage> {
        match request.source() {
            ImageSource::File(path) => {
                let image = image::open(path)
                    .with_context(|| format!("failed to decode {}", path.display()))?;
                Ok(image.to_rgba8())
            }
            other => anyhow::bail!(
                "{} images are not supported by the desktop host",
                other.kind()
            ),
        }
    }

    fn drawing_context(&self, surface: &DesktopSurface) -> Option<Canvas> {
        // Minimised windows report a zero size.
        (!surface.canvas.is_empty()).then(|| surface.canvas.clone())
    }

    fn request_frame(&self, surface: &SurfaceId) {
        self.pending.borrow_mut().push(surface.clone());
    }
}
