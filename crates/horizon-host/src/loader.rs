//! Resource loading: surface lookup, image fetch and one-shot texture upload.

use crate::engine::{Engine, EngineHandle, TextureId};
use crate::error::SetupError;
use crate::host::{Host, ImageRequest, SurfaceId};

/// A texture uploaded for a specific surface, ready to be drawn.
#[derive(Debug, Clone)]
pub struct LoadedTexture<S> {
    pub surface_id: SurfaceId,
    pub surface: S,
    pub texture: TextureId,
}

/// Resolves `surface_id`, fetches the requested image and uploads it into
/// the engine.
///
/// The surface is resolved before anything is fetched. The upload happens
/// exactly once, after the image is fully available.
pub async fn load_texture<H, E>(
    host: &H,
    engine: &EngineHandle<E>,
    surface_id: &SurfaceId,
    request: &ImageRequest,
) -> Result<LoadedTexture<H::Surface>, SetupError>
where
    H: Host,
    E: Engine<Image = H::Image>,
{
    let surface = host
        .resolve_surface(surface_id)
        .ok_or_else(|| SetupError::SurfaceNotFound(surface_id.clone()))?;

    log::debug!(
        "surface `{surface_id}`: fetching {} image `{}` ({})",
        request.source().kind(),
        request.raw(),
        request.cross_origin().as_str()
    );

    let image = host
        .fetch_image(request)
        .await
        .map_err(|reason| SetupError::ResourceLoadError {
            image: request.raw().to_string(),
            reason,
        })?;

    let texture = engine
        .with_mut(|engine| engine.load_texture(image))
        .map_err(|reason| SetupError::ResourceLoadError {
            image: request.raw().to_string(),
            reason: reason.context("texture upload rejected"),
        })?;

    log::debug!("surface `{surface_id}`: uploaded `{}` as {texture}", request.raw());

    Ok(LoadedTexture {
        surface_id: surface_id.clone(),
        surface,
        texture,
    })
}
