//! Error taxonomy for setup and steady-state rendering.

use std::error::Error as StdError;
use std::fmt::Write as _;

use crate::host::SurfaceId;

/// Failures of `Session::setup`. None of them leave a frame loop running.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// Engine module instantiation failed. The bootstrap guard stays empty,
    /// so a later setup retries.
    #[error("engine initialization failed")]
    EngineInitFailed(#[source] anyhow::Error),

    /// The surface key does not resolve to a drawable target. No fetch was
    /// attempted.
    #[error("surface `{0}` not found")]
    SurfaceNotFound(SurfaceId),

    /// The image could not be fetched, decoded or uploaded.
    #[error("failed to load image `{image}`")]
    ResourceLoadError {
        image: String,
        #[source]
        reason: anyhow::Error,
    },

    /// A newer setup for the same surface started while this one was loading.
    #[error("setup for surface `{surface}` was superseded by a newer request")]
    Superseded { surface: SurfaceId },
}

impl SetupError {
    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SetupError::EngineInitFailed(_) | SetupError::ResourceLoadError { .. }
        )
    }
}

/// Terminal failures of a running frame loop.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("render failed on surface `{surface}` at frame {frame}")]
    RenderFatal {
        surface: SurfaceId,
        frame: u64,
        #[source]
        reason: anyhow::Error,
    },
}

/// Formats an error with its whole source chain on one line.
pub fn report(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = write!(out, ": {cause}");
        source = cause.source();
    }
    out
}
