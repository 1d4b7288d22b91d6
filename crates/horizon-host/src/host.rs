//! Host environment contract.
//!
//! The host owns everything platform specific: the drawable surfaces, image
//! fetching and decoding, 2D drawing-context acquisition and the per-frame
//! scheduling primitive. The core only talks to it through [`Host`].

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::str::FromStr;

/// String key identifying a drawable surface (a canvas, a window).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(String);

impl SurfaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SurfaceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SurfaceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&SurfaceId> for SurfaceId {
    fn from(value: &SurfaceId) -> Self {
        value.clone()
    }
}

/// Credentials mode for image requests.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum CrossOrigin {
    /// No cookies or client certificates are sent.
    #[default]
    Anonymous,
}

impl CrossOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            CrossOrigin::Anonymous => "anonymous",
        }
    }
}

/// Where an image comes from.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ImageSource {
    /// Local file (bare path or `file://` URL).
    File(PathBuf),
    /// `http://` or `https://` URL.
    Remote(String),
    /// Inline `data:` URI.
    Data(String),
}

impl ImageSource {
    pub fn parse(source: &str) -> Self {
        let trimmed = source.trim();
        let lower = trimmed.to_ascii_lowercase();

        if let Some(path) = strip_prefix_ci(trimmed, &lower, "file://") {
            ImageSource::File(PathBuf::from(path))
        } else if lower.starts_with("http://") || lower.starts_with("https://") {
            ImageSource::Remote(trimmed.to_string())
        } else if lower.starts_with("data:") {
            ImageSource::Data(trimmed.to_string())
        } else {
            ImageSource::File(PathBuf::from(trimmed))
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ImageSource::File(_) => "file",
            ImageSource::Remote(_) => "remote",
            ImageSource::Data(_) => "data",
        }
    }
}

fn strip_prefix_ci<'a>(original: &'a str, lower: &str, prefix: &str) -> Option<&'a str> {
    lower
        .starts_with(prefix)
        .then(|| &original[prefix.len()..])
}

impl FromStr for ImageSource {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ImageSource::parse(s))
    }
}

/// One image fetch: the source string as given, its parsed form and the
/// credentials mode.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ImageRequest {
    raw: String,
    source: ImageSource,
    cross_origin: CrossOrigin,
}

impl ImageRequest {
    pub fn new(raw: impl Into<String>, cross_origin: CrossOrigin) -> Self {
        let raw = raw.into();
        let source = ImageSource::parse(&raw);
        Self {
            raw,
            source,
            cross_origin,
        }
    }

    /// The source string exactly as the caller supplied it.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    pub fn cross_origin(&self) -> CrossOrigin {
        self.cross_origin
    }
}

/// Platform collaborator driven by the session.
///
/// All methods are called from the thread that owns the session; none of them
/// may call back into the session synchronously.
pub trait Host {
    /// Resolved drawable target.
    type Surface: Clone;

    /// Decoded image handed to the engine for upload.
    type Image;

    /// 2D drawing context passed to the engine's render call.
    type Context;

    /// Looks up a surface by key. `None` means the surface does not exist.
    fn resolve_surface(&self, id: &SurfaceId) -> Option<Self::Surface>;

    /// Fetches and decodes an image. Resolves exactly once, with the image or
    /// the reason it could not be loaded.
    fn fetch_image(
        &self,
        request: &ImageRequest,
    ) -> impl Future<Output = anyhow::Result<Self::Image>>;

    /// Acquires the drawing context for a surface, if it is currently
    /// available.
    fn drawing_context(&self, surface: &Self::Surface) -> Option<Self::Context>;

    /// Asks the host to deliver one tick for `surface` on its next frame.
    fn request_frame(&self, surface: &SurfaceId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_local_paths() {
        assert_eq!(
            ImageSource::parse("assets/stars_2k.jpg"),
            ImageSource::File(PathBuf::from("assets/stars_2k.jpg"))
        );
        assert_eq!(
            ImageSource::parse("FILE:///tmp/sky.png"),
            ImageSource::File(PathBuf::from("/tmp/sky.png"))
        );
    }

    #[test]
    fn parses_remote_and_data_sources() {
        let remote = ImageSource::parse("  https://example.com/sky.jpg ");
        assert_eq!(remote, ImageSource::Remote("https://example.com/sky.jpg".into()));
        assert_eq!(remote.kind(), "remote");

        let data = ImageSource::parse("data:image/png;base64,AAAA");
        assert_eq!(data.kind(), "data");
    }

    #[test]
    fn request_keeps_raw_source() {
        let req = ImageRequest::new("file://sky.png", CrossOrigin::default());
        assert_eq!(req.raw(), "file://sky.png");
        assert_eq!(req.source(), &ImageSource::File(PathBuf::from("sky.png")));
        assert_eq!(req.cross_origin().as_str(), "anonymous");
    }

    #[test]
    fn surface_ids_compare_by_key() {
        let a = SurfaceId::from("canvas1");
        let b = SurfaceId::new(String::from("canvas1"));
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "canvas1");
    }
}
