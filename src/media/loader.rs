//! Share source resolution and image decoding
//!
//! A share source arrives as a raw string: an http(s) URL, a plain
//! filesystem path, or a `file://` URI. Host applications are inconsistent
//! about the number of slashes in file URIs, so both `file:///path` and
//! `file://path` forms are normalized to a plain path.

use std::fs;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use thiserror::Error;

use crate::media::fetch::{FetchError, MediaFetcher};

/// Errors that can occur while resolving and decoding a share source
#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("failed to decode image: {0}")]
    Decode(String),
}

/// A classified share source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// Remote http(s) URL
    Url(String),
    /// Local filesystem path (file URI prefixes stripped)
    Path(PathBuf),
}

impl MediaSource {
    /// Classify a raw source string.
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return Self::Url(raw.to_string());
        }
        Self::Path(normalize_file_path(raw))
    }

    /// The source as a displayable string (URL, or path as given).
    pub fn as_str(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::Path(path) => path.display().to_string(),
        }
    }
}

/// Strip `file://` URI prefixes, keeping the path absolute.
fn normalize_file_path(raw: &str) -> PathBuf {
    match raw.strip_prefix("file://") {
        Some(rest) if rest.starts_with('/') => PathBuf::from(rest),
        Some(rest) => PathBuf::from(format!("/{rest}")),
        None => PathBuf::from(raw),
    }
}

/// Load and decode a share source into an RGBA raster.
///
/// Remote sources go through the fetcher; local sources are read from disk.
/// Bytes that do not decode as an image are a [`LoadError::Decode`].
pub fn load_image(source: &MediaSource, fetcher: &MediaFetcher) -> Result<RgbaImage, LoadError> {
    let bytes = match source {
        MediaSource::Url(url) => fetcher.fetch(url)?.bytes,
        MediaSource::Path(path) => read_file(path)?,
    };
    decode_image(&bytes)
}

/// Decode raw bytes into an RGBA raster.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage, LoadError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| LoadError::Decode(e.to_string()))?;
    Ok(decoded.to_rgba8())
}

fn read_file(path: &Path) -> Result<Vec<u8>, LoadError> {
    fs::read(path).map_err(|e| LoadError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    #[test]
    fn test_parse_classifies_urls() {
        assert_eq!(
            MediaSource::parse("https://example.com/a.png"),
            MediaSource::Url("https://example.com/a.png".to_string())
        );
        assert_eq!(
            MediaSource::parse("http://example.com/a.png"),
            MediaSource::Url("http://example.com/a.png".to_string())
        );
    }

    #[test]
    fn test_parse_classifies_paths() {
        assert_eq!(
            MediaSource::parse("/data/photos/a.png"),
            MediaSource::Path(PathBuf::from("/data/photos/a.png"))
        );
    }

    #[test]
    fn test_parse_strips_file_uri_prefixes() {
        assert_eq!(
            MediaSource::parse("file:///data/photos/a.png"),
            MediaSource::Path(PathBuf::from("/data/photos/a.png"))
        );
        // Host apps sometimes hand over the malformed two-slash form
        assert_eq!(
            MediaSource::parse("file://data/photos/a.png"),
            MediaSource::Path(PathBuf::from("/data/photos/a.png"))
        );
    }

    #[test]
    fn test_load_image_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.png");
        let img = RgbaImage::from_pixel(20, 10, Rgba([10, 20, 30, 255]));
        img.save(&path).unwrap();

        let source = MediaSource::parse(path.to_str().unwrap());
        let loaded = load_image(&source, &MediaFetcher::new()).unwrap();
        assert_eq!(loaded.dimensions(), (20, 10));
        assert_eq!(loaded.get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_load_image_missing_file() {
        let source = MediaSource::Path(PathBuf::from("/nonexistent/a.png"));
        let result = load_image(&source, &MediaFetcher::new());
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = decode_image(b"definitely not an image");
        assert!(matches!(result, Err(LoadError::Decode(_))));
    }
}
