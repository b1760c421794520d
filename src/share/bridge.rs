//! Share bridge orchestration
//!
//! The bridge drives a share end to end on the invoking thread: resolve the
//! source, optionally composite a caption band, stage the artifact, and hand
//! the envelope to the messenger. Nothing is retried; every failure
//! propagates to the caller.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;
use thiserror::Error;

use crate::caption::{CaptionCompositor, CaptionError};
use crate::media::fetch::{FetchConfig, MediaFetcher};
use crate::media::frame::{extract_preview_frame, FrameError};
use crate::media::loader::{decode_image, load_image, LoadError, MediaSource};
use crate::media::store::{ArtifactStore, StoreConfig, StoreError};
use crate::share::{DeliveryError, DeliveryReceipt, Messenger, ShareEnvelope, ShareKind};

/// Fraction of the image height where the caption band starts
pub const BAND_RATIO: f64 = 0.75;

/// Errors that can occur during a share
#[derive(Error, Debug)]
pub enum ShareError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Caption(#[from] CaptionError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// Configuration for the share bridge
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Identifier of the sending application, stamped into every envelope
    pub app_id: String,

    /// Remote fetch settings
    pub fetch: FetchConfig,

    /// Artifact staging settings
    pub store: StoreConfig,

    /// Explicit ffmpeg binary for video previews (defaults to PATH lookup)
    pub ffmpeg_path: Option<PathBuf>,
}

impl BridgeConfig {
    /// Create a config for the given application id.
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            fetch: FetchConfig::default(),
            store: StoreConfig::default(),
            ffmpeg_path: None,
        }
    }

    /// Set custom fetch settings
    pub fn with_fetch(mut self, fetch: FetchConfig) -> Self {
        self.fetch = fetch;
        self
    }

    /// Set custom staging settings
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    /// Set an explicit ffmpeg binary path
    pub fn with_ffmpeg_path(mut self, path: PathBuf) -> Self {
        self.ffmpeg_path = Some(path);
        self
    }
}

/// Orchestrates captioned-media shares to an external messenger.
pub struct ShareBridge {
    config: BridgeConfig,
    fetcher: MediaFetcher,
    store: ArtifactStore,
    compositor: CaptionCompositor,
    messenger: Arc<dyn Messenger>,
}

impl ShareBridge {
    /// Create a bridge for the given messenger.
    pub fn new(config: BridgeConfig, messenger: Arc<dyn Messenger>) -> Result<Self, ShareError> {
        let fetcher = MediaFetcher::with_config(config.fetch.clone());
        let store = ArtifactStore::new(config.store.clone())?;
        let compositor = CaptionCompositor::new()?;
        Ok(Self {
            config,
            fetcher,
            store,
            compositor,
            messenger,
        })
    }

    /// Share content as-is: the source URI goes straight into the envelope,
    /// no staging, no caption.
    pub fn send(
        &self,
        kind: ShareKind,
        source: &str,
        metadata: &str,
    ) -> Result<DeliveryReceipt, ShareError> {
        let envelope =
            ShareEnvelope::new(source, kind.mime_type(), &self.config.app_id, metadata);

        tracing::info!(
            target: "share",
            kind = %kind,
            uri = %envelope.content_uri,
            "delivering share"
        );
        Ok(self.messenger.deliver(&envelope)?)
    }

    /// Share an image with a caption band burned in.
    ///
    /// The source image (local path, `file://` URI, or http(s) URL) is
    /// decoded, captioned at three quarters of its height, staged as a JPEG
    /// artifact, and delivered as `image/*`.
    pub fn send_image_with_caption(
        &self,
        source: &str,
        metadata: &str,
        caption: &str,
    ) -> Result<DeliveryReceipt, ShareError> {
        let source = MediaSource::parse(source);
        let image = load_image(&source, &self.fetcher)?;
        self.deliver_captioned(&image, caption, metadata)
    }

    /// Share a captioned still preview of a video.
    ///
    /// One frame is extracted from the video (local or remote), captioned,
    /// and delivered as `image/*` exactly like an image share.
    pub fn send_video_preview_with_caption(
        &self,
        source: &str,
        metadata: &str,
        caption: &str,
    ) -> Result<DeliveryReceipt, ShareError> {
        let source = MediaSource::parse(source);
        let frame = extract_preview_frame(&source.as_str(), self.config.ffmpeg_path.as_deref())?;
        let image = decode_image(&frame)?;
        self.deliver_captioned(&image, caption, metadata)
    }

    /// The staging store backing this bridge.
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    fn deliver_captioned(
        &self,
        image: &RgbaImage,
        caption: &str,
        metadata: &str,
    ) -> Result<DeliveryReceipt, ShareError> {
        let band_top_y = band_top(image.height());
        let jpeg = self.compositor.render(image, caption, band_top_y)?;
        let artifact = self.store.stage(&jpeg, Some("image/jpeg".to_string()))?;

        let envelope = ShareEnvelope::new(
            file_uri(&artifact.path),
            ShareKind::Image.mime_type(),
            &self.config.app_id,
            metadata,
        );

        tracing::info!(
            target: "share",
            uri = %envelope.content_uri,
            band_top_y = band_top_y,
            "delivering captioned share"
        );
        Ok(self.messenger.deliver(&envelope)?)
    }
}

/// Band top position for an image height: `BAND_RATIO` of the height,
/// truncated. Strictly below the height for any non-empty image.
fn band_top(height: u32) -> u32 {
    (f64::from(height) * BAND_RATIO) as u32
}

/// File URI for a staged artifact path.
fn file_uri(path: &Path) -> String {
    url::Url::from_file_path(path)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| path.display().to_string())
}
