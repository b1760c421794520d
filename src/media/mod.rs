//! Media pipeline module
//!
//! Everything between a raw share source and a deliverable artifact:
//!
//! - **MediaFetcher**: blocking HTTP fetch with SSRF protection (host
//!   validation, DNS pinning, redirects disabled, size limits)
//! - **MediaSource / load_image**: source classification (`file://`
//!   normalization) and image decoding
//! - **extract_preview_frame**: single video frame via the ffmpeg binary
//! - **ArtifactStore**: uniquely-named temporary staging with TTL cleanup

pub mod fetch;
pub mod frame;
pub mod loader;
pub mod ssrf;
pub mod store;

pub use fetch::{
    FetchConfig, FetchError, FetchResult, MediaFetcher, DEFAULT_FETCH_TIMEOUT_MS, DEFAULT_MAX_SIZE,
    MAX_FETCH_TIMEOUT_MS, MAX_URL_LENGTH,
};
pub use frame::{extract_preview_frame, FrameError};
pub use loader::{decode_image, load_image, LoadError, MediaSource};
pub use store::{
    ArtifactMetadata, ArtifactStore, StoreConfig, StoreError, DEFAULT_MAX_FILE_SIZE,
    DEFAULT_TTL_SECS,
};
