//! ferry: captioned-media share bridge
//!
//! Hands image/video/gif/audio content to an external messaging application,
//! optionally burning a caption band into the image first. The whole flow is
//! synchronous: resolve the source, composite the caption, stage the JPEG
//! artifact under a unique path, and deliver the envelope through a
//! [`share::Messenger`] implementation.
//!
//! ```no_run
//! use std::sync::Arc;
//! use ferry::share::{BridgeConfig, Messenger, ShareBridge, ShareKind};
//! # fn messenger() -> Arc<dyn Messenger> { unimplemented!() }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bridge = ShareBridge::new(BridgeConfig::new("my-app"), messenger())?;
//! bridge.send_image_with_caption("file:///photos/a.png", "{}", "look at this")?;
//! bridge.send(ShareKind::Video, "https://example.com/clip.mp4", "{}")?;
//! # Ok(())
//! # }
//! ```

pub mod caption;
pub mod logging;
pub mod media;
pub mod share;
