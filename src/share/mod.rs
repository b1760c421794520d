//! Share hand-off module
//!
//! Marshals a media reference into the envelope an external messenger
//! expects and drives the full captioned-share flow:
//!
//! - **ShareKind**: content kinds and the MIME types the messenger expects
//! - **ShareEnvelope**: the marshaled hand-off (URI, MIME, protocol extras)
//! - **Messenger**: the external-application boundary
//! - **ShareBridge**: load, caption, stage, deliver

pub mod bridge;
pub mod envelope;

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use bridge::{BridgeConfig, ShareBridge, ShareError, BAND_RATIO};
pub use envelope::{ShareEnvelope, PROTOCOL_VERSION};

/// Kind of content being shared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareKind {
    /// Still image
    Image,
    /// Animated GIF
    Gif,
    /// Video file
    Video,
    /// Audio file
    Audio,
}

impl ShareKind {
    /// MIME type the external messenger expects for this kind
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Image => "image/*",
            Self::Gif => "image/gif",
            Self::Video => "video/*",
            Self::Audio => "audio/*",
        }
    }
}

impl std::fmt::Display for ShareKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Gif => write!(f, "gif"),
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
        }
    }
}

/// Error for unrecognized share kind strings
#[derive(Error, Debug, Clone)]
#[error("unknown share kind: {0}")]
pub struct UnknownShareKind(String);

impl FromStr for ShareKind {
    type Err = UnknownShareKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(Self::Image),
            "gif" => Ok(Self::Gif),
            "video" => Ok(Self::Video),
            "audio" => Ok(Self::Audio),
            other => Err(UnknownShareKind(other.to_string())),
        }
    }
}

/// Receipt returned by a messenger after accepting an envelope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// Messenger-assigned identifier, if the target reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

/// Errors reported by a messenger implementation
#[derive(Error, Debug, Clone)]
pub enum DeliveryError {
    /// The external messenger is not installed or cannot be reached
    #[error("messenger unavailable: {0}")]
    Unavailable(String),

    /// The messenger refused or failed to accept the envelope
    #[error("delivery failed: {0}")]
    Failed(String),
}

/// The external messaging application boundary.
///
/// Implementations hand the envelope to whatever inter-process mechanism the
/// platform provides. The bridge never retries; errors propagate to the
/// caller synchronously.
pub trait Messenger: Send + Sync {
    /// Deliver an envelope to the external messenger.
    fn deliver(&self, envelope: &ShareEnvelope) -> Result<DeliveryReceipt, DeliveryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mime_types() {
        assert_eq!(ShareKind::Image.mime_type(), "image/*");
        assert_eq!(ShareKind::Gif.mime_type(), "image/gif");
        assert_eq!(ShareKind::Video.mime_type(), "video/*");
        assert_eq!(ShareKind::Audio.mime_type(), "audio/*");
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("image".parse::<ShareKind>().unwrap(), ShareKind::Image);
        assert_eq!("gif".parse::<ShareKind>().unwrap(), ShareKind::Gif);
        assert_eq!("video".parse::<ShareKind>().unwrap(), ShareKind::Video);
        assert_eq!("audio".parse::<ShareKind>().unwrap(), ShareKind::Audio);

        let err = "document".parse::<ShareKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown share kind: document");
    }

    #[test]
    fn test_kind_display_round_trip() {
        for kind in [
            ShareKind::Image,
            ShareKind::Gif,
            ShareKind::Video,
            ShareKind::Audio,
        ] {
            assert_eq!(kind.to_string().parse::<ShareKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_kind_serde() {
        assert_eq!(serde_json::to_string(&ShareKind::Image).unwrap(), "\"image\"");
        let parsed: ShareKind = serde_json::from_str("\"video\"").unwrap();
        assert_eq!(parsed, ShareKind::Video);
    }

    #[test]
    fn test_receipt_serialization() {
        let receipt = DeliveryReceipt {
            message_id: Some("m-1".to_string()),
        };
        let json = serde_json::to_string(&receipt).unwrap();
        let parsed: DeliveryReceipt = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.message_id, Some("m-1".to_string()));

        // Absent ids stay out of the wire form
        let json = serde_json::to_string(&DeliveryReceipt::default()).unwrap();
        assert_eq!(json, "{}");
    }
}
