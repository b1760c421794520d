//! Share envelope marshaling
//!
//! The envelope carries everything the external messenger needs to pick up
//! a piece of content: a locatable URI, the MIME type, and the protocol
//! extras (protocol version, application id, opaque metadata). Metadata is
//! forwarded verbatim; the bridge never interprets it.

use serde::Serialize;
use serde_json::{json, Value};

/// Protocol version stamped into every envelope
pub const PROTOCOL_VERSION: i32 = 20150314;

/// A marshaled share hand-off
#[derive(Debug, Clone, Serialize)]
pub struct ShareEnvelope {
    /// URI of the content (file URI for staged artifacts, source URI otherwise)
    pub content_uri: String,

    /// MIME type the messenger should treat the content as
    pub mime_type: String,

    /// Identifier of the sending application
    pub app_id: String,

    /// Opaque application metadata, forwarded verbatim
    pub metadata: String,

    /// Share protocol version
    pub protocol_version: i32,
}

impl ShareEnvelope {
    /// Build an envelope with the current protocol version.
    pub fn new(
        content_uri: impl Into<String>,
        mime_type: impl Into<String>,
        app_id: impl Into<String>,
        metadata: impl Into<String>,
    ) -> Self {
        Self {
            content_uri: content_uri.into(),
            mime_type: mime_type.into(),
            app_id: app_id.into(),
            metadata: metadata.into(),
            protocol_version: PROTOCOL_VERSION,
        }
    }

    /// The protocol extras a messenger attaches alongside the content stream.
    pub fn extras(&self) -> Value {
        json!({
            "protocol_version": self.protocol_version,
            "app_id": self.app_id,
            "metadata": self.metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_carries_protocol_version() {
        let envelope = ShareEnvelope::new("file:///tmp/a.jpg", "image/*", "app-1", "{}");
        assert_eq!(envelope.protocol_version, PROTOCOL_VERSION);
        assert_eq!(envelope.content_uri, "file:///tmp/a.jpg");
        assert_eq!(envelope.mime_type, "image/*");
    }

    #[test]
    fn test_extras_keys() {
        let envelope =
            ShareEnvelope::new("file:///tmp/a.jpg", "image/*", "app-1", r#"{"k":"v"}"#);
        let extras = envelope.extras();
        assert_eq!(extras["protocol_version"], PROTOCOL_VERSION);
        assert_eq!(extras["app_id"], "app-1");
        assert_eq!(extras["metadata"], r#"{"k":"v"}"#);
    }

    #[test]
    fn test_metadata_is_opaque() {
        // Not required to be JSON; forwarded verbatim either way
        let envelope = ShareEnvelope::new("u", "image/*", "app", "free-form text");
        assert_eq!(envelope.extras()["metadata"], "free-form text");
    }
}
