//! Screenshot image blobs.
//!
//! Capture and encoding happen outside this crate; callers hand us raw
//! encoded bytes (PNG or JPEG) and we carry them as base64 data URLs for
//! vision-capable models.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// A single captured screenshot, base64-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageData {
    /// Base64-encoded image bytes (no data-URL prefix).
    pub data: String,
    /// MIME type, e.g. "image/png".
    pub mime_type: String,
}

impl ImageData {
    /// Create from raw encoded image bytes.
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            data: BASE64.encode(bytes),
            mime_type: mime_type.into(),
        }
    }

    /// Create from raw PNG bytes.
    pub fn png(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes, "image/png")
    }

    /// Render as a data URL suitable for vision model image content.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}
