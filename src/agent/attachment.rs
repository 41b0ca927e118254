//! Image Attachments
//!
//! Photos are shipped to the model inline, base64-encoded, with a MIME type
//! guessed from the file extension.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// MIME type used when the extension is missing or unknown.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Map a file path to an image MIME type by extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => DEFAULT_IMAGE_MIME,
    }
}

/// An inline image sent alongside a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttachment {
    /// Text placed right before the image, e.g. "Photo 2:".
    pub label: String,
    pub mime_type: String,
    /// Base64 (standard alphabet, padded) payload.
    pub data: String,
}

impl ImageAttachment {
    pub fn from_bytes(label: impl Into<String>, path: &Path, bytes: &[u8]) -> Self {
        Self {
            label: label.into(),
            mime_type: mime_for_path(path).to_string(),
            data: STANDARD.encode(bytes),
        }
    }

    /// `data:` URL form used by OpenAI-compatible endpoints.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}
