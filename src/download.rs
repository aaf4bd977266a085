//! Downloaded result images.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Image formats the service returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG (transparent cutouts, packshots).
    #[default]
    Png,
    /// JPEG.
    Jpeg,
    /// WebP.
    WebP,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Attempts to detect format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// A result image fetched from a temporary result URL.
#[derive(Debug, Clone)]
#[must_use = "downloaded image should be saved or processed"]
pub struct DownloadedImage {
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// Format detected from magic bytes, else from the URL's extension.
    pub format: Option<ImageFormat>,
    /// URL the image was fetched from.
    pub source_url: String,
}

impl DownloadedImage {
    /// Wraps downloaded bytes, detecting the format.
    pub fn new(data: Vec<u8>, source_url: impl Into<String>) -> Self {
        let source_url = source_url.into();
        let format = ImageFormat::from_magic_bytes(&data).or_else(|| {
            url_segment(&source_url)
                .rsplit_once('.')
                .and_then(|(_, ext)| ImageFormat::from_extension(ext))
        });
        Self {
            data,
            format,
            source_url,
        }
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// File name for saving: the URL's last path segment when it has an
    /// extension, otherwise `fallback_stem` plus an extension for the format.
    pub fn file_name(&self, fallback_stem: &str) -> String {
        let segment = url_segment(&self.source_url);
        if !segment.is_empty() && segment.contains('.') {
            return segment.to_string();
        }

        let ext = self.format.unwrap_or_default().extension();
        format!("{fallback_stem}.{ext}")
    }

    /// Saves the image to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.data)?;
        Ok(())
    }
}

/// Last path segment of a URL, without query or fragment.
fn url_segment(url: &str) -> &str {
    let without_query = url.split(['?', '#']).next().unwrap_or_default();
    without_query.rsplit('/').next().unwrap_or_default()
}
