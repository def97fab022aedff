//! Core types for image editing.

use crate::error::{ImagineError, Result};
use base64::Engine;
use std::path::Path;

/// MIME type used when an upload's format cannot be recognized.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Stem of the file name offered when exporting a result.
pub const DEFAULT_EXPORT_STEM: &str = "imagine-with-abdo";

/// Image formats the session knows how to name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG format (lossless).
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
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

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Maps a MIME type back to a format.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
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

/// An image payload bundled with its MIME type.
///
/// This is the unit that moves between the upload boundary, the remote
/// editor, the history and the export boundary. Bytes are passed through
/// untouched.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// MIME type as reported by the uploader or the remote service.
    pub mime_type: String,
}

impl std::fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedImage")
            .field("mime_type", &self.mime_type)
            .field("size", &self.data.len())
            .finish()
    }
}

impl EncodedImage {
    /// Creates a new encoded image.
    pub fn new(data: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Decodes base64 `payload` and pairs it with `mime_type`.
    pub fn from_base64(payload: &str, mime_type: impl Into<String>) -> Result<Self> {
        let data = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| ImagineError::Decode(e.to_string()))?;
        Ok(Self::new(data, mime_type))
    }

    /// Parses a `data:<mime>;base64,<payload>` URL.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| ImagineError::Decode("missing data: scheme".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ImagineError::Decode("missing data URL payload".into()))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| ImagineError::Decode("data URL is not base64 encoded".into()))?;
        Self::from_base64(payload, mime_type)
    }

    /// Reads an uploaded file, inferring the MIME type from its content and
    /// then its extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let mime_type = ImageFormat::from_magic_bytes(&data)
            .or_else(|| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .and_then(ImageFormat::from_extension)
            })
            .map(|f| f.mime_type())
            .unwrap_or(FALLBACK_MIME_TYPE);
        Ok(Self::new(data, mime_type))
    }

    /// Returns the format implied by the MIME type, if known.
    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_mime_type(&self.mime_type)
    }

    /// File extension to use when exporting; PNG when the type is unknown.
    pub fn extension(&self) -> &'static str {
        self.format().unwrap_or(ImageFormat::Png).extension()
    }

    /// Default export file name, e.g. `imagine-with-abdo.jpg` for a JPEG.
    pub fn export_file_name(&self) -> String {
        format!("{DEFAULT_EXPORT_STEM}.{}", self.extension())
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Saves the image bytes to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.data)?;
        Ok(())
    }

    /// Encodes the image data as base64.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// Returns the image as a data URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}
