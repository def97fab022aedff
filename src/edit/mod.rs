//! Remote image editing.

mod editor;
pub mod providers;
mod types;

pub use editor::ImageEditor;
pub use types::{EncodedImage, ImageFormat, DEFAULT_EXPORT_STEM, FALLBACK_MIME_TYPE};
