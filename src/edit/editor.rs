//! Image editor trait.

use crate::edit::types::EncodedImage;
use crate::error::Result;
use async_trait::async_trait;

/// A remote service that edits an image according to a text instruction.
///
/// Implementations perform exactly one request/response exchange per call
/// and never retry.
#[async_trait]
pub trait ImageEditor: Send + Sync {
    /// Sends `image` together with `instruction` and returns the first image
    /// the service produced.
    async fn edit_image(&self, image: &EncodedImage, instruction: &str) -> Result<EncodedImage>;

    /// Returns the name of this editor for display.
    fn name(&self) -> &str;

    /// Checks if the service is reachable and authenticated.
    async fn health_check(&self) -> Result<()>;
}

#[async_trait]
impl<T: ImageEditor + ?Sized> ImageEditor for std::sync::Arc<T> {
    async fn edit_image(&self, image: &EncodedImage, instruction: &str) -> Result<EncodedImage> {
        (**self).edit_image(image, instruction).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    async fn health_check(&self) -> Result<()> {
        (**self).health_check().await
    }
}
