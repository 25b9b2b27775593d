//! Catalog service port definition.

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::entities::{
    DeleteReceipt, ImageId, ImageMeta, ImagePage, ImagePatch, UploadReceipt,
};
use crate::domain::errors::ApiError;

/// Port for the image catalog REST surface.
#[async_trait]
pub trait CatalogPort: Send + Sync {
    /// Fetches one page of the plain listing.
    async fn list(&self, page: u32, page_size: u16) -> Result<ImagePage, ApiError>;

    /// Fetches one page of full-text / semantic search results.
    async fn search(&self, query: &str, page: u32, page_size: u16)
        -> Result<ImagePage, ApiError>;

    /// Fetches one page of images similar to `image_id`.
    async fn similar(
        &self,
        image_id: &ImageId,
        page: u32,
        page_size: u16,
    ) -> Result<ImagePage, ApiError>;

    /// Uploads one file as a multipart request.
    async fn upload(&self, file_name: &str, bytes: Bytes) -> Result<UploadReceipt, ApiError>;

    /// Patches name and/or tags of an image.
    async fn update(&self, image_id: &ImageId, patch: ImagePatch)
        -> Result<ImageMeta, ApiError>;

    /// Deletes an image.
    async fn delete(&self, image_id: &ImageId) -> Result<DeleteReceipt, ApiError>;

    /// Fetches the binary thumbnail.
    async fn thumbnail(&self, image_id: &ImageId) -> Result<Bytes, ApiError>;

    /// Fetches the binary full image.
    async fn full_image(&self, image_id: &ImageId) -> Result<Bytes, ApiError>;
}
