//! Port for the gallery backend's image endpoints.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::entities::{
    ImageId, ImagePage, ImagePatch, ImageRecord, ListQuery, SearchResults, SourceFile,
    UploadMetadata,
};
use crate::domain::errors::HttpError;

/// Receives upload progress as a percentage.
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// File plus metadata to submit.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// File to send.
    pub file: SourceFile,
    /// Title, description and tags.
    pub metadata: UploadMetadata,
}

impl UploadRequest {
    /// Creates an upload request.
    #[must_use]
    pub const fn new(file: SourceFile, metadata: UploadMetadata) -> Self {
        Self { file, metadata }
    }
}

/// Image operations used by the gallery and the upload pipeline.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageApiPort: Send + Sync {
    /// Fetches one page of the gallery.
    async fn list_images(&self, query: ListQuery) -> Result<ImagePage, HttpError>;

    /// Searches the gallery.
    async fn search_images(
        &self,
        query: &str,
        page: u32,
        limit: u32,
    ) -> Result<SearchResults, HttpError>;

    /// Uploads an image, reporting progress as it goes.
    async fn upload_image(
        &self,
        request: UploadRequest,
        progress: ProgressCallback,
    ) -> Result<ImageRecord, HttpError>;

    /// Deletes an image.
    async fn delete_image(&self, id: &ImageId) -> Result<(), HttpError>;

    /// Applies a partial update.
    async fn update_image(&self, id: &ImageId, patch: ImagePatch)
    -> Result<ImageRecord, HttpError>;
}
