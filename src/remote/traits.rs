// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;

use crate::gallery::{BatchDeleteResult, BatchResult, ImageInfo, StagedFile};
use crate::remote::error::ApiError;

#[async_trait]
pub trait ImageApi: Send + Sync {
    /// List all stored filenames
    async fn list_images(&self) -> Result<Vec<String>, ApiError>;

    /// Upload files as one multipart request
    async fn upload_batch(&self, files: &[StagedFile]) -> Result<BatchResult, ApiError>;

    /// Fetch the bytes of one image
    async fn fetch_image(&self, filename: &str) -> Result<Vec<u8>, ApiError>;

    /// Delete one image
    async fn delete_image(&self, filename: &str) -> Result<(), ApiError>;

    /// Delete several images in one request
    async fn delete_batch(&self, filenames: &[String]) -> Result<BatchDeleteResult, ApiError>;

    /// Retrieve several images as a zip archive
    async fn retrieve_batch(&self, filenames: &[String]) -> Result<Vec<u8>, ApiError>;

    /// Fetch size and content type metadata for several images
    async fn batch_info(&self, filenames: &[String]) -> Result<Vec<ImageInfo>, ApiError>;
}
