//! The image-service seam used by the session engine.
//!
//! [`GalleryApi`] is the production implementation; tests substitute an
//! in-memory fake.

use async_trait::async_trait;

use lumen_core::types::{Image, Quality};

use crate::api::{ApiError, GalleryApi};
use crate::wire::{SearchRequest, SearchResponse, TagChangeRequest, UploadFile};

#[async_trait]
pub trait ImageService: Send + Sync {
    async fn list_images(&self) -> Result<Vec<Image>, ApiError>;
    async fn search_images(&self, request: &SearchRequest) -> Result<SearchResponse, ApiError>;
    async fn upload_image(&self, file: &UploadFile) -> Result<(), ApiError>;
    async fn add_tags(&self, body: &TagChangeRequest) -> Result<(), ApiError>;
    async fn remove_tags(&self, body: &TagChangeRequest) -> Result<(), ApiError>;
    async fn prefetch_image(&self, id: &str, quality: Quality) -> Result<(), ApiError>;
}

#[async_trait]
impl ImageService for GalleryApi {
    async fn list_images(&self) -> Result<Vec<Image>, ApiError> {
        GalleryApi::list_images(self).await
    }

    async fn search_images(&self, request: &SearchRequest) -> Result<SearchResponse, ApiError> {
        GalleryApi::search_images(self, request).await
    }

    async fn upload_image(&self, file: &UploadFile) -> Result<(), ApiError> {
        GalleryApi::upload_image(self, file).await
    }

    async fn add_tags(&self, body: &TagChangeRequest) -> Result<(), ApiError> {
        GalleryApi::add_tags(self, body).await
    }

    async fn remove_tags(&self, body: &TagChangeRequest) -> Result<(), ApiError> {
        GalleryApi::remove_tags(self, body).await
    }

    async fn prefetch_image(&self, id: &str, quality: Quality) -> Result<(), ApiError> {
        GalleryApi::prefetch_image(self, id, quality).await
    }
}
