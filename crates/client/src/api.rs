//! REST API client for the image service.
//!
//! Wraps the image, tag, upload, auth and storage-config endpoints using
//! [`reqwest`]. A 401 from any endpoint becomes
//! [`ApiError::SessionExpired`] so callers can route it to
//! re-authentication instead of retrying.

use std::time::Duration;

use reqwest::StatusCode;

use lumen_core::types::{image_path, Image, Quality};
use lumen_core::validation::{Credentials, StorageConfig};

use crate::wire::{
    ListingResponse, SearchRequest, SearchResponse, TagChangeRequest, UploadFile,
};

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for a single image service origin.
#[derive(Clone)]
pub struct GalleryApi {
    client: reqwest::Client,
    base_url: String,
}

/// Errors from the REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered 401: the login session is gone.
    #[error("Session expired")]
    SessionExpired,

    /// The server returned a non-2xx status code other than 401.
    #[error("API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A local upload file could not be read.
    #[error("Cannot read upload file: {0}")]
    Io(#[from] std::io::Error),

    /// Input rejected before any request was sent.
    #[error(transparent)]
    Invalid(#[from] lumen_core::error::CoreError),
}

impl ApiError {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired)
    }
}

impl GalleryApi {
    /// Create a client for `base_url` (e.g. `http://host:3000`) with the
    /// given per-request timeout and a cookie store for the session token.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of an image at a quality tier.
    pub fn image_url(&self, id: &str, quality: Quality) -> String {
        format!("{}{}", self.base_url, image_path(id, quality))
    }

    // ---- images ----

    /// Full unfiltered listing (`GET /api/images`).
    pub async fn list_images(&self) -> Result<Vec<Image>, ApiError> {
        let response = self.client.get(self.url("/api/images")).send().await?;
        let listing: ListingResponse = Self::parse_response(response).await?;
        Ok(listing.into_images())
    }

    /// One page of search results (`POST /api/images/search`).
    pub async fn search_images(&self, request: &SearchRequest) -> Result<SearchResponse, ApiError> {
        tracing::debug!(query = %request.query, page = request.page, limit = request.limit, "Searching images");
        let response = self
            .client
            .post(self.url("/api/images/search"))
            .json(request)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// Upload a single file as multipart (`POST /api/images`).
    ///
    /// Files queued from disk are read here, so only files currently being
    /// uploaded are held in memory.
    pub async fn upload_image(&self, file: &UploadFile) -> Result<(), ApiError> {
        let data = file.read().await?;
        let part = reqwest::multipart::Part::bytes(data).file_name(file.filename.clone());
        let form = reqwest::multipart::Form::new()
            .text("filename", file.filename.clone())
            .part("data", part)
            .text("last_modified", file.last_modified.to_string());

        let response = self
            .client
            .post(self.url("/api/images"))
            .multipart(form)
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// Fetch image bytes at a tier without using them, so a later display
    /// is served warm.
    pub async fn prefetch_image(&self, id: &str, quality: Quality) -> Result<(), ApiError> {
        let response = self.client.get(self.image_url(id, quality)).send().await?;
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        tracing::debug!(id, quality = %quality, bytes = bytes.len(), "Prefetched image");
        Ok(())
    }

    // ---- tags ----

    /// Add tags to every listed image (`POST /api/tags`).
    pub async fn add_tags(&self, body: &TagChangeRequest) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url("/api/tags"))
            .json(body)
            .send()
            .await?;
        Self::check_status(response).await
    }

    /// Remove tags from every listed image (`DELETE /api/tags`).
    pub async fn remove_tags(&self, body: &TagChangeRequest) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.url("/api/tags"))
            .json(body)
            .send()
            .await?;
        Self::check_status(response).await
    }

    // ---- auth & config ----

    /// `POST /api/auth/login`. The session cookie lands in the cookie store.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), ApiError> {
        self.post_credentials("/api/auth/login", credentials).await
    }

    /// `POST /api/auth/signup`.
    pub async fn signup(&self, credentials: &Credentials) -> Result<(), ApiError> {
        self.post_credentials("/api/auth/signup", credentials).await
    }

    /// `PATCH /user/config` with object-storage settings.
    pub async fn update_config(&self, config: &StorageConfig) -> Result<(), ApiError> {
        config.validate()?;
        let response = self
            .client
            .patch(self.url("/user/config"))
            .json(config)
            .send()
            .await?;
        Self::check_status(response).await
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_credentials(&self, path: &str, credentials: &Credentials) -> Result<(), ApiError> {
        credentials.validate()?;
        let response = self
            .client
            .post(self.url(path))
            .json(credentials)
            .send()
            .await?;
        Self::check_status(response).await
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, [`ApiError::SessionExpired`] on 401,
    /// or an [`ApiError::Api`] containing the status and body otherwise.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::SessionExpired);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), ApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn api() -> GalleryApi {
        GalleryApi::with_client(reqwest::Client::new(), "http://localhost:3000/")
    }

    #[test]
    fn trailing_slash_trimmed() {
        assert_eq!(api().base_url(), "http://localhost:3000");
    }

    #[test]
    fn image_url_includes_quality() {
        assert_eq!(
            api().image_url("abc", Quality::Medium),
            "http://localhost:3000/api/images/abc?quality=medium"
        );
    }

    #[tokio::test]
    async fn login_validates_before_sending() {
        // Port 9 is never listening; validation must fail first.
        let api = GalleryApi::with_client(reqwest::Client::new(), "http://127.0.0.1:9");
        let result = api.login(&Credentials::new("", "pw")).await;
        assert_matches!(result, Err(ApiError::Invalid(_)));
    }

    #[test]
    fn session_expired_is_flagged() {
        assert!(ApiError::SessionExpired.is_session_expired());
        let other = ApiError::Api {
            status: 500,
            body: String::new(),
        };
        assert!(!other.is_session_expired());
    }
}
