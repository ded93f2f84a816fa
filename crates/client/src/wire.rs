//! Request and response bodies exchanged with the image service.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lumen_core::types::Image;

use crate::api::ApiError;

/// Body of `POST /api/images/search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    pub query: String,
    pub page: u32,
    pub limit: u32,
}

/// Response of `POST /api/images/search`.
///
/// Servers report either `has_more`, a `total`, or both.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub has_more: Option<bool>,
}

/// One entry of the legacy `GET /api/images` listing: older servers
/// return bare id strings, newer ones full records.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListingEntry {
    Id(String),
    Record(Image),
}

impl From<ListingEntry> for Image {
    fn from(entry: ListingEntry) -> Self {
        match entry {
            ListingEntry::Id(id) => Image::from_id(id),
            ListingEntry::Record(image) => image,
        }
    }
}

/// Response of `GET /api/images`: `{images: [...]}` or a bare list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListingResponse {
    Wrapped { images: Vec<ListingEntry> },
    Bare(Vec<ListingEntry>),
}

impl ListingResponse {
    pub fn into_images(self) -> Vec<Image> {
        let entries = match self {
            ListingResponse::Wrapped { images } => images,
            ListingResponse::Bare(entries) => entries,
        };
        entries.into_iter().map(Image::from).collect()
    }
}

/// Body of `POST /api/tags` and `DELETE /api/tags`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagChangeRequest {
    pub image_ids: Vec<String>,
    pub tags: Vec<String>,
}

/// Where the bytes of an [`UploadFile`] come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadSource {
    /// Bytes already in memory.
    Memory(Vec<u8>),
    /// A file on disk, read only when its upload starts.
    Path(PathBuf),
}

/// A local file queued for upload.
///
/// Files picked from disk carry only their path until a worker slot
/// uploads them, so a large batch does not hold every file in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub filename: String,
    pub source: UploadSource,
    /// Milliseconds since the Unix epoch.
    pub last_modified: i64,
}

impl UploadFile {
    pub fn new(filename: impl Into<String>, data: Vec<u8>, last_modified: i64) -> Self {
        Self {
            filename: filename.into(),
            source: UploadSource::Memory(data),
            last_modified,
        }
    }

    /// Describe a file on disk, taking its name and modification time.
    /// The contents are not read here.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            )
            .into());
        }
        let last_modified = DateTime::<Utc>::from(metadata.modified()?).timestamp_millis();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            filename,
            source: UploadSource::Path(path.to_path_buf()),
            last_modified,
        })
    }

    /// Load the file contents.
    pub async fn read(&self) -> Result<Vec<u8>, ApiError> {
        match &self.source {
            UploadSource::Memory(data) => Ok(data.clone()),
            UploadSource::Path(path) => Ok(tokio::fs::read(path).await?),
        }
    }
}
