use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Server-assigned, stable image identifier.
pub type ImageId = String;

/// Aspect ratio assumed for records that carry none (legacy listings).
pub const DEFAULT_ASPECT_RATIO: f64 = 1.0;

/// A single photo known to the client.
///
/// Deserialization goes through [`ImageRecord`] so an image with a
/// non-positive or non-finite aspect ratio is rejected at the edge
/// instead of poisoning the layout later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ImageRecord")]
pub struct Image {
    pub id: ImageId,
    pub captured_at: String,
    pub aspect_ratio: f64,
    pub tags: BTreeSet<String>,
}

/// Wire shape of an image before invariants are checked.
#[derive(Debug, Deserialize)]
struct ImageRecord {
    id: ImageId,
    #[serde(default)]
    captured_at: String,
    #[serde(default = "default_aspect_ratio")]
    aspect_ratio: f64,
    #[serde(default)]
    tags: BTreeSet<String>,
}

fn default_aspect_ratio() -> f64 {
    DEFAULT_ASPECT_RATIO
}

impl TryFrom<ImageRecord> for Image {
    type Error = CoreError;

    fn try_from(record: ImageRecord) -> Result<Self, Self::Error> {
        Image::new(record.id, record.captured_at, record.aspect_ratio, record.tags)
    }
}

impl Image {
    /// Build an image, enforcing `aspect_ratio > 0`.
    pub fn new(
        id: impl Into<ImageId>,
        captured_at: impl Into<String>,
        aspect_ratio: f64,
        tags: impl IntoIterator<Item = String>,
    ) -> Result<Self, CoreError> {
        let id = id.into();
        if !(aspect_ratio.is_finite() && aspect_ratio > 0.0) {
            return Err(CoreError::Validation(format!(
                "Image {id} has invalid aspect ratio {aspect_ratio}"
            )));
        }
        Ok(Self {
            id,
            captured_at: captured_at.into(),
            aspect_ratio,
            tags: tags.into_iter().collect(),
        })
    }

    /// Record for an id-only legacy listing entry.
    pub fn from_id(id: impl Into<ImageId>) -> Self {
        Self {
            id: id.into(),
            captured_at: String::new(),
            aspect_ratio: DEFAULT_ASPECT_RATIO,
            tags: BTreeSet::new(),
        }
    }

    /// Rendered height of the image at unit width.
    pub fn unit_height(&self) -> f64 {
        1.0 / self.aspect_ratio
    }
}

// ---------------------------------------------------------------------------
// Quality tiers
// ---------------------------------------------------------------------------

/// Rendering tier passed as the `quality` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Small,
    #[default]
    Medium,
    Original,
}

impl Quality {
    pub fn as_str(self) -> &'static str {
        match self {
            Quality::Small => "small",
            Quality::Medium => "medium",
            Quality::Original => "original",
        }
    }

    /// Lightbox toggle between `medium` and `original`.
    pub fn toggled(self) -> Self {
        match self {
            Quality::Original => Quality::Medium,
            Quality::Small | Quality::Medium => Quality::Original,
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Path (relative to the server origin) of an image at a quality tier.
pub fn image_path(id: &str, quality: Quality) -> String {
    format!("/api/images/{id}?quality={quality}")
}

// ---------------------------------------------------------------------------
// View modes
// ---------------------------------------------------------------------------

/// What the gallery screen is currently doing with clicks and keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Clicks open the lightbox.
    #[default]
    Browse,
    /// Clicks toggle or extend the selection.
    Tagging,
    /// The uploader is showing.
    Upload,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn zero_aspect_ratio_rejected() {
        let result = Image::new("a", "", 0.0, Vec::new());
        assert_matches!(result, Err(CoreError::Validation(_)));
    }

    #[test]
    fn nan_aspect_ratio_rejected() {
        assert!(Image::new("a", "", f64::NAN, Vec::new()).is_err());
    }

    #[test]
    fn deserialize_fills_defaults() {
        let image: Image = serde_json::from_str(r#"{"id":"x1"}"#).unwrap();
        assert_eq!(image.id, "x1");
        assert_eq!(image.aspect_ratio, DEFAULT_ASPECT_RATIO);
        assert!(image.tags.is_empty());
    }

    #[test]
    fn deserialize_rejects_negative_aspect_ratio() {
        let result = serde_json::from_str::<Image>(r#"{"id":"x1","aspect_ratio":-2.0}"#);
        assert!(result.is_err());
    }

    #[test]
    fn unit_height_is_inverse_aspect() {
        let image = Image::new("a", "", 2.0, Vec::new()).unwrap();
        assert!((image.unit_height() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn quality_toggle_cycles_medium_and_original() {
        assert_eq!(Quality::Medium.toggled(), Quality::Original);
        assert_eq!(Quality::Original.toggled(), Quality::Medium);
        assert_eq!(Quality::Small.toggled(), Quality::Original);
    }

    #[test]
    fn image_path_carries_quality() {
        assert_eq!(
            image_path("abc", Quality::Original),
            "/api/images/abc?quality=original"
        );
    }
}
