//! Render model derived from the session state.

use lumen_core::layout::layout;
use lumen_core::types::{image_path, ImageId, Quality, ViewMode};
use lumen_core::upload::UploadBatch;

use crate::context::GalleryState;

/// One grid tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub id: ImageId,
    /// Grid thumbnail URL (always the `small` tier).
    pub thumbnail: String,
    pub selected: bool,
    /// Rendered height at unit column width.
    pub height: f64,
}

/// Everything a host needs to draw the gallery screen.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderModel {
    pub columns: Vec<Vec<Tile>>,
    pub mode: ViewMode,
    /// Lightbox image id and URL at the session quality tier.
    pub lightbox: Option<(ImageId, String)>,
    pub quality: Quality,
    pub loading: bool,
    pub has_more: bool,
    pub search_visible: bool,
    pub selected_count: usize,
    pub upload: Option<UploadBatch>,
}

impl RenderModel {
    pub(crate) fn build(
        state: &GalleryState,
        base_url: &str,
        column_count: usize,
        upload: Option<UploadBatch>,
    ) -> Self {
        let columns = layout(state.catalog.read(), column_count)
            .into_iter()
            .map(|column| {
                column
                    .images
                    .into_iter()
                    .map(|image| Tile {
                        id: image.id.clone(),
                        thumbnail: format!("{base_url}{}", image_path(&image.id, Quality::Small)),
                        selected: state.selection.contains(&image.id),
                        height: image.unit_height(),
                    })
                    .collect()
            })
            .collect();

        let quality = state.lightbox.quality();
        let lightbox = state
            .lightbox
            .current()
            .map(|id| (id.to_string(), format!("{base_url}{}", image_path(id, quality))));

        Self {
            columns,
            mode: state.catalog.mode(),
            lightbox,
            quality,
            loading: state.cursor.is_loading(),
            has_more: state.cursor.has_more(),
            search_visible: state.search_visible,
            selected_count: state.selection.len(),
            upload,
        }
    }

    pub fn tile_count(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }
}
