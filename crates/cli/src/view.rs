//! Plain-text rendering of the session for the terminal.

use std::fmt::Write;

use lumen_core::upload::UploadBatch;
use lumen_events::bus::GalleryEvent;
use lumen_session::render::RenderModel;

/// Grid, lightbox and upload state as a few lines of text.
pub fn describe(model: &RenderModel) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "mode={:?} images={} selected={} has_more={} loading={}",
        model.mode,
        model.tile_count(),
        model.selected_count,
        model.has_more,
        model.loading
    );
    for (index, column) in model.columns.iter().enumerate() {
        let tiles: Vec<String> = column
            .iter()
            .map(|tile| {
                if tile.selected {
                    format!("[{}]", tile.id)
                } else {
                    tile.id.clone()
                }
            })
            .collect();
        let height: f64 = column.iter().map(|tile| tile.height).sum();
        let _ = writeln!(out, "  col {index} ({height:.2}): {}", tiles.join(" "));
    }
    if let Some((id, url)) = &model.lightbox {
        let _ = writeln!(out, "lightbox: {id} ({}) {url}", model.quality);
    }
    if model.search_visible {
        let _ = writeln!(out, "search box open");
    }
    if let Some(batch) = &model.upload {
        out.push_str(&describe_upload(batch));
    }
    out
}

pub fn describe_upload(batch: &UploadBatch) -> String {
    let (done, total) = batch.progress();
    let mut out = format!("uploading {done} / {total}\n");
    for item in batch.visible_items() {
        let _ = writeln!(out, "  {} {}", item.status.as_str(), item.filename);
    }
    out
}

/// One-line form of an event; `None` for chatty events the terminal skips.
pub fn event_line(event: &GalleryEvent) -> Option<String> {
    match event {
        GalleryEvent::Prefetch { .. } | GalleryEvent::CatalogChanged { .. } => None,
        GalleryEvent::SessionExpired => {
            Some("session expired: log in again (set LUMEN_USERNAME / LUMEN_PASSWORD)".into())
        }
        other => serde_json::to_string(other).ok(),
    }
}
