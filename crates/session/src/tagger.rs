//! Selection, screen modes and bulk tag edits.

use std::collections::BTreeSet;
use std::sync::Arc;

use lumen_client::wire::TagChangeRequest;
use lumen_core::catalog::TagEdit;
use lumen_core::error::CoreError;
use lumen_core::selection::Coverage;
use lumen_core::types::ViewMode;
use lumen_core::validation::normalize_tags;
use lumen_events::bus::GalleryEvent;

use crate::context::Context;
use crate::error::SessionError;
use crate::navigator::Navigator;

/// How a grid click was routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Tagging mode: the selection changed and now holds `count` ids.
    Selected { count: usize },
    /// Any other mode: the image was opened in the lightbox.
    Opened,
}

#[derive(Clone)]
pub struct Tagger {
    ctx: Arc<Context>,
    navigator: Navigator,
}

impl Tagger {
    pub(crate) fn new(ctx: Arc<Context>, navigator: Navigator) -> Self {
        Self { ctx, navigator }
    }

    pub async fn mode(&self) -> ViewMode {
        self.ctx.state.lock().await.catalog.mode()
    }

    /// Switch screen mode. Leaving tagging mode drops the selection.
    pub async fn set_mode(&self, mode: ViewMode) {
        let mut state = self.ctx.state.lock().await;
        let previous = state.catalog.mode();
        if previous == mode {
            return;
        }
        state.catalog.set_mode(mode);
        let cleared = previous == ViewMode::Tagging && !state.selection.is_empty();
        if previous == ViewMode::Tagging {
            state.selection.clear();
        }
        drop(state);

        tracing::debug!(from = ?previous, to = ?mode, "View mode changed");
        self.ctx.publish(GalleryEvent::ModeChanged { mode });
        if cleared {
            self.ctx.publish(GalleryEvent::SelectionChanged { count: 0 });
        }
    }

    /// Flip between tagging and browsing.
    pub async fn toggle_tag_mode(&self) -> ViewMode {
        let next = match self.mode().await {
            ViewMode::Tagging => ViewMode::Browse,
            ViewMode::Browse | ViewMode::Upload => ViewMode::Tagging,
        };
        self.set_mode(next).await;
        next
    }

    /// Route a click on a grid tile.
    pub async fn click(&self, id: &str, extend: bool) -> Result<ClickOutcome, SessionError> {
        let mut guard = self.ctx.state.lock().await;
        let state = &mut *guard;
        if state.catalog.mode() != ViewMode::Tagging {
            drop(guard);
            self.navigator.open(id).await?;
            return Ok(ClickOutcome::Opened);
        }

        state.selection.click(id, extend, state.catalog.read())?;
        let count = state.selection.len();
        drop(guard);

        self.ctx.publish(GalleryEvent::SelectionChanged { count });
        Ok(ClickOutcome::Selected { count })
    }

    pub async fn clear_selection(&self) {
        let mut state = self.ctx.state.lock().await;
        if state.selection.is_empty() {
            return;
        }
        state.selection.clear();
        drop(state);
        self.ctx.publish(GalleryEvent::SelectionChanged { count: 0 });
    }

    /// Selected ids in visible order.
    pub async fn selected_ids(&self) -> Vec<String> {
        let state = self.ctx.state.lock().await;
        state.selection.ordered_ids(state.catalog.read())
    }

    pub async fn union_tags(&self) -> BTreeSet<String> {
        let state = self.ctx.state.lock().await;
        state.selection.union_tags(state.catalog.read())
    }

    pub async fn intersection_tags(&self) -> BTreeSet<String> {
        let state = self.ctx.state.lock().await;
        state.selection.intersection_tags(state.catalog.read())
    }

    pub async fn tag_coverage(&self) -> Vec<(String, Coverage)> {
        let state = self.ctx.state.lock().await;
        state.selection.tag_coverage(state.catalog.read())
    }

    /// Add `tags` to every selected image. Returns how many images changed.
    pub async fn add_tags<I, S>(&self, tags: I) -> Result<usize, SessionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.edit_tags(tags, TagEdit::Add).await
    }

    /// Remove `tags` from every selected image. Returns how many images changed.
    pub async fn remove_tags<I, S>(&self, tags: I) -> Result<usize, SessionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.edit_tags(tags, TagEdit::Remove).await
    }

    /// Send one batch request for the whole selection, then patch the
    /// catalog once the server confirms.
    async fn edit_tags<I, S>(&self, tags: I, edit: TagEdit) -> Result<usize, SessionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags = normalize_tags(tags)?;
        let image_ids = self.selected_ids().await;
        if image_ids.is_empty() {
            return Err(CoreError::Validation("No images selected".to_string()).into());
        }

        let body = TagChangeRequest { image_ids, tags };
        let result = match edit {
            TagEdit::Add => self.ctx.service.add_tags(&body).await,
            TagEdit::Remove => self.ctx.service.remove_tags(&body).await,
        };
        if let Err(err) = result {
            tracing::warn!(images = body.image_ids.len(), error = %err, "Tag update failed");
            self.ctx.report(&err);
            return Err(err.into());
        }

        let mut state = self.ctx.state.lock().await;
        let changed = state.catalog.patch_tags(&body.image_ids, &body.tags, edit);
        let event = state.catalog_changed();
        drop(state);

        tracing::info!(
            images = body.image_ids.len(),
            tags = ?body.tags,
            changed,
            "Tags updated"
        );
        if changed > 0 {
            self.ctx.publish(event);
        }
        Ok(changed)
    }
}
