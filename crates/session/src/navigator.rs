//! Lightbox navigation over the visible catalog.

use std::sync::Arc;

use lumen_core::lightbox::Transition;
use lumen_core::types::Quality;
use lumen_events::bus::GalleryEvent;

use crate::context::{Context, GalleryState};
use crate::controller::PaginationController;
use crate::error::SessionError;

/// Lightbox state read under the same lock as a transition.
struct Shown {
    open: Option<String>,
    quality: Quality,
}

impl Shown {
    fn of(state: &GalleryState) -> Self {
        Self {
            open: state.lightbox.current().map(str::to_string),
            quality: state.lightbox.quality(),
        }
    }
}

#[derive(Clone)]
pub struct Navigator {
    ctx: Arc<Context>,
    controller: PaginationController,
}

impl Navigator {
    pub(crate) fn new(ctx: Arc<Context>, controller: PaginationController) -> Self {
        Self { ctx, controller }
    }

    pub async fn current(&self) -> Option<String> {
        let state = self.ctx.state.lock().await;
        state.lightbox.current().map(str::to_string)
    }

    pub async fn quality(&self) -> Quality {
        self.ctx.state.lock().await.lightbox.quality()
    }

    pub async fn open(&self, id: &str) -> Result<(), SessionError> {
        let (transition, shown) = {
            let mut guard = self.ctx.state.lock().await;
            let state = &mut *guard;
            let transition = state.lightbox.open(id, state.catalog.read())?;
            (transition, Shown::of(state))
        };
        self.apply(transition, shown).await;
        Ok(())
    }

    pub async fn next(&self) -> Result<(), SessionError> {
        let (transition, shown) = {
            let mut guard = self.ctx.state.lock().await;
            let state = &mut *guard;
            let has_more = state.cursor.has_more();
            let transition = state.lightbox.next(state.catalog.read(), has_more)?;
            (transition, Shown::of(state))
        };
        self.apply(transition, shown).await;
        Ok(())
    }

    pub async fn previous(&self) -> Result<(), SessionError> {
        let (transition, shown) = {
            let mut guard = self.ctx.state.lock().await;
            let state = &mut *guard;
            let transition = state.lightbox.previous(state.catalog.read())?;
            (transition, Shown::of(state))
        };
        self.apply(transition, shown).await;
        Ok(())
    }

    /// Close the lightbox. Returns whether it was open.
    pub async fn close(&self) -> bool {
        let (transition, shown) = {
            let mut state = self.ctx.state.lock().await;
            let transition = state.lightbox.close();
            (transition, Shown::of(&state))
        };
        let was_open = transition.moved;
        self.apply(transition, shown).await;
        was_open
    }

    pub async fn toggle_quality(&self) -> Result<Quality, SessionError> {
        let (transition, shown) = {
            let mut guard = self.ctx.state.lock().await;
            let state = &mut *guard;
            let transition = state.lightbox.toggle_quality(state.catalog.read())?;
            (transition, Shown::of(state))
        };
        let quality = shown.quality;
        tracing::debug!(quality = %quality, "Lightbox quality toggled");
        self.ctx.publish(GalleryEvent::LightboxChanged {
            open: shown.open.clone(),
            quality,
        });
        self.apply(transition, shown).await;
        Ok(quality)
    }

    async fn apply(&self, transition: Transition, shown: Shown) {
        let Shown { open, quality } = shown;
        let Transition {
            moved,
            request_page,
            prefetch,
            scroll_into_view,
        } = transition;

        if moved {
            self.ctx.publish(GalleryEvent::LightboxChanged { open, quality });
        }
        if let Some(id) = scroll_into_view {
            self.ctx.publish(GalleryEvent::ScrollIntoView { id });
        }
        for id in prefetch {
            self.prefetch(id, quality);
        }
        if request_page {
            tracing::debug!("Lightbox near the loaded end, requesting next page");
            let controller = self.controller.clone();
            self.ctx.spawn(async move {
                if let Err(e) = controller.advance().await {
                    tracing::debug!(error = %e, "Lightbox page advance failed");
                }
            });
        }
    }

    fn prefetch(&self, id: String, quality: Quality) {
        self.ctx.publish(GalleryEvent::Prefetch {
            id: id.clone(),
            quality,
        });
        let ctx = self.ctx.clone();
        self.ctx.spawn(async move {
            if let Err(e) = ctx.service.prefetch_image(&id, quality).await {
                tracing::debug!(id = %id, error = %e, "Prefetch failed");
                ctx.report(&e);
            }
        });
    }
}
