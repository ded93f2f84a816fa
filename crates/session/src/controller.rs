//! Search & pagination controller.
//!
//! Commits search terms, fetches successive pages from the image service
//! and appends them to the catalog. At most one fetch is in flight per
//! search session; a response that lands after the term changed is
//! discarded instead of applied.

use std::sync::Arc;

use lumen_client::wire::SearchRequest;
use lumen_core::pagination::{distinct_page, resolve_has_more, Reconcile};
use lumen_events::bus::GalleryEvent;

use crate::context::Context;
use crate::error::SessionError;

/// What a call to [`PaginationController::advance`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// A page was appended to the catalog.
    Loaded { count: usize, has_more: bool },
    /// A fetch was already in flight or no pages remain.
    Skipped,
    /// The response arrived after the term changed and was dropped.
    Stale,
}

#[derive(Clone)]
pub struct PaginationController {
    ctx: Arc<Context>,
}

impl PaginationController {
    pub(crate) fn new(ctx: Arc<Context>) -> Self {
        Self { ctx }
    }

    /// The committed search term.
    pub async fn term(&self) -> String {
        self.ctx.state.lock().await.cursor.term().to_string()
    }

    /// Start a new search session for `term` and fetch its first page.
    ///
    /// The catalog and selection are cleared before the request goes out;
    /// any fetch still in flight for the previous term becomes stale.
    pub async fn commit_term(&self, term: impl Into<String>) -> Result<AdvanceOutcome, SessionError> {
        let term = term.into();
        {
            let mut state = self.ctx.state.lock().await;
            state.cursor.reset(term.clone());
            state.catalog.clear();
            state.selection.clear();
            let closed = state.lightbox.reconcile(&[]);
            let changed = state.catalog_changed();
            let quality = state.lightbox.quality();
            drop(state);

            tracing::info!(term = %term, "Search term committed");
            self.ctx.publish(GalleryEvent::TermCommitted { term });
            self.ctx.publish(changed);
            self.ctx.publish(GalleryEvent::SelectionChanged { count: 0 });
            if closed {
                self.ctx
                    .publish(GalleryEvent::LightboxChanged { open: None, quality });
            }
        }
        self.advance().await
    }

    /// Commit `term` only if it differs from the committed one.
    pub async fn commit_if_changed(&self, term: String) -> Result<AdvanceOutcome, SessionError> {
        if self.term().await == term {
            tracing::debug!(term = %term, "Search term unchanged, keeping pagination");
            return Ok(AdvanceOutcome::Skipped);
        }
        self.commit_term(term).await
    }

    /// Re-run the committed search from page 1.
    pub async fn refresh(&self) -> Result<AdvanceOutcome, SessionError> {
        let term = self.term().await;
        self.commit_term(term).await
    }

    /// Fetch the next page for the committed term.
    ///
    /// Safe to call repeatedly: while a fetch is in flight, or once the
    /// server reported the last page, this returns [`AdvanceOutcome::Skipped`].
    /// On failure the page is not advanced, so the next call retries it.
    pub async fn advance(&self) -> Result<AdvanceOutcome, SessionError> {
        let request = {
            let mut state = self.ctx.state.lock().await;
            match state.cursor.begin() {
                Some(request) => request,
                None => return Ok(AdvanceOutcome::Skipped),
            }
        };

        tracing::debug!(term = %request.term, page = request.page, "Fetching page");
        let body = SearchRequest {
            query: request.term.clone(),
            page: request.page,
            limit: request.limit,
        };
        let result = self.ctx.service.search_images(&body).await;

        let mut state = self.ctx.state.lock().await;
        match result {
            Ok(response) => {
                let received = response.images.len();
                let has_more =
                    resolve_has_more(&request, response.has_more, response.total, received);
                if state.cursor.complete(&request, has_more) == Reconcile::Stale {
                    drop(state);
                    self.discard(&request.term, request.page);
                    return Ok(AdvanceOutcome::Stale);
                }

                let (images, dropped) = distinct_page(&state.catalog, response.images);
                if dropped > 0 {
                    tracing::debug!(dropped, page = request.page, "Dropped repeated ids from page");
                }
                let count = images.len();
                state.catalog.append(images);
                let changed = state.catalog_changed();
                drop(state);

                tracing::debug!(term = %request.term, page = request.page, count, has_more, "Page loaded");
                self.ctx.publish(GalleryEvent::PageLoaded {
                    term: request.term,
                    page: request.page,
                    count,
                    has_more,
                });
                self.ctx.publish(changed);
                Ok(AdvanceOutcome::Loaded { count, has_more })
            }
            Err(err) => {
                let reconcile = state.cursor.fail(&request);
                drop(state);
                // An expired login is reported even for a superseded fetch.
                self.ctx.report(&err);
                if reconcile == Reconcile::Stale {
                    self.discard(&request.term, request.page);
                    return Ok(AdvanceOutcome::Stale);
                }

                tracing::warn!(term = %request.term, page = request.page, error = %err, "Page fetch failed");
                self.ctx.publish(GalleryEvent::PageFailed {
                    term: request.term,
                    page: request.page,
                    error: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    /// Replace the catalog with the full legacy listing.
    pub async fn load_all(&self) -> Result<usize, SessionError> {
        let images = match self.ctx.service.list_images().await {
            Ok(images) => images,
            Err(err) => {
                tracing::warn!(error = %err, "Listing fetch failed");
                self.ctx.report(&err);
                return Err(err.into());
            }
        };

        let mut guard = self.ctx.state.lock().await;
        let state = &mut *guard;
        state.cursor.reset("");
        state.cursor.exhaust();
        let count = images.len();
        state.catalog.replace(images);
        let removed = state.selection.retain_present(state.catalog.read());
        let closed = state.lightbox.reconcile(state.catalog.read());
        let changed = state.catalog_changed();
        let selected = state.selection.len();
        let quality = state.lightbox.quality();
        drop(guard);

        tracing::info!(count, "Loaded full listing");
        self.ctx.publish(changed);
        if removed > 0 {
            self.ctx
                .publish(GalleryEvent::SelectionChanged { count: selected });
        }
        if closed {
            self.ctx
                .publish(GalleryEvent::LightboxChanged { open: None, quality });
        }
        Ok(count)
    }

    fn discard(&self, term: &str, page: u32) {
        tracing::debug!(term = %term, page, "Discarding stale page response");
        self.ctx.publish(GalleryEvent::StaleResponseDiscarded {
            term: term.to_string(),
            page,
        });
    }
}
