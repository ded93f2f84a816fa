//! The gallery session: one object per open gallery screen.
//!
//! ```text
//!   host input ──► Session ──► PaginationController ──► ImageService
//!                     │    └─► Navigator / Tagger        (network)
//!                     │    └─► UploadPipeline ──────────►
//!                     ▼
//!                  EventBus ──► host rendering / auth redirect
//! ```

use std::collections::BTreeSet;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, OnceLock};

use tokio::sync::broadcast;

use lumen_client::service::ImageService;
use lumen_client::wire::UploadFile;
use lumen_core::error::CoreError;
use lumen_core::selection::Coverage;
use lumen_core::types::{Image, Quality, ViewMode};
use lumen_core::upload::UploadBatch;
use lumen_events::bus::{EventBus, GalleryEvent};

use crate::commands::CommandScope;
use crate::config::SessionConfig;
use crate::context::Context;
use crate::controller::{AdvanceOutcome, PaginationController};
use crate::debounce::Debouncer;
use crate::error::SessionError;
use crate::navigator::Navigator;
use crate::render::RenderModel;
use crate::sentinel::{self, ViewportSentinel};
use crate::tagger::{ClickOutcome, Tagger};
use crate::upload::{BatchHandle, UploadPipeline};

struct Listeners {
    query: Debouncer<String>,
    sentinel: ViewportSentinel,
}

#[derive(Clone)]
pub struct Session {
    ctx: Arc<Context>,
    controller: PaginationController,
    navigator: Navigator,
    tagger: Tagger,
    uploads: UploadPipeline,
    listeners: Arc<OnceLock<Listeners>>,
    commands_active: Arc<AtomicBool>,
}

impl Session {
    pub fn new(config: SessionConfig, service: Arc<dyn ImageService>, bus: Arc<EventBus>) -> Self {
        let ctx = Arc::new(Context::new(config, service, bus));
        let controller = PaginationController::new(ctx.clone());
        let navigator = Navigator::new(ctx.clone(), controller.clone());
        let tagger = Tagger::new(ctx.clone(), navigator.clone());
        let uploads = UploadPipeline::new(ctx.clone());
        Self {
            ctx,
            controller,
            navigator,
            tagger,
            uploads,
            listeners: Arc::new(OnceLock::new()),
            commands_active: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.ctx.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GalleryEvent> {
        self.ctx.bus.subscribe()
    }

    // ---- lifecycle ----

    /// Spawn the search debounce and viewport sentinel listeners.
    pub fn start(&self) -> Result<(), SessionError> {
        if self.ctx.cancel.is_cancelled() {
            return Err(SessionError::Closed);
        }

        let controller = self.controller.clone();
        let ctx = self.ctx.clone();
        let (query, debounce_loop) = Debouncer::new(
            self.ctx.config.search_debounce,
            self.ctx.cancel.clone(),
            move |term: String| {
                let controller = controller.clone();
                ctx.spawn(async move {
                    if let Err(e) = controller.commit_if_changed(term).await {
                        tracing::debug!(error = %e, "Debounced search failed");
                    }
                });
            },
        );
        let (sentinel, visible) = ViewportSentinel::channel();

        self.listeners
            .set(Listeners { query, sentinel })
            .map_err(|_| CoreError::Conflict("Session already started".to_string()))?;

        self.ctx.listeners.spawn(debounce_loop);
        self.ctx.listeners.spawn(sentinel::listen(
            visible,
            self.controller.clone(),
            self.ctx.cancel.clone(),
        ));
        tracing::info!(base_url = %self.ctx.config.base_url, "Gallery session started");
        Ok(())
    }

    /// Cancel listeners and background work, then wait for them to exit.
    pub async fn shutdown(&self) {
        self.ctx.cancel.cancel();
        self.ctx.listeners.close();
        self.ctx.tracker.close();
        self.ctx.listeners.wait().await;
        self.ctx.tracker.wait().await;
        tracing::info!("Gallery session stopped");
    }

    /// Wait until background work spawned so far (prefetches, page
    /// advances, upload batches) has finished.
    pub async fn settle(&self) {
        self.ctx.tracker.close();
        self.ctx.tracker.wait().await;
        self.ctx.tracker.reopen();
    }

    fn listeners(&self) -> Result<&Listeners, SessionError> {
        if self.ctx.cancel.is_cancelled() {
            return Err(SessionError::Closed);
        }
        self.listeners.get().ok_or_else(|| {
            SessionError::from(CoreError::InvalidTransition(
                "Session has not been started".to_string(),
            ))
        })
    }

    // ---- search & pagination ----

    /// Feed the search box. The term is committed after the quiet interval.
    pub fn set_query(&self, text: impl Into<String>) -> Result<(), SessionError> {
        if self.listeners()?.query.call(text.into()) {
            Ok(())
        } else {
            Err(SessionError::Closed)
        }
    }

    pub async fn commit_term(&self, term: impl Into<String>) -> Result<AdvanceOutcome, SessionError> {
        self.controller.commit_term(term).await
    }

    pub async fn advance(&self) -> Result<AdvanceOutcome, SessionError> {
        self.controller.advance().await
    }

    pub async fn refresh(&self) -> Result<AdvanceOutcome, SessionError> {
        self.controller.refresh().await
    }

    pub async fn load_all(&self) -> Result<usize, SessionError> {
        self.controller.load_all().await
    }

    pub fn sentinel(&self) -> Result<ViewportSentinel, SessionError> {
        Ok(self.listeners()?.sentinel.clone())
    }

    pub async fn term(&self) -> String {
        self.controller.term().await
    }

    /// Snapshot of the catalog in display order.
    pub async fn images(&self) -> Vec<Image> {
        self.ctx.state.lock().await.catalog.read().to_vec()
    }

    pub async fn has_more(&self) -> bool {
        self.ctx.state.lock().await.cursor.has_more()
    }

    pub async fn is_loading(&self) -> bool {
        self.ctx.state.lock().await.cursor.is_loading()
    }

    pub async fn search_visible(&self) -> bool {
        self.ctx.state.lock().await.search_visible
    }

    pub async fn toggle_search(&self) -> bool {
        let mut state = self.ctx.state.lock().await;
        state.search_visible = !state.search_visible;
        let visible = state.search_visible;
        drop(state);
        self.ctx.publish(GalleryEvent::SearchToggled { visible });
        visible
    }

    /// Hide the search box. Returns whether it was showing.
    pub async fn hide_search(&self) -> bool {
        let mut state = self.ctx.state.lock().await;
        if !state.search_visible {
            return false;
        }
        state.search_visible = false;
        drop(state);
        self.ctx.publish(GalleryEvent::SearchToggled { visible: false });
        true
    }

    // ---- selection & tags ----

    pub async fn mode(&self) -> ViewMode {
        self.tagger.mode().await
    }

    pub async fn set_mode(&self, mode: ViewMode) {
        self.tagger.set_mode(mode).await
    }

    pub async fn toggle_tag_mode(&self) -> ViewMode {
        self.tagger.toggle_tag_mode().await
    }

    pub async fn click(&self, id: &str, extend: bool) -> Result<ClickOutcome, SessionError> {
        self.tagger.click(id, extend).await
    }

    pub async fn clear_selection(&self) {
        self.tagger.clear_selection().await
    }

    pub async fn selected_ids(&self) -> Vec<String> {
        self.tagger.selected_ids().await
    }

    pub async fn union_tags(&self) -> BTreeSet<String> {
        self.tagger.union_tags().await
    }

    pub async fn intersection_tags(&self) -> BTreeSet<String> {
        self.tagger.intersection_tags().await
    }

    pub async fn tag_coverage(&self) -> Vec<(String, Coverage)> {
        self.tagger.tag_coverage().await
    }

    pub async fn add_tags<I, S>(&self, tags: I) -> Result<usize, SessionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tagger.add_tags(tags).await
    }

    pub async fn remove_tags<I, S>(&self, tags: I) -> Result<usize, SessionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tagger.remove_tags(tags).await
    }

    // ---- lightbox ----

    /// Id open in the lightbox, if any.
    pub async fn lightbox(&self) -> Option<String> {
        self.navigator.current().await
    }

    pub async fn quality(&self) -> Quality {
        self.navigator.quality().await
    }

    pub async fn open(&self, id: &str) -> Result<(), SessionError> {
        self.navigator.open(id).await
    }

    pub async fn next(&self) -> Result<(), SessionError> {
        self.navigator.next().await
    }

    pub async fn previous(&self) -> Result<(), SessionError> {
        self.navigator.previous().await
    }

    pub async fn close(&self) -> bool {
        self.navigator.close().await
    }

    pub async fn toggle_quality(&self) -> Result<Quality, SessionError> {
        self.navigator.toggle_quality().await
    }

    // ---- uploads ----

    /// Upload `files`; once every file succeeds the batch is cleared and
    /// the current search is refreshed.
    pub async fn upload(&self, files: Vec<UploadFile>) -> Result<BatchHandle, SessionError> {
        let batch = self.uploads.submit(files).await?;
        let controller = self.controller.clone();
        let task = self.ctx.tracker.spawn(async move {
            let summary = batch.wait().await?;
            if summary.cleared {
                if let Err(e) = controller.refresh().await {
                    tracing::warn!(error = %e, "Refresh after upload failed");
                }
            }
            Ok::<_, SessionError>(summary)
        });
        Ok(BatchHandle::new(task))
    }

    pub async fn upload_snapshot(&self) -> Option<UploadBatch> {
        self.uploads.snapshot().await
    }

    pub async fn upload_active(&self) -> bool {
        self.uploads.is_active().await
    }

    // ---- host surface ----

    pub async fn render_model(&self) -> RenderModel {
        let upload = self.uploads.snapshot().await;
        let state = self.ctx.state.lock().await;
        RenderModel::build(
            &state,
            &self.ctx.config.base_url,
            self.ctx.config.column_count,
            upload,
        )
    }

    /// Install the command router for as long as the returned scope lives.
    pub fn activate_commands(&self) -> Result<CommandScope, SessionError> {
        CommandScope::acquire(self.clone(), self.commands_active.clone())
    }
}
