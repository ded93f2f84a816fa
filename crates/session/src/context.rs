//! State and plumbing shared by every session component.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use lumen_client::api::ApiError;
use lumen_client::service::ImageService;
use lumen_core::catalog::Catalog;
use lumen_core::lightbox::Lightbox;
use lumen_core::pagination::Cursor;
use lumen_core::selection::Selection;
use lumen_events::bus::{EventBus, GalleryEvent};

use crate::config::SessionConfig;

/// Everything the engine mutates in response to user actions.
///
/// Lives behind one lock; no component holds it across a network call.
pub(crate) struct GalleryState {
    pub catalog: Catalog,
    pub cursor: Cursor,
    pub selection: Selection,
    pub lightbox: Lightbox,
    pub search_visible: bool,
}

impl GalleryState {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            catalog: Catalog::new(),
            cursor: Cursor::new(config.page_size),
            selection: Selection::new(),
            lightbox: Lightbox::new(config.prefetch_threshold),
            search_visible: false,
        }
    }

    /// Event describing the catalog after an in-place change.
    pub fn catalog_changed(&self) -> GalleryEvent {
        GalleryEvent::CatalogChanged {
            revision: self.catalog.revision(),
            len: self.catalog.len(),
        }
    }
}

pub(crate) struct Context {
    pub config: SessionConfig,
    pub service: Arc<dyn ImageService>,
    pub bus: Arc<EventBus>,
    pub state: Mutex<GalleryState>,
    pub cancel: CancellationToken,
    /// Background work spawned by user actions.
    pub tracker: TaskTracker,
    /// Long-running listeners that only stop on shutdown.
    pub listeners: TaskTracker,
}

impl Context {
    pub fn new(config: SessionConfig, service: Arc<dyn ImageService>, bus: Arc<EventBus>) -> Self {
        let state = Mutex::new(GalleryState::new(&config));
        Self {
            config,
            service,
            bus,
            state,
            cancel: CancellationToken::new(),
            tracker: TaskTracker::new(),
            listeners: TaskTracker::new(),
        }
    }

    pub fn publish(&self, event: GalleryEvent) {
        self.bus.publish(event);
    }

    /// Run `fut` in the background until it finishes or the session shuts down.
    pub fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cancel = self.cancel.clone();
        self.tracker.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = fut => {}
            }
        });
    }

    /// Route a 401 to the host's re-authentication flow.
    pub fn report(&self, err: &ApiError) {
        if err.is_session_expired() {
            tracing::warn!("Image service rejected the session");
            self.publish(GalleryEvent::SessionExpired);
        }
    }
}
