//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the subscribe/notify hub between the session engine
//! and its host. It is designed to be shared via `Arc<EventBus>`.

use serde::Serialize;
use tokio::sync::broadcast;

use lumen_core::types::{ImageId, Quality, ViewMode};
use lumen_core::upload::UploadStatus;

// ---------------------------------------------------------------------------
// GalleryEvent
// ---------------------------------------------------------------------------

/// Something the host may want to react to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GalleryEvent {
    /// The catalog was replaced, appended to or patched.
    CatalogChanged { revision: u64, len: usize },

    /// A search term was committed and the catalog reset.
    TermCommitted { term: String },

    /// A page response was applied.
    PageLoaded {
        term: String,
        page: u32,
        count: usize,
        has_more: bool,
    },

    /// A page fetch failed; the same page is eligible for retry.
    PageFailed { term: String, page: u32, error: String },

    /// A response for a superseded term arrived and was dropped.
    StaleResponseDiscarded { term: String, page: u32 },

    /// The server answered 401; the host should re-authenticate.
    SessionExpired,

    /// Image bytes should be fetched ahead of display.
    Prefetch { id: ImageId, quality: Quality },

    /// The lightbox opened, moved or closed.
    LightboxChanged { open: Option<ImageId>, quality: Quality },

    /// The grid element for `id` should be scrolled into view.
    ScrollIntoView { id: ImageId },

    /// Selection membership changed.
    SelectionChanged { count: usize },

    /// Screen mode changed.
    ModeChanged { mode: ViewMode },

    /// The search box was shown or hidden.
    SearchToggled { visible: bool },

    /// One upload item changed status.
    UploadStatusChanged {
        index: usize,
        filename: String,
        status: UploadStatus,
    },

    /// Every item of the batch reached a terminal status.
    UploadBatchSettled { done: usize, failed: usize },

    /// The batch finished cleanly and was dropped.
    UploadBatchCleared { uploaded: usize },
}

impl GalleryEvent {
    /// Short dotted name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            GalleryEvent::CatalogChanged { .. } => "catalog.changed",
            GalleryEvent::TermCommitted { .. } => "search.committed",
            GalleryEvent::PageLoaded { .. } => "search.page_loaded",
            GalleryEvent::PageFailed { .. } => "search.page_failed",
            GalleryEvent::StaleResponseDiscarded { .. } => "search.stale_discarded",
            GalleryEvent::SessionExpired => "session.expired",
            GalleryEvent::Prefetch { .. } => "lightbox.prefetch",
            GalleryEvent::LightboxChanged { .. } => "lightbox.changed",
            GalleryEvent::ScrollIntoView { .. } => "grid.scroll_into_view",
            GalleryEvent::SelectionChanged { .. } => "selection.changed",
            GalleryEvent::ModeChanged { .. } => "mode.changed",
            GalleryEvent::SearchToggled { .. } => "search.toggled",
            GalleryEvent::UploadStatusChanged { .. } => "upload.status",
            GalleryEvent::UploadBatchSettled { .. } => "upload.settled",
            GalleryEvent::UploadBatchCleared { .. } => "upload.cleared",
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`GalleryEvent`].
///
/// # Usage
///
/// ```rust
/// use lumen_events::bus::{EventBus, GalleryEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(GalleryEvent::SessionExpired);
/// ```
pub struct EventBus {
    sender: broadcast::Sender<GalleryEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: GalleryEvent) {
        tracing::trace!(event = event.name(), "Publishing gallery event");
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<GalleryEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
