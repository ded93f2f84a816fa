//! Viewport sentinel trigger.
//!
//! The host decides when the grid's loading element comes into view (a
//! browser observer, a terminal scroll position, a test) and calls
//! [`ViewportSentinel::notify_visible`]. The session listens and turns
//! each notification into a page advance.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::controller::{AdvanceOutcome, PaginationController};

#[derive(Clone)]
pub struct ViewportSentinel {
    tx: mpsc::UnboundedSender<()>,
}

impl ViewportSentinel {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// The sentinel element became visible.
    ///
    /// Returns `false` once the session has shut down.
    pub fn notify_visible(&self) -> bool {
        self.tx.send(()).is_ok()
    }
}

/// Advance pagination for each notification until `cancel` fires.
///
/// Notifications that arrive while a fetch is in flight are dropped; the
/// host notifies again if the sentinel is still in view.
pub(crate) async fn listen(
    mut rx: mpsc::UnboundedReceiver<()>,
    controller: PaginationController,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Sentinel listener cancelled");
                break;
            }
            received = rx.recv() => {
                if received.is_none() {
                    break;
                }
                match controller.advance().await {
                    Ok(AdvanceOutcome::Loaded { count, has_more }) => {
                        tracing::trace!(count, has_more, "Sentinel advanced pagination");
                    }
                    Ok(_) => {}
                    Err(e) => tracing::debug!(error = %e, "Sentinel page advance failed"),
                }
                while rx.try_recv().is_ok() {}
            }
        }
    }
}
