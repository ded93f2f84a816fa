//! Trailing-edge debounce.
//!
//! Every call restarts the quiet interval; only the last value seen before
//! the interval elapses is committed.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T> Clone for Debouncer<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T: Send + 'static> Debouncer<T> {
    /// Build a debouncer and the loop that drives it.
    ///
    /// The caller spawns the returned future. It runs until `cancel` fires
    /// or every handle is dropped; in the latter case a pending value is
    /// committed before it exits.
    pub fn new<F>(
        quiet: Duration,
        cancel: CancellationToken,
        on_commit: F,
    ) -> (Self, impl Future<Output = ()> + Send + 'static)
    where
        F: FnMut(T) + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, run(rx, quiet, cancel, on_commit))
    }

    /// Schedule `value`, replacing any value still waiting.
    ///
    /// Returns `false` once the loop has stopped.
    pub fn call(&self, value: T) -> bool {
        self.tx.send(value).is_ok()
    }
}

async fn run<T, F>(
    mut rx: mpsc::UnboundedReceiver<T>,
    quiet: Duration,
    cancel: CancellationToken,
    mut on_commit: F,
) where
    F: FnMut(T),
{
    let mut pending: Option<T> = None;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Debounce loop cancelled");
                break;
            }
            received = rx.recv() => match received {
                Some(value) => pending = Some(value),
                None => {
                    if let Some(value) = pending.take() {
                        on_commit(value);
                    }
                    break;
                }
            },
            _ = tokio::time::sleep(quiet), if pending.is_some() => {
                if let Some(value) = pending.take() {
                    on_commit(value);
                }
            }
        }
    }
}
