//! Bounded-concurrency upload pipeline.
//!
//! A batch is registered synchronously with every file `waiting`, then a
//! background driver admits files to a fixed-width worker pool in
//! submission order. Failures are isolated per file. A batch whose files
//! all succeed is cleared; one with any failure stays for inspection.

use std::sync::Arc;

use tokio::sync::{Mutex, Semaphore};
use tokio::task::{JoinHandle, JoinSet};

use lumen_client::wire::UploadFile;
use lumen_core::error::CoreError;
use lumen_core::upload::{UploadBatch, UploadStatus};
use lumen_events::bus::GalleryEvent;

use crate::context::Context;
use crate::error::SessionError;

/// Final tally of a batch once every file reached a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub done: usize,
    pub failed: usize,
    /// Every file succeeded and the batch was dropped.
    pub cleared: bool,
}

/// Handle on a running batch.
pub struct BatchHandle(JoinHandle<Result<BatchSummary, SessionError>>);

impl BatchHandle {
    pub(crate) fn new(task: JoinHandle<Result<BatchSummary, SessionError>>) -> Self {
        Self(task)
    }

    /// Wait for every file to settle.
    pub async fn wait(self) -> Result<BatchSummary, SessionError> {
        match self.0.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "Upload batch task aborted");
                Err(SessionError::Closed)
            }
        }
    }
}

#[derive(Default)]
struct Slot {
    batch: Option<UploadBatch>,
    /// A driver task owns the batch and has not finished yet.
    running: bool,
}

#[derive(Clone)]
pub struct UploadPipeline {
    ctx: Arc<Context>,
    slot: Arc<Mutex<Slot>>,
    limit: usize,
}

impl UploadPipeline {
    pub(crate) fn new(ctx: Arc<Context>) -> Self {
        let limit = ctx.config.upload_concurrency.max(1);
        Self {
            ctx,
            slot: Arc::new(Mutex::new(Slot::default())),
            limit,
        }
    }

    /// Current batch, if any.
    pub async fn snapshot(&self) -> Option<UploadBatch> {
        self.slot.lock().await.batch.clone()
    }

    /// A batch is still being uploaded.
    pub async fn is_active(&self) -> bool {
        self.slot.lock().await.running
    }

    /// Register `files` and start uploading them.
    ///
    /// Every file is `waiting` by the time this returns. A settled batch
    /// with failures is replaced; a batch still uploading is a conflict.
    pub async fn submit(&self, files: Vec<UploadFile>) -> Result<BatchHandle, SessionError> {
        if files.is_empty() {
            return Err(CoreError::Validation("No files to upload".to_string()).into());
        }
        if self.ctx.cancel.is_cancelled() {
            return Err(SessionError::Closed);
        }

        let batch = UploadBatch::new(files.iter().map(|file| file.filename.clone()));
        {
            let mut slot = self.slot.lock().await;
            if slot.running {
                return Err(
                    CoreError::Conflict("An upload batch is already in progress".to_string())
                        .into(),
                );
            }
            slot.batch = Some(batch.clone());
            slot.running = true;
        }

        tracing::info!(files = files.len(), limit = self.limit, "Upload batch started");
        for item in batch.items() {
            self.publish_status(item.index, &item.filename, item.status);
        }

        let pipeline = self.clone();
        let handle = self.ctx.tracker.spawn(async move { pipeline.drive(files).await });
        Ok(BatchHandle::new(handle))
    }

    async fn drive(self, files: Vec<UploadFile>) -> Result<BatchSummary, SessionError> {
        let semaphore = Arc::new(Semaphore::new(self.limit));
        let mut workers = JoinSet::new();

        for (index, file) in files.into_iter().enumerate() {
            // Sequential acquisition admits files in submission order.
            let permit = tokio::select! {
                _ = self.ctx.cancel.cancelled() => {
                    tracing::info!(index, "Upload batch cancelled");
                    workers.abort_all();
                    return Err(SessionError::Closed);
                }
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => return Err(SessionError::Closed),
                },
            };

            let pipeline = self.clone();
            workers.spawn(async move {
                let _permit = permit;
                pipeline.upload_one(index, file).await;
            });
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Upload worker panicked");
            }
        }

        self.finish().await
    }

    async fn upload_one(&self, index: usize, file: UploadFile) {
        if let Err(e) = self.transition(index, UploadStatus::Uploading).await {
            tracing::error!(index, error = %e, "Upload item could not start");
            return;
        }

        let status = match self.ctx.service.upload_image(&file).await {
            Ok(()) => {
                tracing::debug!(index, filename = %file.filename, "Upload finished");
                UploadStatus::Done
            }
            Err(err) => {
                tracing::warn!(index, filename = %file.filename, error = %err, "Upload failed");
                self.ctx.report(&err);
                UploadStatus::Failed
            }
        };

        if let Err(e) = self.transition(index, status).await {
            tracing::error!(index, error = %e, "Upload item could not settle");
        }
    }

    async fn transition(&self, index: usize, status: UploadStatus) -> Result<(), CoreError> {
        let filename = {
            let mut slot = self.slot.lock().await;
            let batch = slot
                .batch
                .as_mut()
                .ok_or_else(|| CoreError::Conflict("Upload batch is gone".to_string()))?;
            match status {
                UploadStatus::Uploading => batch.start(index)?,
                UploadStatus::Done => batch.complete(index)?,
                UploadStatus::Failed => batch.fail(index)?,
                UploadStatus::Waiting => {
                    return Err(CoreError::InvalidTransition(
                        "Upload items cannot return to waiting".to_string(),
                    ))
                }
            }
            batch.items()[index].filename.clone()
        };
        self.publish_status(index, &filename, status);
        Ok(())
    }

    async fn finish(&self) -> Result<BatchSummary, SessionError> {
        let mut slot = self.slot.lock().await;
        slot.running = false;
        let Some(batch) = slot.batch.as_ref() else {
            return Err(CoreError::Conflict("Upload batch is gone".to_string()).into());
        };
        let done = batch.count(UploadStatus::Done);
        let failed = batch.count(UploadStatus::Failed);
        let cleared = batch.is_complete();
        if cleared {
            slot.batch = None;
        }
        drop(slot);

        if cleared {
            tracing::info!(uploaded = done, "Upload batch complete");
            self.ctx
                .publish(GalleryEvent::UploadBatchCleared { uploaded: done });
        } else {
            tracing::warn!(done, failed, "Upload batch settled with failures");
            self.ctx
                .publish(GalleryEvent::UploadBatchSettled { done, failed });
        }
        Ok(BatchSummary {
            done,
            failed,
            cleared,
        })
    }

    fn publish_status(&self, index: usize, filename: &str, status: UploadStatus) {
        self.ctx.publish(GalleryEvent::UploadStatusChanged {
            index,
            filename: filename.to_string(),
            status,
        });
    }
}
