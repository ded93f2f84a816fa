//! Upload batch bookkeeping.
//!
//! Every item moves `waiting -> uploading -> done | failed` exactly once.
//! The batch only tracks statuses; scheduling lives in the session
//! engine's upload pipeline.

use serde::Serialize;

use crate::error::CoreError;

/// Worker-pool width for uploads.
pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Waiting,
    Uploading,
    Done,
    Failed,
}

impl UploadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UploadStatus::Waiting => "waiting",
            UploadStatus::Uploading => "uploading",
            UploadStatus::Done => "done",
            UploadStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, UploadStatus::Done | UploadStatus::Failed)
    }
}

/// One file of a batch. Items are addressed by their position so two
/// files with the same name do not share a status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadItem {
    pub index: usize,
    pub filename: String,
    pub status: UploadStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadBatch {
    items: Vec<UploadItem>,
}

impl UploadBatch {
    /// Create a batch with every file `waiting`.
    pub fn new<I, S>(filenames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items = filenames
            .into_iter()
            .enumerate()
            .map(|(index, filename)| UploadItem {
                index,
                filename: filename.into(),
                status: UploadStatus::Waiting,
            })
            .collect();
        Self { items }
    }

    pub fn items(&self) -> &[UploadItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn status(&self, index: usize) -> Option<UploadStatus> {
        self.items.get(index).map(|item| item.status)
    }

    /// `waiting -> uploading`.
    pub fn start(&mut self, index: usize) -> Result<(), CoreError> {
        self.transition(index, UploadStatus::Waiting, UploadStatus::Uploading)
    }

    /// `uploading -> done`.
    pub fn complete(&mut self, index: usize) -> Result<(), CoreError> {
        self.transition(index, UploadStatus::Uploading, UploadStatus::Done)
    }

    /// `uploading -> failed`.
    pub fn fail(&mut self, index: usize) -> Result<(), CoreError> {
        self.transition(index, UploadStatus::Uploading, UploadStatus::Failed)
    }

    /// `(done, total)` for an "Uploading 3 / 20" readout.
    pub fn progress(&self) -> (usize, usize) {
        (self.count(UploadStatus::Done), self.items.len())
    }

    pub fn count(&self, status: UploadStatus) -> usize {
        self.items.iter().filter(|item| item.status == status).count()
    }

    /// Items still worth showing (anything not yet done).
    pub fn visible_items(&self) -> impl Iterator<Item = &UploadItem> {
        self.items
            .iter()
            .filter(|item| item.status != UploadStatus::Done)
    }

    /// True once every item of a non-empty batch is `done`.
    pub fn is_complete(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(|item| item.status == UploadStatus::Done)
    }

    /// True once every item has reached a terminal status.
    pub fn is_settled(&self) -> bool {
        self.items.iter().all(|item| item.status.is_terminal())
    }

    fn transition(
        &mut self,
        index: usize,
        from: UploadStatus,
        to: UploadStatus,
    ) -> Result<(), CoreError> {
        let item = self.items.get_mut(index).ok_or_else(|| {
            CoreError::Validation(format!("Upload item {index} does not exist"))
        })?;
        if item.status != from {
            return Err(CoreError::InvalidTransition(format!(
                "Upload item {index} ({}) cannot move from {} to {}",
                item.filename,
                item.status.as_str(),
                to.as_str()
            )));
        }
        item.status = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn new_batch_is_all_waiting() {
        let batch = UploadBatch::new(["a.jpg", "b.jpg"]);
        assert_eq!(batch.count(UploadStatus::Waiting), 2);
        assert_eq!(batch.progress(), (0, 2));
        assert!(!batch.is_complete());
    }

    #[test]
    fn happy_path_completes_batch() {
        let mut batch = UploadBatch::new(["a.jpg", "b.jpg"]);
        for i in 0..2 {
            batch.start(i).unwrap();
            batch.complete(i).unwrap();
        }
        assert!(batch.is_complete());
        assert!(batch.is_settled());
        assert_eq!(batch.visible_items().count(), 0);
    }

    #[test]
    fn failed_item_blocks_completion_but_settles() {
        let mut batch = UploadBatch::new(["a.jpg", "b.jpg"]);
        batch.start(0).unwrap();
        batch.complete(0).unwrap();
        batch.start(1).unwrap();
        batch.fail(1).unwrap();
        assert!(!batch.is_complete());
        assert!(batch.is_settled());
        let visible: Vec<&str> = batch.visible_items().map(|i| i.filename.as_str()).collect();
        assert_eq!(visible, ["b.jpg"]);
    }

    #[test]
    fn transitions_happen_once() {
        let mut batch = UploadBatch::new(["a.jpg"]);
        assert_matches!(batch.complete(0), Err(CoreError::InvalidTransition(_)));
        batch.start(0).unwrap();
        assert_matches!(batch.start(0), Err(CoreError::InvalidTransition(_)));
        batch.fail(0).unwrap();
        assert_matches!(batch.complete(0), Err(CoreError::InvalidTransition(_)));
        assert_eq!(batch.status(0), Some(UploadStatus::Failed));
    }

    #[test]
    fn duplicate_names_tracked_separately() {
        let mut batch = UploadBatch::new(["same.jpg", "same.jpg"]);
        batch.start(1).unwrap();
        assert_eq!(batch.status(0), Some(UploadStatus::Waiting));
        assert_eq!(batch.status(1), Some(UploadStatus::Uploading));
    }

    #[test]
    fn unknown_index_rejected() {
        let mut batch = UploadBatch::new(["a.jpg"]);
        assert_matches!(batch.start(5), Err(CoreError::Validation(_)));
    }

    #[test]
    fn empty_batch_never_complete() {
        assert!(!UploadBatch::default().is_complete());
    }
}
