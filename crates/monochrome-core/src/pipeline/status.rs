//! Image record lifecycle updates.
//!
//! `processed` is written only after every output is persisted, which makes
//! the status field the commit marker of an invocation. Failures after the
//! event was resolved move the record to `failed`.

use std::sync::Arc;

use crate::error::PipelineError;
use crate::store::RecordStore;
use crate::types::{ImageMetadata, ImageStatus, RecordUpdate};

/// Moves image records through their state machine.
pub struct StatusTracker {
    records: Arc<dyn RecordStore>,
}

impl StatusTracker {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }

    /// Mark the record processed and attach its metadata.
    pub async fn mark_processed(
        &self,
        id: &str,
        metadata: ImageMetadata,
    ) -> Result<(), PipelineError> {
        let update = RecordUpdate::status(ImageStatus::Processed).with_metadata(metadata);
        self.transition(id, ImageStatus::Processed, update).await
    }

    /// Mark the record failed.
    pub async fn mark_failed(&self, id: &str) -> Result<(), PipelineError> {
        let update = RecordUpdate::status(ImageStatus::Failed);
        self.transition(id, ImageStatus::Failed, update).await
    }

    /// Check that the record can still reach `processed`.
    ///
    /// Runs before any work so that a record in a terminal state other than
    /// `processed` never gets fresh outputs.
    pub async fn ensure_processable(&self, id: &str) -> Result<ImageStatus, PipelineError> {
        let current = self.current(id).await?;
        check_transition(id, current, ImageStatus::Processed)?;
        Ok(current)
    }

    async fn current(&self, id: &str) -> Result<ImageStatus, PipelineError> {
        Ok(self
            .records
            .get(id)
            .await
            .map_err(|e| record_error(id, e.to_string()))?
            .map(|record| record.status)
            // Records the upload side never created start out as uploaded
            .unwrap_or(ImageStatus::Uploaded))
    }

    async fn transition(
        &self,
        id: &str,
        next: ImageStatus,
        update: RecordUpdate,
    ) -> Result<(), PipelineError> {
        let current = self.current(id).await?;
        check_transition(id, current, next)?;

        self.records
            .upsert(id, update)
            .await
            .map_err(|e| record_error(id, e.to_string()))?;
        tracing::debug!("Record {} status {} -> {}", id, current, next);
        Ok(())
    }
}

fn check_transition(id: &str, current: ImageStatus, next: ImageStatus) -> Result<(), PipelineError> {
    if current.can_transition_to(next) {
        Ok(())
    } else {
        Err(record_error(
            id,
            format!("illegal status transition {} -> {}", current, next),
        ))
    }
}

fn record_error(id: &str, message: String) -> PipelineError {
    PipelineError::RecordStore {
        id: id.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRecordStore;
    use crate::types::ImageRecord;

    fn metadata() -> ImageMetadata {
        ImageMetadata::merge(vec![("ImageWidth".to_string(), "1".to_string())], Vec::new())
    }

    #[tokio::test]
    async fn test_uploaded_to_processed_attaches_metadata() {
        let store = Arc::new(MemoryRecordStore::new());
        store.insert(ImageRecord::uploaded("k/cat.jpg", "cat.jpg"));
        let tracker = StatusTracker::new(store.clone());

        tracker.mark_processed("k/cat.jpg", metadata()).await.unwrap();

        let record = store.record("k/cat.jpg").unwrap();
        assert_eq!(record.status, ImageStatus::Processed);
        assert_eq!(record.metadata, metadata());
        assert_eq!(record.filename, "cat.jpg");
    }

    #[tokio::test]
    async fn test_missing_record_is_created() {
        let store = Arc::new(MemoryRecordStore::new());
        let tracker = StatusTracker::new(store.clone());
        tracker.mark_failed("x/y.png").await.unwrap();
        let record = store.record("x/y.png").unwrap();
        assert_eq!(record.status, ImageStatus::Failed);
        assert_eq!(record.filename, "y.png");
    }

    #[tokio::test]
    async fn test_reprocessing_is_idempotent() {
        let store = Arc::new(MemoryRecordStore::new());
        let tracker = StatusTracker::new(store.clone());
        tracker.mark_processed("a.jpg", metadata()).await.unwrap();
        tracker.mark_processed("a.jpg", metadata()).await.unwrap();
        assert_eq!(store.record("a.jpg").unwrap().status, ImageStatus::Processed);
    }

    #[tokio::test]
    async fn test_terminal_states_do_not_change() {
        let store = Arc::new(MemoryRecordStore::new());
        let tracker = StatusTracker::new(store.clone());

        tracker.mark_processed("done.jpg", metadata()).await.unwrap();
        let err = tracker.mark_failed("done.jpg").await.unwrap_err();
        assert!(err.to_string().contains("processed -> failed"));
        assert_eq!(store.record("done.jpg").unwrap().status, ImageStatus::Processed);

        tracker.mark_failed("bad.jpg").await.unwrap();
        let err = tracker.mark_processed("bad.jpg", metadata()).await.unwrap_err();
        assert!(matches!(err, PipelineError::RecordStore { .. }));
        assert_eq!(store.record("bad.jpg").unwrap().status, ImageStatus::Failed);
    }

    #[tokio::test]
    async fn test_store_failure_is_record_store_error() {
        let store = Arc::new(MemoryRecordStore::new());
        store.set_unavailable(true);
        let tracker = StatusTracker::new(store);
        let err = tracker.mark_processed("a.jpg", metadata()).await.unwrap_err();
        assert!(matches!(err, PipelineError::RecordStore { .. }));
    }

    #[tokio::test]
    async fn test_ensure_processable() {
        let store = Arc::new(MemoryRecordStore::new());
        let tracker = StatusTracker::new(store.clone());

        assert_eq!(
            tracker.ensure_processable("new.jpg").await.unwrap(),
            ImageStatus::Uploaded
        );

        tracker.mark_processed("done.jpg", metadata()).await.unwrap();
        assert_eq!(
            tracker.ensure_processable("done.jpg").await.unwrap(),
            ImageStatus::Processed
        );

        tracker.mark_failed("bad.jpg").await.unwrap();
        let err = tracker.ensure_processable("bad.jpg").await.unwrap_err();
        assert!(err.to_string().contains("failed -> processed"));
    }
}
