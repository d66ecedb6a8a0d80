//! Source object retrieval.

use std::sync::Arc;

use crate::error::PipelineError;
use crate::store::ObjectStore;
use crate::types::ObjectLocation;

/// Fetches raw source bytes from the object store.
pub struct ImageLoader {
    objects: Arc<dyn ObjectStore>,
}

impl ImageLoader {
    pub fn new(objects: Arc<dyn ObjectStore>) -> Self {
        Self { objects }
    }

    /// Load the full object. Missing or forbidden objects are not retried.
    pub async fn load(&self, source: &ObjectLocation) -> Result<Vec<u8>, PipelineError> {
        let bytes = self
            .objects
            .get(&source.bucket, &source.key)
            .await
            .map_err(|e| PipelineError::Fetch {
                bucket: source.bucket.clone(),
                key: source.key.clone(),
                source: e,
            })?;
        tracing::debug!("Loaded {} ({} bytes)", source, bytes.len());
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryObjectStore;

    #[tokio::test]
    async fn test_load_existing() {
        let store = Arc::new(MemoryObjectStore::new());
        store.insert("uploads", "a.jpg", vec![0xFF, 0xD8]);
        let loader = ImageLoader::new(store);
        let bytes = loader
            .load(&ObjectLocation::new("uploads", "a.jpg"))
            .await
            .unwrap();
        assert_eq!(bytes, vec![0xFF, 0xD8]);
    }

    #[tokio::test]
    async fn test_missing_object_is_fetch_error() {
        let loader = ImageLoader::new(Arc::new(MemoryObjectStore::new()));
        let err = loader
            .load(&ObjectLocation::new("uploads", "gone.jpg"))
            .await
            .unwrap_err();
        match err {
            PipelineError::Fetch { key, source, .. } => {
                assert_eq!(key, "gone.jpg");
                assert!(source.is_not_found());
            }
            other => panic!("expected fetch error, got {other:?}"),
        }
    }
}
