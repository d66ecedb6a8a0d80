//! Persisting the derived image and the metadata document.
//!
//! Both artifacts are addressed by the source key's base name: the last path
//! segment with its final extension removed. The two writes are independent;
//! a failed metadata write does not remove an image that was already stored.

use std::path::Path;
use std::sync::Arc;

use crate::config::OutputConfig;
use crate::error::PipelineError;
use crate::store::ObjectStore;
use crate::types::{file_name_of, ImageMetadata, ObjectLocation};

/// Base name of a source key: `a/b/photo.v2.jpg` becomes `photo.v2`.
pub fn base_name(key: &str) -> &str {
    let file_name = file_name_of(key);
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
}

/// Writes pipeline outputs to the object store.
pub struct OutputWriter {
    objects: Arc<dyn ObjectStore>,
    config: OutputConfig,
}

impl OutputWriter {
    pub fn new(objects: Arc<dyn ObjectStore>, config: OutputConfig) -> Self {
        Self { objects, config }
    }

    /// Where the grayscale PNG for `source_key` is stored.
    pub fn image_location(&self, source_key: &str) -> ObjectLocation {
        ObjectLocation::new(
            self.config.bucket.clone(),
            format!("{}{}.png", self.config.image_prefix, base_name(source_key)),
        )
    }

    /// Where the metadata document for `source_key` is stored.
    pub fn metadata_location(&self, source_key: &str) -> ObjectLocation {
        ObjectLocation::new(
            self.config.metadata_bucket.clone(),
            format!(
                "{}{}{}.json",
                self.config.metadata_prefix,
                base_name(source_key),
                self.config.metadata_suffix
            ),
        )
    }

    /// Store the derived PNG.
    pub async fn write_image(
        &self,
        source_key: &str,
        png: Vec<u8>,
    ) -> Result<ObjectLocation, PipelineError> {
        let location = self.image_location(source_key);
        let len = png.len();
        self.objects
            .put(&location.bucket, &location.key, png)
            .await
            .map_err(|e| PipelineError::WriteImage {
                bucket: location.bucket.clone(),
                key: location.key.clone(),
                source: e,
            })?;
        tracing::debug!("Wrote derived image to {} ({} bytes)", location, len);
        Ok(location)
    }

    /// Serialize and store the metadata document.
    pub async fn write_metadata(
        &self,
        source_key: &str,
        metadata: &ImageMetadata,
    ) -> Result<ObjectLocation, PipelineError> {
        let location = self.metadata_location(source_key);
        let document = metadata
            .to_json(self.config.pretty)
            .map_err(|e| PipelineError::WriteMetadata {
                bucket: location.bucket.clone(),
                key: location.key.clone(),
                source: e.into(),
            })?;
        self.objects
            .put(&location.bucket, &location.key, document.into_bytes())
            .await
            .map_err(|e| PipelineError::WriteMetadata {
                bucket: location.bucket.clone(),
                key: location.key.clone(),
                source: e,
            })?;
        tracing::debug!("Wrote metadata document to {}", location);
        Ok(location)
    }
}
