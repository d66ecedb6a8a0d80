//! Pipeline orchestration - wires together all processing stages.

use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::error::PipelineError;
use crate::event;
use crate::store::{ObjectStore, RecordStore};
use crate::types::{InvocationResult, ObjectLocation, ProcessedImage};

use super::decode::ImageDecoder;
use super::loader::ImageLoader;
use super::metadata::MetadataExtractor;
use super::output::OutputWriter;
use super::status::StatusTracker;
use super::transform::GrayscaleTransform;

/// Runs one invocation per object-created notification.
///
/// Store handles are injected so hosts and tests choose their backends.
pub struct ImageProcessor {
    loader: ImageLoader,
    decoder: ImageDecoder,
    writer: OutputWriter,
    tracker: StatusTracker,
}

impl ImageProcessor {
    /// Create a new image processor over the given stores.
    pub fn new(
        config: &Config,
        objects: Arc<dyn ObjectStore>,
        records: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            loader: ImageLoader::new(objects.clone()),
            decoder: ImageDecoder::new(config.limits.clone()),
            writer: OutputWriter::new(objects, config.output.clone()),
            tracker: StatusTracker::new(records),
        }
    }

    /// Handle a raw JSON notification and report the outcome to the host.
    pub async fn handle_event(&self, payload: &str) -> InvocationResult {
        let outcome = match event::parse_event(payload) {
            Ok(source) => self.process(&source).await,
            Err(e) => Err(e),
        };
        Self::report(outcome)
    }

    /// Handle an already-parsed notification.
    pub async fn handle_value(&self, payload: &serde_json::Value) -> InvocationResult {
        let outcome = match event::source_object(payload) {
            Ok(source) => self.process(&source).await,
            Err(e) => Err(e),
        };
        Self::report(outcome)
    }

    fn report(outcome: Result<ProcessedImage, PipelineError>) -> InvocationResult {
        match outcome {
            Ok(image) => {
                tracing::info!(
                    "Processed {} ({}x{}) -> {}",
                    image.id,
                    image.width,
                    image.height,
                    image.derived_image
                );
                InvocationResult::success(&image)
            }
            Err(e) => {
                tracing::error!("Invocation failed in {} stage: {}", e.stage(), e);
                InvocationResult::failure(&e)
            }
        }
    }

    /// Process one source object through every stage.
    ///
    /// On failure the record is marked `failed` before the error is returned.
    /// Recording the failure is best-effort and never replaces the stage error.
    pub async fn process(&self, source: &ObjectLocation) -> Result<ProcessedImage, PipelineError> {
        match self.run(source).await {
            Ok(image) => Ok(image),
            Err(e) => {
                if let Err(status_err) = self.tracker.mark_failed(&source.key).await {
                    tracing::warn!(
                        "Could not record failure for {}: {}",
                        source.key,
                        status_err
                    );
                }
                Err(e)
            }
        }
    }

    async fn run(&self, source: &ObjectLocation) -> Result<ProcessedImage, PipelineError> {
        let start = Instant::now();
        tracing::debug!("Processing: {}", source);

        // Refuse records that can no longer be committed before doing any work
        self.tracker.ensure_processable(&source.key).await?;

        // Fetch
        let bytes = Arc::new(self.loader.load(source).await?);
        tracing::trace!("  Fetch: {:?}", start.elapsed());

        // Decode
        let decode_start = Instant::now();
        let decoded = self.decoder.decode(bytes.clone(), &source.key).await?;
        tracing::trace!("  Decode: {:?}", decode_start.elapsed());

        // Metadata and grayscale transform, both CPU-bound
        let (width, height) = (decoded.width, decoded.height);
        let key = source.key.clone();
        let (metadata, png) = tokio::task::spawn_blocking(move || {
            let metadata_start = Instant::now();
            let metadata = MetadataExtractor::extract(&decoded, &bytes);
            tracing::trace!("  Metadata: {:?}", metadata_start.elapsed());

            let transform_start = Instant::now();
            let png = GrayscaleTransform::apply(&decoded.image, &key)?;
            tracing::trace!("  Transform: {:?}", transform_start.elapsed());
            Ok::<_, PipelineError>((metadata, png))
        })
        .await
        .map_err(|e| PipelineError::Transform {
            key: source.key.clone(),
            message: format!("Task join error: {}", e),
        })??;

        // Persist outputs before touching the record
        let derived_image = self.writer.write_image(&source.key, png).await?;
        let metadata_document = self.writer.write_metadata(&source.key, &metadata).await?;

        // Commit
        self.tracker
            .mark_processed(&source.key, metadata.clone())
            .await?;

        tracing::debug!("Processed {} in {:?}", source, start.elapsed());

        Ok(ProcessedImage {
            id: source.key.clone(),
            source: source.clone(),
            derived_image,
            metadata_document,
            width,
            height,
            metadata,
        })
    }
}
