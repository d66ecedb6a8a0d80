//! Command implementations.

pub mod config;
pub mod invoke;
pub mod status;

use monochrome_core::{Config, ImageProcessor, LocalObjectStore, LocalRecordStore};
use std::sync::Arc;

/// Build a processor over the local stores named in the config.
pub(crate) fn local_processor(config: &Config) -> ImageProcessor {
    let objects = Arc::new(LocalObjectStore::new(config.objects_root()));
    let records = Arc::new(LocalRecordStore::new(config.records_dir()));
    tracing::debug!(
        "Objects under {:?}, records under {:?}",
        config.objects_root(),
        config.records_dir()
    );
    ImageProcessor::new(config, objects, records)
}
