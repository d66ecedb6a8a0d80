//! Monochrome Core - event-driven grayscale image pipeline.
//!
//! Each invocation is triggered by one object-created notification. It loads
//! the uploaded image, extracts a flat metadata record (dimensions, format and
//! a fixed set of EXIF fields), renders a grayscale PNG, persists both, and
//! advances the image record's lifecycle status.
//!
//! # Architecture
//!
//! ```text
//! Event → Fetch → Decode → {Metadata, Grayscale} → Write outputs → Status
//! ```
//!
//! Object and record stores are traits; the pipeline never owns a global
//! client. In-memory and filesystem implementations ship with the crate.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use monochrome_core::{Config, ImageProcessor, LocalObjectStore, LocalRecordStore};
//!
//! #[tokio::main]
//! async fn main() -> monochrome_core::Result<()> {
//!     let config = Config::load()?;
//!     let processor = ImageProcessor::new(
//!         &config,
//!         Arc::new(LocalObjectStore::new(config.objects_root())),
//!         Arc::new(LocalRecordStore::new(config.records_dir())),
//!     );
//!
//!     let payload = std::fs::read_to_string("event.json")?;
//!     let result = processor.handle_event(&payload).await;
//!     println!("{}: {}", result.status_code, result.body);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod event;
pub mod pipeline;
pub mod store;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{
    ConfigError, MonochromeError, PipelineError, PipelineResult, Result, Stage, StoreError,
};
pub use pipeline::ImageProcessor;
pub use store::{
    LocalObjectStore, LocalRecordStore, MemoryObjectStore, MemoryRecordStore, ObjectStore,
    RecordStore,
};
pub use types::{
    ImageMetadata, ImageRecord, ImageStatus, InvocationResult, ObjectLocation, ProcessedImage,
    RecordUpdate,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
