//! Image processing pipeline components.
//!
//! One invocation runs these stages in order:
//! - **loader**: Fetch the source object's bytes
//! - **decode**: Detect the format and decode, within resource limits
//! - **metadata**: General file info plus EXIF fields
//! - **transform**: Grayscale conversion to PNG
//! - **output**: Persist the derived image and metadata document
//! - **status**: Advance the image record's lifecycle state
//! - **processor**: Orchestrates the full pipeline

pub mod decode;
pub mod loader;
pub mod metadata;
pub mod output;
pub mod processor;
pub mod status;
pub mod transform;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports for convenient access
pub use decode::{DecodedImage, ImageDecoder};
pub use loader::ImageLoader;
pub use metadata::{ExifField, MetadataExtractor, MISSING_TAG};
pub use output::OutputWriter;
pub use processor::ImageProcessor;
pub use status::StatusTracker;
pub use transform::GrayscaleTransform;
