//! Error types for the Monochrome image pipeline.
//!
//! Errors are organized by stage so that an invocation failure can always be
//! reported together with the stage that produced it.

use std::fmt;
use thiserror::Error;

/// Top-level error type for Monochrome operations.
#[derive(Error, Debug)]
pub enum MonochromeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Object or record store errors outside of a pipeline invocation
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors raised by object and record store implementations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The object or record does not exist
    #[error("{bucket}/{key} not found")]
    NotFound { bucket: String, key: String },

    /// The store refused the operation
    #[error("access denied to {bucket}/{key}")]
    AccessDenied { bucket: String, key: String },

    /// The key cannot be mapped onto the store
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// Underlying filesystem failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored record could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether this error means the requested item does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            StoreError::NotFound { .. } => true,
            StoreError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// The pipeline stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Event,
    Fetch,
    Decode,
    Transform,
    WriteImage,
    WriteMetadata,
    Status,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Event => "event",
            Stage::Fetch => "fetch",
            Stage::Decode => "decode",
            Stage::Transform => "transform",
            Stage::WriteImage => "write-image",
            Stage::WriteMetadata => "write-metadata",
            Stage::Status => "status",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline processing errors, one variant family per stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The notification payload does not reference exactly one object
    #[error("Malformed event: {message}")]
    MalformedEvent { message: String },

    /// The source object could not be loaded
    #[error("Fetch failed for {bucket}/{key}: {source}")]
    Fetch {
        bucket: String,
        key: String,
        #[source]
        source: StoreError,
    },

    /// The source bytes are not a decodable image
    #[error("Decode error for {key}: {message}")]
    Decode { key: String, message: String },

    /// Source buffer exceeds the configured size limit
    #[error("File too large: {key} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge { key: String, size_mb: u64, max_mb: u64 },

    /// Image dimensions exceed the configured limit
    #[error("Image too large: {key} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        key: String,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Grayscale conversion or PNG encoding failed
    #[error("Transform failed for {key}: {message}")]
    Transform { key: String, message: String },

    /// Writing the derived image failed
    #[error("Writing derived image to {bucket}/{key} failed: {source}")]
    WriteImage {
        bucket: String,
        key: String,
        #[source]
        source: StoreError,
    },

    /// Writing the metadata document failed
    #[error("Writing metadata to {bucket}/{key} failed: {source}")]
    WriteMetadata {
        bucket: String,
        key: String,
        #[source]
        source: StoreError,
    },

    /// Reading or updating the image record failed
    #[error("Record store error for {id}: {message}")]
    RecordStore { id: String, message: String },
}

impl PipelineError {
    /// The stage that raised this error.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::MalformedEvent { .. } => Stage::Event,
            PipelineError::Fetch { .. } => Stage::Fetch,
            PipelineError::Decode { .. }
            | PipelineError::FileTooLarge { .. }
            | PipelineError::ImageTooLarge { .. } => Stage::Decode,
            PipelineError::Transform { .. } => Stage::Transform,
            PipelineError::WriteImage { .. } => Stage::WriteImage,
            PipelineError::WriteMetadata { .. } => Stage::WriteMetadata,
            PipelineError::RecordStore { .. } => Stage::Status,
        }
    }

    /// HTTP-style status code reported to the hosting runtime.
    pub fn status_code(&self) -> u16 {
        match self {
            PipelineError::MalformedEvent { .. } => 400,
            PipelineError::Fetch { source, .. } if source.is_not_found() => 404,
            _ => 500,
        }
    }
}

/// Convenience type alias for Monochrome results.
pub type Result<T> = std::result::Result<T, MonochromeError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
