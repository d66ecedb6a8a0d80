//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Locations backing the local object and record stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory of the object store; each bucket is a subdirectory
    pub objects_root: PathBuf,

    /// Directory holding one JSON file per image record
    pub records_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            objects_root: PathBuf::from("~/.monochrome/objects"),
            records_dir: PathBuf::from("~/.monochrome/records"),
        }
    }
}

/// Output locations and key conventions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Bucket receiving the grayscale PNG
    pub bucket: String,

    /// Key prefix for derived images
    pub image_prefix: String,

    /// Bucket receiving the metadata document
    pub metadata_bucket: String,

    /// Key prefix for metadata documents
    pub metadata_prefix: String,

    /// Appended to the base name before `.json`
    pub metadata_suffix: String,

    /// Pretty-print the metadata document
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            bucket: "monochrome-output".to_string(),
            image_prefix: "grayscale/".to_string(),
            metadata_bucket: "monochrome-output".to_string(),
            metadata_prefix: "metadata/".to_string(),
            metadata_suffix: "_metadata".to_string(),
            pretty: true,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum source object size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            max_image_dimension: 20000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
