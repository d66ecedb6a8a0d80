//! Core data types for the Monochrome pipeline.
//!
//! These types describe an image's lifecycle record, the metadata extracted
//! from it, and what an invocation reports back to its host.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::PipelineError;

/// Lifecycle state of an image record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStatus {
    /// Set by the upload collaborator when the object lands
    Uploaded,
    /// Outputs were written successfully (terminal)
    Processed,
    /// A pipeline stage failed (terminal)
    Failed,
}

impl ImageStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ImageStatus::Processed | ImageStatus::Failed)
    }

    /// Whether a record in this state may be moved to `next`.
    ///
    /// Only forward moves out of `Uploaded` are allowed. Re-asserting the
    /// current state is accepted so that redelivered events stay idempotent.
    pub fn can_transition_to(&self, next: ImageStatus) -> bool {
        *self == next || (*self == ImageStatus::Uploaded && next.is_terminal())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageStatus::Uploaded => "uploaded",
            ImageStatus::Processed => "processed",
            ImageStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat string-to-string metadata mapping attached to a record.
///
/// Backed by a sorted map so the serialized document is identical across
/// runs for the same input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageMetadata {
    fields: BTreeMap<String, String>,
}

impl ImageMetadata {
    /// Merge general file info with EXIF fields.
    ///
    /// General info wins when both sides carry the same key.
    pub fn merge<G, E>(general: G, exif: E) -> Self
    where
        G: IntoIterator<Item = (String, String)>,
        E: IntoIterator<Item = (String, String)>,
    {
        let mut fields: BTreeMap<String, String> = exif.into_iter().collect();
        fields.extend(general);
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serialize as a JSON document.
    pub fn to_json(&self, pretty: bool) -> Result<String, serde_json::Error> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

/// One image tracked through its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Source object key
    pub id: String,

    /// Original file name
    pub filename: String,

    pub status: ImageStatus,

    #[serde(default, skip_serializing_if = "ImageMetadata::is_empty")]
    pub metadata: ImageMetadata,
}

impl ImageRecord {
    /// A freshly uploaded record, as the upload collaborator creates it.
    pub fn uploaded(id: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            filename: filename.into(),
            status: ImageStatus::Uploaded,
            metadata: ImageMetadata::default(),
        }
    }

    /// Apply an upsert to this record. Absent fields are left untouched.
    pub fn apply(&mut self, update: RecordUpdate) {
        if let Some(filename) = update.filename {
            self.filename = filename;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(metadata) = update.metadata {
            self.metadata = metadata;
        }
    }

    /// Build a record from an upsert against a missing id.
    pub fn from_update(id: &str, update: RecordUpdate) -> Self {
        let mut record = Self::uploaded(id, file_name_of(id));
        record.apply(update);
        record
    }
}

/// Fields written by a record upsert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordUpdate {
    pub filename: Option<String>,
    pub status: Option<ImageStatus>,
    pub metadata: Option<ImageMetadata>,
}

impl RecordUpdate {
    pub fn status(status: ImageStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_metadata(mut self, metadata: ImageMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Last path segment of an object key.
pub fn file_name_of(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Where a stored artifact lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Summary of a successful invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedImage {
    /// Record id (the source key)
    pub id: String,

    pub source: ObjectLocation,

    /// Grayscale PNG location
    pub derived_image: ObjectLocation,

    /// Metadata document location
    pub metadata_document: ObjectLocation,

    pub width: u32,
    pub height: u32,

    pub metadata: ImageMetadata,
}

/// What an invocation reports to its hosting runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResult {
    pub status_code: u16,

    pub body: String,

    /// Failing stage, absent on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

impl InvocationResult {
    pub fn success(image: &ProcessedImage) -> Self {
        Self {
            status_code: 200,
            body: format!(
                "Image {} processed successfully into {}",
                image.id, image.derived_image
            ),
            stage: None,
        }
    }

    pub fn failure(error: &PipelineError) -> Self {
        let stage = error.stage();
        Self {
            status_code: error.status_code(),
            body: format!("{} stage failed: {}", stage, error),
            stage: Some(stage.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        use ImageStatus::*;
        assert!(Uploaded.can_transition_to(Processed));
        assert!(Uploaded.can_transition_to(Failed));
        assert!(Processed.can_transition_to(Processed));
        assert!(!Processed.can_transition_to(Failed));
        assert!(!Processed.can_transition_to(Uploaded));
        assert!(!Failed.can_transition_to(Processed));
        assert!(!Failed.can_transition_to(Uploaded));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&ImageStatus::Processed).unwrap();
        assert_eq!(json, "\"processed\"");
    }

    #[test]
    fn test_merge_general_wins_on_collision() {
        let general = vec![("Make".to_string(), "general".to_string())];
        let exif = vec![
            ("Make".to_string(), "exif".to_string()),
            ("Model".to_string(), "X100".to_string()),
        ];
        let metadata = ImageMetadata::merge(general, exif);
        assert_eq!(metadata.get("Make"), Some("general"));
        assert_eq!(metadata.get("Model"), Some("X100"));
        assert_eq!(metadata.len(), 2);
    }

    #[test]
    fn test_metadata_serializes_as_flat_object() {
        let metadata = ImageMetadata::merge(
            vec![("ImageWidth".to_string(), "100".to_string())],
            Vec::new(),
        );
        let json = metadata.to_json(false).unwrap();
        assert_eq!(json, r#"{"ImageWidth":"100"}"#);
    }

    #[test]
    fn test_record_from_update_uses_key_file_name() {
        let record = ImageRecord::from_update(
            "0f3a/20240101T000000+0000/cat.jpg",
            RecordUpdate::status(ImageStatus::Processed),
        );
        assert_eq!(record.filename, "cat.jpg");
        assert_eq!(record.status, ImageStatus::Processed);
    }

    #[test]
    fn test_apply_keeps_absent_fields() {
        let mut record = ImageRecord::uploaded("a/b.png", "original name.png");
        record.apply(RecordUpdate::status(ImageStatus::Failed));
        assert_eq!(record.filename, "original name.png");
        assert_eq!(record.status, ImageStatus::Failed);
        assert!(record.metadata.is_empty());
    }

    #[test]
    fn test_invocation_result_failure_names_stage() {
        let err = PipelineError::Decode {
            key: "x.jpg".into(),
            message: "bad header".into(),
        };
        let result = InvocationResult::failure(&err);
        assert_eq!(result.status_code, 500);
        assert_eq!(result.stage.as_deref(), Some("decode"));
        assert!(result.body.starts_with("decode stage failed"));
        assert!(!result.is_success());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["statusCode"], 500);
    }
}
