//! Object-created notifications.
//!
//! The payload follows the S3 event notification shape:
//!
//! ```json
//! { "Records": [ { "s3": { "bucket": { "name": "uploads" },
//!                          "object": { "key": "photos/cat.jpg" } } } ] }
//! ```

use serde::Deserialize;

use crate::error::{PipelineError, PipelineResult};
use crate::types::ObjectLocation;

#[derive(Debug, Deserialize)]
struct Notification {
    #[serde(rename = "Records", default)]
    records: Vec<NotificationRecord>,
}

#[derive(Debug, Deserialize)]
struct NotificationRecord {
    s3: Option<S3Entity>,
}

#[derive(Debug, Deserialize)]
struct S3Entity {
    bucket: Option<BucketEntity>,
    object: Option<ObjectEntity>,
}

#[derive(Debug, Deserialize)]
struct BucketEntity {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectEntity {
    key: Option<String>,
}

/// Resolve the source object from a raw JSON payload.
pub fn parse_event(payload: &str) -> PipelineResult<ObjectLocation> {
    let value: serde_json::Value =
        serde_json::from_str(payload).map_err(|e| malformed(format!("invalid JSON: {e}")))?;
    source_object(&value)
}

/// Resolve the source object from an already-parsed payload.
pub fn source_object(payload: &serde_json::Value) -> PipelineResult<ObjectLocation> {
    let notification = Notification::deserialize(payload)
        .map_err(|e| malformed(format!("unexpected payload structure: {e}")))?;

    let mut records = notification.records.into_iter();
    let record = records
        .next()
        .ok_or_else(|| malformed("payload contains no records"))?;
    let ignored = records.count();
    if ignored > 0 {
        tracing::warn!("Event carries {} extra record(s); only the first is processed", ignored);
    }

    let s3 = record
        .s3
        .ok_or_else(|| malformed("record has no s3 entity"))?;
    let bucket = s3
        .bucket
        .and_then(|b| b.name)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| malformed("record is missing s3.bucket.name"))?;
    let key = s3
        .object
        .and_then(|o| o.key)
        .filter(|key| !key.is_empty())
        .ok_or_else(|| malformed("record is missing s3.object.key"))?;

    Ok(ObjectLocation::new(bucket, key))
}

/// Build a single-record notification for `location`.
pub fn notification_for(location: &ObjectLocation) -> serde_json::Value {
    serde_json::json!({
        "Records": [{
            "s3": {
                "bucket": { "name": location.bucket },
                "object": { "key": location.key },
            }
        }]
    })
}

fn malformed(message: impl Into<String>) -> PipelineError {
    PipelineError::MalformedEvent {
        message: message.into(),
    }
}
