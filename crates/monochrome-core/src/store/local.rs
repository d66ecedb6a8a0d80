//! Filesystem-backed stores.
//!
//! Objects live at `<root>/<bucket>/<key>`. Records live in one JSON file per
//! id, named by the BLAKE3 hash of the id so that arbitrary keys map onto
//! flat, collision-free file names.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use super::{ObjectStore, RecordStore};
use crate::error::StoreError;
use crate::types::{ImageRecord, RecordUpdate};

/// Object store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a bucket/key pair onto a path below the root.
    ///
    /// Keys must stay inside their bucket: absolute paths and `..` segments
    /// are rejected.
    pub fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StoreError> {
        let mut path = self.root.join(checked_segment(bucket, bucket)?);
        let mut segments = 0;
        for component in Path::new(key).components() {
            match component {
                Component::Normal(part) => {
                    path.push(part);
                    segments += 1;
                }
                Component::CurDir => {}
                _ => {
                    return Err(StoreError::InvalidKey {
                        key: key.to_string(),
                        reason: "key must be a relative path inside the bucket".to_string(),
                    })
                }
            }
        }
        if segments == 0 {
            return Err(StoreError::InvalidKey {
                key: key.to_string(),
                reason: "key is empty".to_string(),
            });
        }
        Ok(path)
    }
}

fn checked_segment<'a>(value: &'a str, key: &str) -> Result<&'a str, StoreError> {
    let mut components = Path::new(value).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(value),
        _ => Err(StoreError::InvalidKey {
            key: key.to_string(),
            reason: format!("bucket name {value:?} is not a single path segment"),
        }),
    }
}

fn map_io(error: std::io::Error, bucket: &str, key: &str) -> StoreError {
    match error.kind() {
        std::io::ErrorKind::NotFound => StoreError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        std::io::ErrorKind::PermissionDenied => StoreError::AccessDenied {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        _ => StoreError::Io(error),
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.object_path(bucket, key)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| map_io(e, bucket, key))
    }

    async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| map_io(e, bucket, key))?;
        }
        write_replace(&path, &bytes)
            .await
            .map_err(|e| map_io(e, bucket, key))?;
        tracing::trace!("Stored {} bytes at {:?}", bytes.len(), path);
        Ok(())
    }
}

static PARTIAL_SEQ: AtomicU64 = AtomicU64::new(0);

/// Write through a sibling temp file so readers never observe a torn object.
///
/// Each write gets its own temp name; concurrent writers to one key race
/// only on the final rename, and the last rename wins.
async fn write_replace(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let seq = PARTIAL_SEQ.fetch_add(1, Ordering::Relaxed);
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(format!(".{}.{}.partial", std::process::id(), seq));
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, bytes).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}

/// Record store keeping one JSON document per record.
#[derive(Debug, Clone)]
pub struct LocalRecordStore {
    dir: PathBuf,
}

impl LocalRecordStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the document holding record `id`.
    pub fn record_path(&self, id: &str) -> PathBuf {
        let name = blake3::hash(id.as_bytes()).to_hex();
        self.dir.join(format!("{}.json", name))
    }

    async fn read(&self, id: &str) -> Result<Option<ImageRecord>, StoreError> {
        match tokio::fs::read(self.record_path(id)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(map_io(e, "records", id)),
        }
    }
}

#[async_trait]
impl RecordStore for LocalRecordStore {
    async fn get(&self, id: &str) -> Result<Option<ImageRecord>, StoreError> {
        self.read(id).await
    }

    async fn upsert(&self, id: &str, update: RecordUpdate) -> Result<(), StoreError> {
        let record = match self.read(id).await? {
            Some(mut existing) => {
                existing.apply(update);
                existing
            }
            None => ImageRecord::from_update(id, update),
        };
        let json = serde_json::to_vec_pretty(&record)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| map_io(e, "records", id))?;
        write_replace(&self.record_path(id), &json)
            .await
            .map_err(|e| map_io(e, "records", id))
    }
}
