//! Object and record store interfaces.
//!
//! The pipeline only ever talks to these traits; concrete clients are
//! injected by the host. Two families ship with the crate:
//! - **memory**: process-local maps, used by tests and embedders
//! - **local**: directories on disk, used by the CLI

mod local;
mod memory;

pub use local::{LocalObjectStore, LocalRecordStore};
pub use memory::{MemoryObjectStore, MemoryRecordStore};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{ImageRecord, RecordUpdate};

/// Blob storage addressed by bucket and key.
///
/// Uses `async_trait` so that stores can be shared as `Arc<dyn ObjectStore>`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read the full contents of an object.
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Create or replace an object.
    async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<(), StoreError>;
}

/// One structured record per image, keyed by id.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch a record, `None` if it was never created.
    async fn get(&self, id: &str) -> Result<Option<ImageRecord>, StoreError>;

    /// Create the record or merge `update` into the existing one.
    async fn upsert(&self, id: &str, update: RecordUpdate) -> Result<(), StoreError>;
}
