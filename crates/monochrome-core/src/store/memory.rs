//! In-memory stores.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{ObjectStore, RecordStore};
use crate::error::StoreError;
use crate::types::{ImageRecord, RecordUpdate};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic while holding the lock cannot leave a map half-updated.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Object store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
    read_only_buckets: Mutex<HashSet<String>>,
    puts: AtomicUsize,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without counting it as a write.
    pub fn insert(&self, bucket: &str, key: &str, bytes: impl Into<Vec<u8>>) {
        lock(&self.objects).insert((bucket.to_string(), key.to_string()), bytes.into());
    }

    /// Copy of an object's bytes, if present.
    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        lock(&self.objects)
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Keys stored in `bucket`, sorted.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = lock(&self.objects)
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Make every later `put` into `bucket` fail with `AccessDenied`.
    pub fn deny_writes(&self, bucket: &str) {
        lock(&self.read_only_buckets).insert(bucket.to_string());
    }

    /// Number of successful `put` calls so far.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        self.object(bucket, key).ok_or_else(|| StoreError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        if lock(&self.read_only_buckets).contains(bucket) {
            return Err(StoreError::AccessDenied {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }
        self.insert(bucket, key, bytes);
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Record store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<HashMap<String, ImageRecord>>,
    unavailable: AtomicBool,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record, as the upload collaborator would.
    pub fn insert(&self, record: ImageRecord) {
        lock(&self.records).insert(record.id.clone(), record);
    }

    pub fn record(&self, id: &str) -> Option<ImageRecord> {
        lock(&self.records).get(id).cloned()
    }

    /// Make every later call fail, simulating an unreachable store.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self, id: &str) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::AccessDenied {
                bucket: "records".to_string(),
                key: id.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, id: &str) -> Result<Option<ImageRecord>, StoreError> {
        self.check_available(id)?;
        Ok(self.record(id))
    }

    async fn upsert(&self, id: &str, update: RecordUpdate) -> Result<(), StoreError> {
        self.check_available(id)?;
        let mut records = lock(&self.records);
        match records.get_mut(id) {
            Some(record) => record.apply(update),
            None => {
                records.insert(id.to_string(), ImageRecord::from_update(id, update));
            }
        }
        Ok(())
    }
}
