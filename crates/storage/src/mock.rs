//! In-memory blob store for tests and local development

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use bytes::Bytes;

use crate::{BlobStore, ObjectMetadata, StorageError};

/// A stored object
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub data: Bytes,
    pub metadata: ObjectMetadata,
}

/// Mock blob store. Keeps every object in memory and records the order of
/// writes so tests can assert on side effects.
#[derive(Debug, Clone, Default)]
pub struct MockBlobStore {
    objects: Arc<Mutex<HashMap<String, StoredObject>>>,
    put_log: Arc<Mutex<Vec<String>>>,
    fail_with: Arc<RwLock<Option<String>>>,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent put fail with `message`; `None` restores success
    pub fn set_failure(&self, message: Option<String>) {
        *self.fail_with.write().unwrap() = message;
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    /// Keys of every attempted put, failed ones included, in call order
    pub fn put_keys(&self) -> Vec<String> {
        self.put_log.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl BlobStore for MockBlobStore {
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        metadata: &ObjectMetadata,
    ) -> Result<(), StorageError> {
        self.put_log.lock().unwrap().push(key.to_string());

        if let Some(message) = self.fail_with.read().unwrap().clone() {
            tracing::warn!(key, "Mock blob store failing put");
            return Err(StorageError::Write(message));
        }

        tracing::info!(key, bytes = data.len(), "Mock blob store storing object");
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                data,
                metadata: metadata.clone(),
            },
        );
        Ok(())
    }
}
