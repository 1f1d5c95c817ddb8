//! In-memory fakes for the object store trait (testing only)
//!
//! `MemoryObjectStore` satisfies the `ObjectStore` contract without touching
//! the filesystem; `UnavailableObjectStore` fails every call, for exercising
//! best-effort publishing paths.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::object_store::{validate_location, ObjectStore, StoreResult};

/// A stored object with its declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

// ---------------------------------------------------------------------------
// MemoryObjectStore
// ---------------------------------------------------------------------------

/// In-memory object store backed by a `BTreeMap<(bucket, key), object>`.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<(String, String), StoredObject>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a stored object, if present.
    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        let objects = self.objects.lock().unwrap();
        objects.get(&(bucket.to_string(), key.to_string())).cloned()
    }

    /// All keys stored in `bucket`, in lexical order.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let objects = self.objects.lock().unwrap();
        objects
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> StoreResult<()> {
        validate_location(bucket, key)?;
        let mut objects = self.objects.lock().unwrap();
        objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn presigned_get(&self, bucket: &str, key: &str, ttl: Duration) -> StoreResult<String> {
        validate_location(bucket, key)?;
        let objects = self.objects.lock().unwrap();
        if !objects.contains_key(&(bucket.to_string(), key.to_string())) {
            return Err(StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }
        Ok(format!("memory://{bucket}/{key}?ttl={}", ttl.as_secs()))
    }
}

// ---------------------------------------------------------------------------
// UnavailableObjectStore
// ---------------------------------------------------------------------------

/// Object store whose every operation fails with a backend error.
#[derive(Debug, Clone)]
pub struct UnavailableObjectStore {
    reason: String,
}

impl UnavailableObjectStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for UnavailableObjectStore {
    async fn put(
        &self,
        _bucket: &str,
        _key: &str,
        _body: Vec<u8>,
        _content_type: &str,
    ) -> StoreResult<()> {
        Err(StoreError::Backend(self.reason.clone()))
    }

    async fn presigned_get(
        &self,
        _bucket: &str,
        _key: &str,
        _ttl: Duration,
    ) -> StoreResult<String> {
        Err(StoreError::Backend(self.reason.clone()))
    }
}
