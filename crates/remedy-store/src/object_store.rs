//! Object store trait definition
//!
//! Artifacts are addressed by `(bucket, key)`. Keys are `/`-separated and
//! relative; a key may never climb out of its bucket. Backends hand out a
//! time-limited locator for reading an object back (`presigned_get`), which
//! is what the pipeline returns to callers.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

/// Result type for object store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Durable bucket/key object storage.
///
/// Guarantees:
/// - `put` overwrites any existing object at the same key.
/// - `presigned_get` only succeeds for objects that exist.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `body` under `bucket/key` with the given content type.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> StoreResult<()>;

    /// Return a locator that grants read access to `bucket/key` for `ttl`.
    async fn presigned_get(&self, bucket: &str, key: &str, ttl: Duration) -> StoreResult<String>;
}

/// Check that `bucket` and `key` name a location inside the bucket.
pub fn validate_location(bucket: &str, key: &str) -> StoreResult<()> {
    if bucket.is_empty() || bucket.contains('/') || bucket.contains('\\') || bucket == ".." {
        return Err(StoreError::InvalidBucket {
            bucket: bucket.to_string(),
        });
    }

    let invalid = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if invalid {
        return Err(StoreError::InvalidKey {
            key: key.to_string(),
        });
    }

    Ok(())
}
