use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::StoreError;
use crate::object_store::{validate_location, ObjectStore, StoreResult};

/// Filesystem-backed object store.
///
/// Layout: `<root>/<bucket>/<key>`. Writes are atomic (temp file + rename).
/// Locators are `file://` URLs carrying an `expires` query parameter; the
/// filesystem itself does not enforce the expiry.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Create a store rooted at `root`. Creates the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> StoreResult<Self> {
        std::fs::create_dir_all(root.as_ref())?;
        let root = root.as_ref().canonicalize()?;
        Ok(Self { root })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path on disk for `bucket/key`.
    pub fn object_path(&self, bucket: &str, key: &str) -> StoreResult<PathBuf> {
        validate_location(bucket, key)?;
        let mut path = self.root.join(bucket);
        for segment in key.split('/') {
            path.push(segment);
        }
        Ok(path)
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> StoreResult<()> {
        let path = self.object_path(bucket, key)?;
        let parent = path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| StoreError::InvalidKey {
                key: key.to_string(),
            })?;

        tokio::task::spawn_blocking(move || -> StoreResult<()> {
            std::fs::create_dir_all(&parent)?;
            let mut tmp = NamedTempFile::new_in(&parent)?;
            tmp.write_all(&body)?;
            tmp.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Backend(format!("write task failed: {e}")))??;

        debug!(bucket, key, content_type, "object stored");
        Ok(())
    }

    async fn presigned_get(&self, bucket: &str, key: &str, ttl: Duration) -> StoreResult<String> {
        let path = self.object_path(bucket, key)?;
        if !tokio::fs::try_exists(&path).await? {
            return Err(StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }

        let expires = Utc::now().timestamp() + ttl.as_secs() as i64;
        Ok(format!("file://{}?expires={}", path.display(), expires))
    }
}
