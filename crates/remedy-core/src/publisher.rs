//! Result publisher.
//!
//! Writes the result document and the remediation archive to the object
//! store and returns a time-limited locator for each. Publishing is
//! best-effort at the pipeline level: a failed artifact only drops its
//! locator from the result.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use remedy_store::{ObjectStore, StoreError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::result::AnalysisResult;
use crate::metrics::METRICS;
use crate::obs;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const ZIP_CONTENT_TYPE: &str = "application/zip";

/// Errors from publishing one artifact.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Store keys for the artifacts of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactKeys {
    pub result: String,
    pub archive: String,
}

impl ArtifactKeys {
    /// `{repo}/{branch}/{ts}_results.json` and
    /// `{repo}/{branch}/remediated_code/{ts}_{repo}_{branch}_remediated_code.zip`.
    pub fn new(repo: &str, branch: &str, unix_ts: i64) -> Self {
        Self {
            result: format!("{repo}/{branch}/{unix_ts}_results.json"),
            archive: format!(
                "{repo}/{branch}/remediated_code/{unix_ts}_{repo}_{branch}_remediated_code.zip"
            ),
        }
    }

    /// Keys stamped with the current time.
    pub fn now(repo: &str, branch: &str) -> Self {
        Self::new(repo, branch, chrono::Utc::now().timestamp())
    }
}

/// A stored artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedArtifact {
    pub key: String,
    pub url: String,
    /// SHA-256 of the stored bytes, hex encoded.
    pub sha256: String,
}

/// Publishes artifacts into one bucket.
#[derive(Clone)]
pub struct Publisher {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    ttl: Duration,
}

impl Publisher {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: &str, ttl: Duration) -> Self {
        Self {
            store,
            bucket: bucket.to_string(),
            ttl,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Serialize `result` as pretty JSON and store it under `key`.
    pub async fn publish_result(
        &self,
        result: &AnalysisResult,
        key: &str,
    ) -> Result<PublishedArtifact, PublishError> {
        let body = serde_json::to_vec_pretty(result)?;
        self.put_and_sign(key, body, JSON_CONTENT_TYPE).await
    }

    /// Store the archive at `path` under `key`.
    pub async fn publish_archive(
        &self,
        path: &Path,
        key: &str,
    ) -> Result<PublishedArtifact, PublishError> {
        let body = tokio::fs::read(path).await?;
        self.put_and_sign(key, body, ZIP_CONTENT_TYPE).await
    }

    async fn put_and_sign(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<PublishedArtifact, PublishError> {
        let sha256 = hex::encode(Sha256::digest(&body));
        let bytes = body.len();

        self.store.put(&self.bucket, key, body, content_type).await?;
        let url = self.store.presigned_get(&self.bucket, key, self.ttl).await?;

        METRICS.inc_artifacts_published();
        obs::emit_artifact_published(key, &sha256, bytes);
        Ok(PublishedArtifact {
            key: key.to_string(),
            url,
            sha256,
        })
    }
}

/// Collapse a publish outcome to its locator, logging a failure.
pub fn locator(key: &str, outcome: Result<PublishedArtifact, PublishError>) -> Option<String> {
    match outcome {
        Ok(artifact) => Some(artifact.url),
        Err(e) => {
            obs::emit_artifact_failed(key, &e);
            None
        }
    }
}
