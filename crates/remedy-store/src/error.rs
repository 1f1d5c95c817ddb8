//! Error types for remedy-store

use thiserror::Error;

/// Errors raised by object store backends
#[derive(Error, Debug)]
pub enum StoreError {
    /// Bucket name is empty or contains a path separator
    #[error("invalid bucket name: {bucket:?}")]
    InvalidBucket { bucket: String },

    /// Object key would escape the bucket or is empty
    #[error("invalid object key: {key:?}")]
    InvalidKey { key: String },

    /// Object does not exist
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Backend refused or failed the operation
    #[error("store backend error: {0}")]
    Backend(String),

    /// Filesystem error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
