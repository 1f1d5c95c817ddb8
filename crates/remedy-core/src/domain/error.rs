//! Domain-level error taxonomy for Remedy.
//!
//! Only configuration and setup failures are fatal to a run. Everything
//! below the batch level (file reads, section parsing, backend calls,
//! packaging, publishing) degrades the result instead of propagating.

/// Errors produced while building a [`crate::PipelineConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("required setting {name} is not set")]
    MissingSetting { name: String },

    #[error("setting {name} has invalid value {value:?}: {reason}")]
    InvalidSetting {
        name: String,
        value: String,
        reason: String,
    },
}

/// Remedy pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum RemedyError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("repository source error: {0}")]
    Source(#[from] crate::source::SourceError),

    #[error("backend client setup failed: {0}")]
    BackendSetup(String),

    #[error("store setup failed: {0}")]
    StoreSetup(#[from] remedy_store::StoreError),

    #[error("analysis run timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for Remedy pipeline operations.
pub type Result<T> = std::result::Result<T, RemedyError>;
