//! Pipeline configuration.
//!
//! [`PipelineConfig`] is an explicit value handed to the pipeline. It can be
//! built from `REMEDY_*` environment variables once at startup; nothing in
//! the pipeline reads the environment afterwards.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

/// Default per-file size cap in bytes.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100_000;
/// Default maximum number of files per batch.
pub const DEFAULT_BATCH_FILE_LIMIT: usize = 3;
/// Default cumulative character budget per batch.
pub const DEFAULT_BATCH_CHAR_LIMIT: usize = 500_000;
/// Default number of batches in flight.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 2;
/// Default number of files analysed when no patterns are given.
pub const DEFAULT_FILE_LIMIT: usize = 20;

/// Sampling and length parameters for backend calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub analysis_max_tokens: u32,
    pub summary_max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub stop_sequences: Vec<String>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            analysis_max_tokens: 8000,
            summary_max_tokens: 4096,
            temperature: 0.7,
            top_p: 0.5,
            top_k: 50,
            stop_sequences: vec!["\n\nHuman:".to_string()],
        }
    }
}

/// Limits that shape batching and dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchLimits {
    /// Per-file size cap in bytes enforced by the loader.
    pub max_file_size: u64,
    /// Maximum number of files per batch.
    pub files_per_batch: usize,
    /// Cumulative character budget per batch.
    pub chars_per_batch: usize,
    /// Maximum number of batches running at once.
    pub concurrency: usize,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            files_per_batch: DEFAULT_BATCH_FILE_LIMIT,
            chars_per_batch: DEFAULT_BATCH_CHAR_LIMIT,
            concurrency: DEFAULT_CONCURRENCY_LIMIT,
        }
    }
}

/// Complete configuration for a [`crate::RemediationPipeline`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Backend model identifier.
    pub model_id: String,
    /// Endpoint of the text-generation backend.
    pub backend_url: String,
    /// Optional credential sent to the backend.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Bucket that receives result documents and archives.
    pub results_bucket: String,
    /// Root directory of the filesystem object store.
    pub store_root: PathBuf,
    pub limits: BatchLimits,
    pub generation: GenerationParams,
    /// Files analysed when no patterns are given (`None` = all).
    pub file_limit: Option<usize>,
    /// Lifetime of returned artifact locators.
    pub presign_ttl: Duration,
    /// Timeout applied to every backend call by the HTTP client.
    pub backend_timeout: Duration,
    /// Timeout for a whole run (`None` = unbounded).
    pub run_timeout: Option<Duration>,
}

impl PipelineConfig {
    /// Configuration with defaults for everything but the required settings.
    pub fn new(model_id: &str, backend_url: &str, results_bucket: &str) -> Self {
        Self {
            model_id: model_id.to_string(),
            backend_url: backend_url.to_string(),
            api_key: None,
            results_bucket: results_bucket.to_string(),
            store_root: PathBuf::from(".remedy/store"),
            limits: BatchLimits::default(),
            generation: GenerationParams::default(),
            file_limit: Some(DEFAULT_FILE_LIMIT),
            presign_ttl: Duration::from_secs(3600),
            backend_timeout: Duration::from_secs(1000),
            run_timeout: None,
        }
    }

    /// Build configuration from environment variables.
    ///
    /// Required:
    /// - REMEDY_MODEL_ID
    /// - REMEDY_BACKEND_URL
    /// - REMEDY_RESULTS_BUCKET
    ///
    /// Optional:
    /// - REMEDY_API_KEY
    /// - REMEDY_STORE_ROOT (default: ".remedy/store")
    /// - REMEDY_MAX_FILE_SIZE (default: 100000)
    /// - REMEDY_BATCH_FILES (default: 3)
    /// - REMEDY_BATCH_CHARS (default: 500000)
    /// - REMEDY_CONCURRENCY (default: 2)
    /// - REMEDY_FILE_LIMIT (default: 20, "all" for no limit)
    /// - REMEDY_PRESIGN_TTL_SECS (default: 3600)
    /// - REMEDY_BACKEND_TIMEOUT_SECS (default: 1000)
    /// - REMEDY_RUN_TIMEOUT_SECS (default: unset)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| -> Result<String, ConfigError> {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingSetting {
                    name: name.to_string(),
                })
        };

        let mut config = Self::new(
            &required("REMEDY_MODEL_ID")?,
            &required("REMEDY_BACKEND_URL")?,
            &required("REMEDY_RESULTS_BUCKET")?,
        );

        config.api_key = lookup("REMEDY_API_KEY").filter(|v| !v.is_empty());
        if let Some(root) = lookup("REMEDY_STORE_ROOT") {
            config.store_root = PathBuf::from(root);
        }
        if let Some(v) = parse_opt(&lookup, "REMEDY_MAX_FILE_SIZE")? {
            config.limits.max_file_size = v;
        }
        if let Some(v) = parse_opt(&lookup, "REMEDY_BATCH_FILES")? {
            config.limits.files_per_batch = v;
        }
        if let Some(v) = parse_opt(&lookup, "REMEDY_BATCH_CHARS")? {
            config.limits.chars_per_batch = v;
        }
        if let Some(v) = parse_opt(&lookup, "REMEDY_CONCURRENCY")? {
            config.limits.concurrency = v;
        }
        match lookup("REMEDY_FILE_LIMIT") {
            Some(v) if v.eq_ignore_ascii_case("all") => config.file_limit = None,
            Some(_) => config.file_limit = parse_opt(&lookup, "REMEDY_FILE_LIMIT")?,
            None => {}
        }
        if let Some(secs) = parse_opt::<u64, _>(&lookup, "REMEDY_PRESIGN_TTL_SECS")? {
            config.presign_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_opt::<u64, _>(&lookup, "REMEDY_BACKEND_TIMEOUT_SECS")? {
            config.backend_timeout = Duration::from_secs(secs);
        }
        config.run_timeout =
            parse_opt::<u64, _>(&lookup, "REMEDY_RUN_TIMEOUT_SECS")?.map(Duration::from_secs);

        config.validate()?;
        Ok(config)
    }

    /// Set the backend credential.
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("REMEDY_MODEL_ID", &self.model_id),
            ("REMEDY_BACKEND_URL", &self.backend_url),
            ("REMEDY_RESULTS_BUCKET", &self.results_bucket),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingSetting {
                    name: name.to_string(),
                });
            }
        }

        let positive = [
            ("REMEDY_MAX_FILE_SIZE", self.limits.max_file_size as usize),
            ("REMEDY_BATCH_FILES", self.limits.files_per_batch),
            ("REMEDY_BATCH_CHARS", self.limits.chars_per_batch),
            ("REMEDY_CONCURRENCY", self.limits.concurrency),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidSetting {
                    name: name.to_string(),
                    value: "0".to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        Ok(())
    }
}

fn parse_opt<T, F>(lookup: &F, name: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidSetting {
                name: name.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            }),
    }
}
