//! Remedy Core Library
//!
//! Repository-wide code analysis and remediation pipeline: files are loaded
//! under a size cap, grouped into bounded batches, analysed by a
//! text-generation backend with bounded concurrency, parsed from a
//! delimiter-based reply protocol, aggregated, summarized and published.

pub mod aggregator;
pub mod backend;
pub mod batcher;
pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod fakes;
pub mod listing;
pub mod loader;
pub mod metrics;
pub mod obs;
pub mod packager;
pub mod pipeline;
pub mod prompt;
pub mod protocol;
pub mod publisher;
pub mod source;
pub mod telemetry;
pub mod tool;

pub use aggregator::{aggregate, summarize, Aggregate};
pub use backend::{AnalysisBackend, BackendError, GenerationRequest, HttpBackend};
pub use batcher::{group_records, make_batches, BatchPlan, BatchSet};
pub use config::{BatchLimits, GenerationParams, PipelineConfig};
pub use dispatcher::{analyze_batch, dispatch_batches};
pub use domain::{
    AnalysisResult, Batch, BatchOutcome, BatchState, BatchStatus, ConfigError,
    ErrorInfo, ExecutiveSummary, FileContent, FileIssues, FileRecord, Issue, ParsedResponse,
    RemedyError, RemediationMap, Result, RunStats, Severity, SummaryOrEmpty,
};
pub use listing::{list_files, select_files};
pub use loader::load_file;
pub use packager::{package, PackageError};
pub use pipeline::{AnalysisOptions, FileLimit, AnalysisRequest, AnalysisRun, RemediationPipeline};
pub use prompt::AnalysisMode;
pub use protocol::{parse_response, parse_summary};
pub use publisher::{ArtifactKeys, PublishError, PublishedArtifact, Publisher};
pub use source::{
    repo_name_from_url, Checkout, GitCloneSource, LocalDirectorySource, RepositorySource,
    SourceError,
};
pub use telemetry::{init_tracing, LogFormat, TelemetryConfig};
pub use tool::{
    default_registry, AnalyzeRepositoryInput, AnalyzeRepositoryTool, Tool, ToolDescriptor,
    ToolError, ToolRegistry,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
