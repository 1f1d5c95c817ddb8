//! Domain models for Remedy.
//!
//! Canonical definitions for the entities of one analysis run:
//! - `FileRecord` / `FileContent`: loaded files and loader sentinels
//! - `Batch` / `BatchOutcome`: dispatch units and their terminal status
//! - `FileIssues` / `Issue`: backend-reported issues
//! - `RemediationMap`: remediated file content by path
//! - `AnalysisResult`: the published artifact

pub mod batch;
pub mod error;
pub mod file;
pub mod issue;
pub mod remediation;
pub mod result;

pub use batch::{Batch, BatchOutcome, BatchState, BatchStatus, ErrorInfo, ParsedResponse};
pub use error::{ConfigError, RemedyError, Result};
pub use file::{FileContent, FileRecord};
pub use issue::{FileIssues, Issue, Severity};
pub use remediation::RemediationMap;
pub use result::{AnalysisResult, EmptyObject, ExecutiveSummary, RunStats, SummaryOrEmpty};
