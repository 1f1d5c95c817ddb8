//! Batches, their lifecycle, and per-batch outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::file::FileRecord;
use super::issue::FileIssues;
use super::remediation::RemediationMap;

/// Ordered group of files submitted together in one backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Position in the batch plan (0-based).
    pub index: usize,
    pub files: Vec<FileRecord>,
}

impl Batch {
    pub fn new(index: usize, files: Vec<FileRecord>) -> Self {
        Self { index, files }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Cumulative size of the batch in characters.
    pub fn char_count(&self) -> usize {
        self.files.iter().map(|f| f.char_count).sum()
    }

    pub fn file_paths(&self) -> Vec<String> {
        self.files.iter().map(|f| f.file_path.clone()).collect()
    }

    /// JSON array of `{file_path, content}` embedded in the analysis prompt.
    pub fn to_prompt_payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.files)
    }
}

/// Lifecycle of a batch inside the dispatcher.
///
/// `Pending → Running → {Succeeded, Failed}`; terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl BatchState {
    pub fn can_transition_to(&self, next: BatchState) -> bool {
        matches!(
            (self, next),
            (BatchState::Pending, BatchState::Running)
                | (BatchState::Running, BatchState::Succeeded)
                | (BatchState::Running, BatchState::Failed)
        )
    }
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BatchState::Pending => "pending",
            BatchState::Running => "running",
            BatchState::Succeeded => "succeeded",
            BatchState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// What the response parser extracted from one backend reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedResponse {
    pub issues: Vec<FileIssues>,
    pub remediation: RemediationMap,
}

impl ParsedResponse {
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty() && self.remediation.is_empty()
    }
}

/// Failure details for a batch that did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Short machine-readable category (`backend`, `prompt`, `panic`, ...).
    pub kind: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Terminal status of one dispatched batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStatus {
    Succeeded(ParsedResponse),
    Failed(ErrorInfo),
}

/// Per-batch result; the unit of partial-failure isolation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub batch_index: usize,
    pub file_paths: Vec<String>,
    pub status: BatchStatus,
}

impl BatchOutcome {
    pub fn succeeded(batch_index: usize, file_paths: Vec<String>, parsed: ParsedResponse) -> Self {
        Self {
            batch_index,
            file_paths,
            status: BatchStatus::Succeeded(parsed),
        }
    }

    pub fn failed(batch_index: usize, file_paths: Vec<String>, error: ErrorInfo) -> Self {
        Self {
            batch_index,
            file_paths,
            status: BatchStatus::Failed(error),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, BatchStatus::Failed(_))
    }

    pub fn state(&self) -> BatchState {
        match self.status {
            BatchStatus::Succeeded(_) => BatchState::Succeeded,
            BatchStatus::Failed(_) => BatchState::Failed,
        }
    }
}
