//! Aggregator.
//!
//! Runs after the dispatch barrier, so it owns every outcome and needs no
//! locking. Issues are concatenated in outcome order; remediation maps are
//! merged with last-writer-wins.

use std::sync::Arc;

use tracing::{info, warn};

use crate::backend::{AnalysisBackend, GenerationRequest};
use crate::config::GenerationParams;
use crate::domain::batch::{BatchOutcome, BatchStatus};
use crate::domain::issue::FileIssues;
use crate::domain::remediation::RemediationMap;
use crate::domain::result::SummaryOrEmpty;
use crate::metrics::METRICS;
use crate::obs;
use crate::prompt::summary_prompt;
use crate::protocol::parse_summary;

/// Run-level collections built from all outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregate {
    pub issues: Vec<FileIssues>,
    pub remediation: RemediationMap,
    pub succeeded: usize,
    pub failed: usize,
}

impl Aggregate {
    /// Total number of individual issues across all files.
    pub fn issue_count(&self) -> usize {
        self.issues.iter().map(|group| group.issues.len()).sum()
    }
}

/// Merge the succeeded outcomes; failed outcomes are only counted.
pub fn aggregate(outcomes: &[BatchOutcome]) -> Aggregate {
    let mut agg = Aggregate::default();
    for outcome in outcomes {
        match &outcome.status {
            BatchStatus::Succeeded(parsed) => {
                agg.succeeded += 1;
                agg.issues.extend(parsed.issues.iter().cloned());
                agg.remediation.merge(parsed.remediation.clone());
            }
            BatchStatus::Failed(_) => agg.failed += 1,
        }
    }

    METRICS.add_issues(agg.issue_count() as u64);
    info!(
        issue_groups = agg.issues.len(),
        remediated_files = agg.remediation.len(),
        succeeded = agg.succeeded,
        failed = agg.failed,
        "aggregated batch outcomes"
    );
    agg
}

/// Ask the backend for an executive summary of `issues`.
///
/// Makes no call when `issues` is empty. Any failure yields the empty summary.
pub async fn summarize(
    backend: Arc<dyn AnalysisBackend>,
    issues: &[FileIssues],
    params: &GenerationParams,
) -> SummaryOrEmpty {
    if issues.is_empty() {
        return SummaryOrEmpty::empty();
    }

    let prompt = match summary_prompt(issues) {
        Ok(prompt) => prompt,
        Err(e) => {
            warn!(error = %e, "failed to build summary prompt");
            return SummaryOrEmpty::empty();
        }
    };

    let summary = match backend.generate(GenerationRequest::summary(prompt, params)).await {
        Ok(text) => parse_summary(&text),
        Err(e) => {
            warn!(error = %e, "summary call failed");
            SummaryOrEmpty::empty()
        }
    };

    obs::emit_summary_generated(issues.len(), summary.is_empty());
    summary
}
