//! Structured observability hooks for the analysis run lifecycle.
//!
//! This module provides:
//! - A run-scoped tracing span, attached to the run future with `Instrument`
//! - Emission functions for lifecycle events: run start/finish, batch
//!   completion, summary generation, artifact publication
//!
//! Events are emitted at `info!` level (failures at `warn!`). Use
//! `RUST_LOG` to filter and `--json` on the CLI for JSON output.

use tracing::{info, warn};

/// Span tagged with the run_id; every event emitted inside it carries the id.
pub fn run_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("remedy.run", run_id = %run_id)
}

/// Emit event: run started for a repository and branch.
pub fn emit_run_started(run_id: &str, repo: &str, branch: &str, files: usize) {
    info!(event = "run.started", run_id = %run_id, repo = %repo, branch = %branch, files = files);
}

/// Emit event: a batch reached `Succeeded`.
pub fn emit_batch_completed(batch: usize, files: usize, issue_groups: usize, remediated: usize) {
    info!(
        event = "batch.completed",
        batch = batch,
        files = files,
        issue_groups = issue_groups,
        remediated = remediated,
    );
}

/// Emit event: a batch reached `Failed` (warning level).
pub fn emit_batch_failed(batch: usize, error: &dyn std::fmt::Display) {
    warn!(event = "batch.failed", batch = batch, error = %error);
}

/// Emit event: the summary pass finished.
pub fn emit_summary_generated(issue_groups: usize, empty: bool) {
    info!(event = "summary.generated", issue_groups = issue_groups, empty = empty);
}

/// Emit event: an artifact was written to the store.
pub fn emit_artifact_published(key: &str, sha256: &str, bytes: usize) {
    info!(event = "artifact.published", key = %key, sha256 = %sha256, bytes = bytes);
}

/// Emit event: an artifact could not be published (warning level).
pub fn emit_artifact_failed(key: &str, error: &dyn std::fmt::Display) {
    warn!(event = "artifact.failed", key = %key, error = %error);
}

/// Emit event: run finished with duration and counts.
pub fn emit_run_finished(
    run_id: &str,
    duration_ms: u64,
    batches: usize,
    batches_failed: usize,
    issues: usize,
) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        batches = batches,
        batches_failed = batches_failed,
        issues = issues,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_inside_run_span() {
        let span = run_span("test-run-id");
        let _entered = span.enter();
        emit_run_started("test-run-id", "repo", "main", 3);
        emit_batch_failed(1, &"boom");
        emit_run_finished("test-run-id", 12, 2, 1, 4);
    }
}
