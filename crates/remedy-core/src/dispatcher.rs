//! Batch dispatcher.
//!
//! Runs batches through a job (backend call plus response parsing) on a
//! bounded worker pool. Every batch is spawned into a [`JoinSet`] and waits
//! for a semaphore permit, so at most `concurrency` jobs run at once and a
//! new one starts as soon as any running job finishes. Outcomes are drained
//! by a single consumer in completion order; a failing or panicking job
//! becomes a failed [`BatchOutcome`] and never affects its siblings.
//!
//! Dropping the dispatch future (e.g. when a run timeout fires) drops the
//! set, which aborts every task. Batches still waiting for a permit never
//! reach the backend.

use std::any::Any;
use std::collections::BTreeMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::backend::{AnalysisBackend, BackendError, GenerationRequest};
use crate::config::GenerationParams;
use crate::domain::batch::{Batch, BatchOutcome, BatchState, BatchStatus, ErrorInfo, ParsedResponse};
use crate::metrics::METRICS;
use crate::obs;
use crate::prompt::{analysis_prompt, AnalysisMode};
use crate::protocol::parse_response;

impl From<BackendError> for ErrorInfo {
    fn from(err: BackendError) -> Self {
        ErrorInfo::new("backend", err.to_string())
    }
}

/// Move `state` to `next`, refusing transitions the lifecycle does not allow.
fn advance(batch: usize, state: &mut BatchState, next: BatchState) {
    if state.can_transition_to(next) {
        debug!(batch, from = %state, to = %next, "batch state changed");
        *state = next;
    } else {
        warn!(batch, from = %state, to = %next, "ignoring invalid batch state transition");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "batch job panicked".to_string())
}

fn record(outcome: &BatchOutcome) {
    match &outcome.status {
        BatchStatus::Succeeded(parsed) => {
            METRICS.inc_batches_succeeded();
            obs::emit_batch_completed(
                outcome.batch_index,
                outcome.file_paths.len(),
                parsed.issues.len(),
                parsed.remediation.len(),
            );
        }
        BatchStatus::Failed(error) => {
            METRICS.inc_batches_failed();
            obs::emit_batch_failed(outcome.batch_index, error);
        }
    }
}

/// Dispatch `batches` with at most `concurrency` jobs in flight.
///
/// Returns one outcome per batch, in completion order.
pub async fn dispatch_batches<F, Fut>(
    batches: Vec<Batch>,
    concurrency: usize,
    job: F,
) -> Vec<BatchOutcome>
where
    F: Fn(Batch) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ParsedResponse, ErrorInfo>> + Send + 'static,
{
    let job = Arc::new(job);
    let sem = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut pending: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    let mut running = JoinSet::new();

    for batch in batches {
        let index = batch.index;
        let file_paths = batch.file_paths();
        debug!(batch = index, state = %BatchState::Pending, files = file_paths.len(), "batch queued");
        pending.insert(index, file_paths.clone());

        let job = Arc::clone(&job);
        let sem = Arc::clone(&sem);
        running.spawn(async move {
            let _permit = sem.acquire_owned().await.ok();
            let mut state = BatchState::Pending;
            advance(index, &mut state, BatchState::Running);

            let outcome = match AssertUnwindSafe(job(batch)).catch_unwind().await {
                Ok(Ok(parsed)) => BatchOutcome::succeeded(index, file_paths, parsed),
                Ok(Err(error)) => BatchOutcome::failed(index, file_paths, error),
                Err(payload) => BatchOutcome::failed(
                    index,
                    file_paths,
                    ErrorInfo::new("panic", panic_message(payload.as_ref())),
                ),
            };
            advance(index, &mut state, outcome.state());
            outcome
        });
    }

    let mut outcomes = Vec::with_capacity(pending.len());
    while let Some(joined) = running.join_next().await {
        match joined {
            Ok(outcome) => {
                pending.remove(&outcome.batch_index);
                record(&outcome);
                outcomes.push(outcome);
            }
            Err(e) => warn!(error = %e, "batch task did not complete"),
        }
    }

    // tasks that ended without reporting back
    for (index, file_paths) in pending {
        let outcome = BatchOutcome::failed(
            index,
            file_paths,
            ErrorInfo::new("aborted", "batch task did not complete"),
        );
        record(&outcome);
        outcomes.push(outcome);
    }

    outcomes
}

/// The standard batch job: build the prompt, call the backend, parse the reply.
pub async fn analyze_batch(
    backend: Arc<dyn AnalysisBackend>,
    batch: Batch,
    mode: AnalysisMode,
    params: GenerationParams,
) -> Result<ParsedResponse, ErrorInfo> {
    let payload = batch
        .to_prompt_payload()
        .map_err(|e| ErrorInfo::new("prompt", e.to_string()))?;
    let prompt = analysis_prompt(&payload, mode);
    let raw = backend
        .generate(GenerationRequest::analysis(prompt, &params))
        .await?;
    Ok(parse_response(&raw))
}
