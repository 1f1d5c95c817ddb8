//! The analysis pipeline.
//!
//! `list → select → load/batch → dispatch → aggregate → summarize →
//! (package + publish)`. Only configuration, repository materialization and
//! the optional run timeout can fail a run; every later stage degrades the
//! result instead.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use remedy_store::{FsObjectStore, ObjectStore};
use serde::{Deserialize, Serialize};
use tracing::{warn, Instrument};

use crate::aggregator::{aggregate, summarize};
use crate::backend::{AnalysisBackend, HttpBackend};
use crate::batcher::{make_batches, BatchPlan, BatchSet};
use crate::config::PipelineConfig;
use crate::dispatcher::{analyze_batch, dispatch_batches};
use crate::domain::error::{RemedyError, Result};
use crate::domain::remediation::RemediationMap;
use crate::domain::result::{AnalysisResult, RunStats};
use crate::listing::{list_files, select_files};
use crate::metrics::METRICS;
use crate::obs;
use crate::packager::package;
use crate::prompt::AnalysisMode;
use crate::publisher::{locator, ArtifactKeys, Publisher};
use crate::source::{GitCloneSource, RepositorySource};

/// How many listed files to analyse when no patterns are given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileLimit {
    /// Use the pipeline's configured limit.
    #[default]
    Configured,
    All,
    At(usize),
}

impl FileLimit {
    /// `None` means every file.
    pub fn resolve(self, configured: Option<usize>) -> Option<usize> {
        match self {
            FileLimit::Configured => configured,
            FileLimit::All => None,
            FileLimit::At(n) => Some(n),
        }
    }
}

/// Per-run choices supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    pub mode: AnalysisMode,
    /// Explicit files or globs; when non-empty the file limit is ignored.
    #[serde(default)]
    pub file_patterns: Vec<String>,
    #[serde(default)]
    pub file_limit: FileLimit,
}

/// A repository to analyse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub git_url: String,
    pub branch: String,
    #[serde(default)]
    pub options: AnalysisOptions,
}

impl AnalysisRequest {
    pub fn new(git_url: &str, branch: &str) -> Self {
        Self {
            git_url: git_url.to_string(),
            branch: branch.to_string(),
            options: AnalysisOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.options = options;
        self
    }
}

/// The result of one run plus its bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRun {
    pub result: AnalysisResult,
    pub stats: RunStats,
}

struct Prepared {
    files_listed: usize,
    batch_set: BatchSet,
}

/// Repository analysis and remediation pipeline.
pub struct RemediationPipeline {
    config: PipelineConfig,
    backend: Arc<dyn AnalysisBackend>,
    publisher: Publisher,
    source: Arc<dyn RepositorySource>,
}

impl RemediationPipeline {
    /// Assemble a pipeline from explicit collaborators.
    pub fn new(
        config: PipelineConfig,
        backend: Arc<dyn AnalysisBackend>,
        store: Arc<dyn ObjectStore>,
        source: Arc<dyn RepositorySource>,
    ) -> Result<Self> {
        config.validate()?;
        let publisher = Publisher::new(store, &config.results_bucket, config.presign_ttl);
        Ok(Self {
            config,
            backend,
            publisher,
            source,
        })
    }

    /// Pipeline with the HTTP backend, filesystem store and git clone source.
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let backend = Arc::new(HttpBackend::new(&config)?);
        let store = Arc::new(FsObjectStore::new(&config.store_root)?);
        Self::new(config, backend, store, Arc::new(GitCloneSource::new()))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Materialize the repository and analyse it, bounded by the run timeout.
    pub async fn analyze_repository(&self, request: &AnalysisRequest) -> Result<AnalysisRun> {
        let run = async {
            let checkout = self
                .source
                .checkout(&request.git_url, &request.branch)
                .await?;
            Ok::<_, RemedyError>(
                self.analyze_directory(
                    checkout.root(),
                    checkout.repo_name(),
                    checkout.branch(),
                    &request.options,
                )
                .await,
            )
        };

        match self.config.run_timeout {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .map_err(|_| RemedyError::Timeout {
                    seconds: limit.as_secs(),
                })?,
            None => run.await,
        }
    }

    /// Analyse a directory already on disk. Never fails; partial failures
    /// show up as missing issues or absent locators.
    pub async fn analyze_directory(
        &self,
        root: &Path,
        repo_name: &str,
        branch: &str,
        options: &AnalysisOptions,
    ) -> AnalysisRun {
        let run_id = uuid::Uuid::new_v4().to_string();
        let span = obs::run_span(&run_id);
        self.run(run_id, root, repo_name, branch, options)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        run_id: String,
        root: &Path,
        repo_name: &str,
        branch: &str,
        options: &AnalysisOptions,
    ) -> AnalysisRun {
        let started = Instant::now();
        let prepared = self.prepare(root, options).await;
        let Prepared {
            files_listed,
            batch_set,
        } = prepared;
        let files_loaded = batch_set.loaded_files();
        let files_skipped = batch_set.skipped.len();
        obs::emit_run_started(&run_id, repo_name, branch, files_loaded);

        let backend = Arc::clone(&self.backend);
        let params = self.config.generation.clone();
        let mode = options.mode;
        let outcomes = dispatch_batches(
            batch_set.batches,
            self.config.limits.concurrency,
            move |batch| analyze_batch(Arc::clone(&backend), batch, mode, params.clone()),
        )
        .await;

        let agg = aggregate(&outcomes);
        let summary = summarize(
            Arc::clone(&self.backend),
            &agg.issues,
            &self.config.generation,
        )
        .await;

        let issue_count = agg.issue_count();
        let remediated_files = agg.remediation.len();
        let mut result = AnalysisResult {
            file_analysis: agg.issues,
            summary,
            s3_url: None,
            remediated_code_s3_url: None,
        };

        let keys = ArtifactKeys::now(repo_name, branch);
        let (result_url, archive_url) = tokio::join!(
            self.publish_result(&result, &keys.result),
            self.publish_remediation(agg.remediation, &keys.archive),
        );
        result.s3_url = result_url;
        result.remediated_code_s3_url = archive_url;

        let stats = RunStats {
            run_id,
            files_listed,
            files_loaded,
            files_skipped,
            batches: outcomes.len(),
            batches_failed: agg.failed,
            issues: issue_count,
            remediated_files,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        METRICS.flush();
        obs::emit_run_finished(
            &stats.run_id,
            stats.duration_ms,
            stats.batches,
            stats.batches_failed,
            stats.issues,
        );

        AnalysisRun { result, stats }
    }

    async fn prepare(&self, root: &Path, options: &AnalysisOptions) -> Prepared {
        let root = root.to_path_buf();
        let patterns = options.file_patterns.clone();
        let limit = options.file_limit.resolve(self.config.file_limit);
        let plan = BatchPlan::from(&self.config.limits);

        let joined = tokio::task::spawn_blocking(move || {
            let all = list_files(&root);
            let selected = select_files(&all, &patterns, limit);
            Prepared {
                files_listed: all.len(),
                batch_set: make_batches(&root, &selected, plan),
            }
        })
        .await;

        joined.unwrap_or_else(|e| {
            warn!(error = %e, "file preparation task failed; analysing nothing");
            Prepared {
                files_listed: 0,
                batch_set: BatchSet::default(),
            }
        })
    }

    async fn publish_result(&self, result: &AnalysisResult, key: &str) -> Option<String> {
        locator(key, self.publisher.publish_result(result, key).await)
    }

    async fn publish_remediation(&self, remediation: RemediationMap, key: &str) -> Option<String> {
        if remediation.is_empty() {
            return None;
        }

        let work_dir = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(e) => {
                warn!(error = %e, "could not create packaging directory");
                return None;
            }
        };
        let work_path = work_dir.path().to_path_buf();
        let packaged =
            tokio::task::spawn_blocking(move || package(&remediation, &work_path)).await;

        let archive = match packaged {
            Ok(Ok(archive)) => archive,
            Ok(Err(e)) => {
                warn!(error = %e, "packaging remediated code failed");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "packaging task failed");
                return None;
            }
        };

        locator(key, self.publisher.publish_archive(&archive, key).await)
    }
}
