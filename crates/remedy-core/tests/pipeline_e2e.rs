//! End-to-end pipeline runs against scripted backends and in-memory stores.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use remedy_core::fakes::{Reply, ScriptedBackend};
use remedy_core::{
    AnalysisMode, AnalysisOptions, AnalysisRequest, FileLimit, GitCloneSource, LocalDirectorySource,
    PipelineConfig, RemediationPipeline, RemedyError,
};
use remedy_store::fakes::{MemoryObjectStore, UnavailableObjectStore};
use remedy_store::ObjectStore;

const SUMMARY: &str = r#"{"rating": "4", "executive_summary": "Unsafe eval in a.py",
"priority_recommendations": ["Remove eval"], "overall_assessment": "Needs work",
"patterns_identified": ["dynamic code execution"]}"#;

fn write_repo(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (path, content) in files {
        let full = dir.path().join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, content).unwrap();
    }
    dir
}

fn four_file_repo() -> tempfile::TempDir {
    write_repo(&[
        ("a.py", "eval(input())\n"),
        ("b.py", "print('b')\n"),
        ("c.py", "print('c')\n"),
        ("d.py", "print('d')\n"),
    ])
}

fn config(files_per_batch: usize) -> PipelineConfig {
    let mut config = PipelineConfig::new("test-model", "http://unused", "results");
    config.limits.files_per_batch = files_per_batch;
    config
}

/// Needle that only matches the batch prompt carrying `path`.
fn carries(path: &str) -> String {
    format!("\"file_path\":\"{path}\"")
}

fn issues_reply(path: &str, description: &str) -> String {
    format!(
        r#"Findings below.
%issueStart
[{{"file_path": "{path}", "issues": [{{"description": "{description}", "severity": "High", "remediation": "fix", "context": "", "line_number": 1}}]}}]
%issueEnd
%remediated_codeStart
***{path}***
# fixed
================
%remediated_codeEnd"#
    )
}

fn pipeline(
    config: PipelineConfig,
    backend: Arc<ScriptedBackend>,
    store: Arc<dyn ObjectStore>,
    root: &Path,
) -> RemediationPipeline {
    RemediationPipeline::new(config, backend, store, Arc::new(LocalDirectorySource::new(root)))
        .unwrap()
}

fn both_modes() -> AnalysisOptions {
    AnalysisOptions {
        mode: AnalysisMode::new(true, true),
        ..AnalysisOptions::default()
    }
}

#[tokio::test]
async fn full_run_publishes_result_and_archive() {
    let repo = four_file_repo();
    let backend = Arc::new(
        ScriptedBackend::new(Reply::text("nothing to report"))
            .on_summary(Reply::text(SUMMARY))
            .when(carries("a.py"), Reply::text(issues_reply("a.py", "eval on input"))),
    );
    let store = Arc::new(MemoryObjectStore::new());
    let p = pipeline(config(2), backend.clone(), store.clone(), repo.path());

    let request = AnalysisRequest::new("https://git.example/acme/svc.git", "main")
        .with_options(both_modes());
    let run = p.analyze_repository(&request).await.unwrap();

    assert_eq!(run.result.file_analysis.len(), 1);
    assert_eq!(run.result.file_analysis[0].file_path, "a.py");
    let summary = run.result.summary.as_summary().unwrap();
    assert_eq!(summary.patterns_identified, vec!["dynamic code execution"]);
    assert!(run.result.s3_url.is_some());
    assert!(run.result.remediated_code_s3_url.is_some());

    assert_eq!(run.stats.files_listed, 4);
    assert_eq!(run.stats.batches, 2);
    assert_eq!(run.stats.batches_failed, 0);
    assert_eq!(run.stats.issues, 1);
    assert_eq!(run.stats.remediated_files, 1);
    // two batches plus one summary
    assert_eq!(backend.call_count(), 3);
    assert_eq!(backend.summary_calls(), 1);

    let keys = store.keys("results");
    assert_eq!(keys.len(), 2);
    let result_key = keys.iter().find(|k| k.ends_with("_results.json")).unwrap();
    assert!(result_key.starts_with("svc/main/"));
    let archive_key = keys.iter().find(|k| k.ends_with(".zip")).unwrap();
    assert!(archive_key.starts_with("svc/main/remediated_code/"));
    assert!(archive_key.ends_with("_svc_main_remediated_code.zip"));

    let archive = store.object("results", archive_key).unwrap();
    let mut zip = zip::ZipArchive::new(std::io::Cursor::new(archive.body)).unwrap();
    let mut body = String::new();
    zip.by_name("a.py").unwrap().read_to_string(&mut body).unwrap();
    assert_eq!(body, "# fixed");

    let published: serde_json::Value =
        serde_json::from_slice(&store.object("results", result_key).unwrap().body).unwrap();
    assert_eq!(published["file_analysis"][0]["file_path"], "a.py");
    assert!(published.get("s3_url").is_none());
}

#[tokio::test]
async fn one_of_two_batches_failing_keeps_the_survivor() {
    let repo = write_repo(&[("a.py", "x = 1\n"), ("b.py", "y = 2\n")]);
    let backend = Arc::new(
        ScriptedBackend::new(Reply::text(""))
            .on_summary(Reply::text(SUMMARY))
            .when(carries("a.py"), Reply::text(issues_reply("a.py", "survivor")))
            .when(carries("b.py"), Reply::fail("connection reset by peer")),
    );
    let store = Arc::new(MemoryObjectStore::new());
    let p = pipeline(config(1), backend, store, repo.path());

    let run = p
        .analyze_repository(&AnalysisRequest::new("https://x/acme/two.git", "main"))
        .await
        .unwrap();

    assert_eq!(run.stats.batches, 2);
    assert_eq!(run.stats.batches_failed, 1);
    assert_eq!(run.result.file_analysis.len(), 1);
    assert_eq!(run.result.file_analysis[0].issues[0].description, "survivor");
}

#[tokio::test]
async fn n_minus_one_failures_still_yield_issues() {
    let repo = four_file_repo();
    let backend = Arc::new(
        ScriptedBackend::new(Reply::fail("throttled"))
            .on_summary(Reply::text(SUMMARY))
            .when(carries("d.py"), Reply::text(issues_reply("d.py", "only d"))),
    );
    let p = pipeline(config(1), backend, Arc::new(MemoryObjectStore::new()), repo.path());

    let run = p
        .analyze_directory(repo.path(), "svc", "main", &AnalysisOptions::default())
        .await;

    assert_eq!(run.stats.batches, 4);
    assert_eq!(run.stats.batches_failed, 3);
    let paths: Vec<&str> = run
        .result
        .file_analysis
        .iter()
        .map(|g| g.file_path.as_str())
        .collect();
    assert_eq!(paths, vec!["d.py"]);
    assert!(!run.result.summary.is_empty());
}

#[tokio::test]
async fn all_batches_failing_returns_degraded_result() {
    let repo = four_file_repo();
    let backend = Arc::new(ScriptedBackend::new(Reply::fail("backend down")));
    let p = pipeline(config(2), backend.clone(), Arc::new(MemoryObjectStore::new()), repo.path());

    let run = p
        .analyze_directory(repo.path(), "svc", "main", &AnalysisOptions::default())
        .await;

    assert!(run.result.file_analysis.is_empty());
    assert!(run.result.summary.is_empty());
    assert!(run.result.s3_url.is_some());
    assert_eq!(run.stats.batches_failed, 2);
    assert_eq!(backend.summary_calls(), 0);
}

#[tokio::test]
async fn panicking_backend_call_is_isolated() {
    let repo = write_repo(&[("a.py", "1\n"), ("b.py", "2\n")]);
    let backend = Arc::new(
        ScriptedBackend::new(Reply::text(""))
            .on_summary(Reply::text("{}"))
            .when(carries("a.py"), Reply::Panic("backend client bug".to_string()))
            .when(carries("b.py"), Reply::text(issues_reply("b.py", "still here"))),
    );
    let p = pipeline(config(1), backend, Arc::new(MemoryObjectStore::new()), repo.path());

    let run = p
        .analyze_directory(repo.path(), "svc", "main", &AnalysisOptions::default())
        .await;

    assert_eq!(run.stats.batches_failed, 1);
    assert_eq!(run.result.file_analysis[0].file_path, "b.py");
}

#[tokio::test]
async fn unavailable_store_drops_locators_but_keeps_result() {
    let repo = four_file_repo();
    let backend = Arc::new(
        ScriptedBackend::new(Reply::text(""))
            .on_summary(Reply::text(SUMMARY))
            .when(carries("a.py"), Reply::text(issues_reply("a.py", "eval"))),
    );
    let p = pipeline(
        config(3),
        backend,
        Arc::new(UnavailableObjectStore::new("no credentials")),
        repo.path(),
    );

    let run = p
        .analyze_directory(repo.path(), "svc", "main", &both_modes())
        .await;

    assert_eq!(run.result.file_analysis.len(), 1);
    assert!(run.result.s3_url.is_none());
    assert!(run.result.remediated_code_s3_url.is_none());
}

#[tokio::test]
async fn unsafe_remediation_paths_skip_only_the_archive() {
    let repo = write_repo(&[("a.py", "1\n")]);
    let reply = "%issueStart[{\"file_path\":\"a.py\",\"issues\":[]}]%issueEnd\n%remediated_codeStart\n***../../etc/cron.d/evil***\nboom\n================\n%remediated_codeEnd";
    let backend = Arc::new(ScriptedBackend::new(Reply::text(reply)));
    let store = Arc::new(MemoryObjectStore::new());
    let p = pipeline(config(3), backend, store.clone(), repo.path());

    let run = p
        .analyze_directory(repo.path(), "svc", "main", &both_modes())
        .await;

    assert_eq!(run.stats.remediated_files, 1);
    assert!(run.result.s3_url.is_some());
    assert!(run.result.remediated_code_s3_url.is_none());
    assert_eq!(store.keys("results").len(), 1);
}

#[tokio::test]
async fn concurrency_limit_bounds_backend_calls() {
    let files: Vec<(String, String)> = (0..8)
        .map(|i| (format!("f{i}.py"), format!("v = {i}\n")))
        .collect();
    let borrowed: Vec<(&str, &str)> = files.iter().map(|(p, c)| (p.as_str(), c.as_str())).collect();
    let repo = write_repo(&borrowed);

    let backend = Arc::new(
        ScriptedBackend::new(Reply::text("")).with_delay(Duration::from_millis(20)),
    );
    let mut cfg = config(1);
    cfg.limits.concurrency = 3;
    let p = pipeline(cfg, backend.clone(), Arc::new(MemoryObjectStore::new()), repo.path());

    let run = p
        .analyze_directory(repo.path(), "svc", "main", &AnalysisOptions::default())
        .await;

    assert_eq!(run.stats.batches, 8);
    assert_eq!(backend.call_count(), 8);
    assert!(backend.peak_in_flight() <= 3);
}

#[tokio::test]
async fn file_patterns_override_the_limit() {
    let repo = write_repo(&[
        ("src/a.rs", "fn a() {}\n"),
        ("src/b.rs", "fn b() {}\n"),
        ("README.md", "# svc\n"),
    ]);
    let backend = Arc::new(ScriptedBackend::new(Reply::text("")));
    let p = pipeline(config(3), backend.clone(), Arc::new(MemoryObjectStore::new()), repo.path());

    let options = AnalysisOptions {
        file_patterns: vec!["src/*.rs".to_string()],
        file_limit: FileLimit::At(1),
        ..AnalysisOptions::default()
    };
    let run = p.analyze_directory(repo.path(), "svc", "main", &options).await;

    assert_eq!(run.stats.files_listed, 3);
    assert_eq!(run.stats.files_loaded, 2);
    let prompt = &backend.requests()[0].prompt;
    assert!(prompt.contains("src/a.rs"));
    assert!(!prompt.contains("README.md"));
}

#[tokio::test]
async fn run_timeout_surfaces_as_error() {
    let repo = four_file_repo();
    let backend = Arc::new(
        ScriptedBackend::new(Reply::text("")).with_delay(Duration::from_millis(500)),
    );
    let mut cfg = config(1);
    cfg.run_timeout = Some(Duration::from_millis(50));
    cfg.limits.concurrency = 1;
    let p = pipeline(cfg, backend.clone(), Arc::new(MemoryObjectStore::new()), repo.path());

    let err = p
        .analyze_repository(&AnalysisRequest::new("https://x/acme/slow.git", "main"))
        .await
        .unwrap_err();
    assert!(matches!(err, RemedyError::Timeout { .. }));

    // queued batches must not reach the backend once the run is abandoned
    let calls_at_timeout = backend.call_count();
    assert!(calls_at_timeout <= 1);
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(backend.call_count(), calls_at_timeout);
}

#[tokio::test]
async fn failed_checkout_is_a_source_error() {
    let missing = tempfile::tempdir().unwrap();
    let url = missing.path().join("not-a-repo").to_string_lossy().into_owned();
    let p = RemediationPipeline::new(
        config(3),
        Arc::new(ScriptedBackend::new(Reply::text(""))),
        Arc::new(MemoryObjectStore::new()),
        Arc::new(GitCloneSource::new()),
    )
    .unwrap();

    let err = p
        .analyze_repository(&AnalysisRequest::new(&url, "main"))
        .await
        .unwrap_err();
    assert!(matches!(err, RemedyError::Source(_)));
}
