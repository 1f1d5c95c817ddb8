//! Remedy - repository analysis and remediation CLI
//!
//! ## Commands
//!
//! - `analyze`: Run the full pipeline on a git URL or a local directory
//! - `files`: Show which files a run would analyse
//! - `tools`: List or invoke the registered analysis tools

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing::{info, Level};

use remedy_core::{
    default_registry, list_files, select_files, AnalysisMode, AnalysisOptions, AnalysisRequest,
    AnalysisRun, FileLimit, GitCloneSource, HttpBackend, LocalDirectorySource, LogFormat,
    PipelineConfig, RemediationPipeline, RepositorySource, TelemetryConfig, ToolRegistry,
};
use remedy_store::FsObjectStore;

#[derive(Parser)]
#[command(name = "remedy")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Repository-wide code analysis and remediation", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Settings shared by commands that talk to the backend and the store.
///
/// Flags win over `REMEDY_*` variables; anything not exposed as a flag is
/// still read from the environment.
#[derive(Args, Debug, Clone, Default)]
struct ConfigArgs {
    /// Backend model identifier
    #[arg(long, env = "REMEDY_MODEL_ID")]
    model_id: Option<String>,

    /// Backend endpoint URL
    #[arg(long, env = "REMEDY_BACKEND_URL")]
    backend_url: Option<String>,

    /// Bucket receiving results and archives
    #[arg(long, env = "REMEDY_RESULTS_BUCKET")]
    results_bucket: Option<String>,

    /// Root directory of the filesystem object store
    #[arg(long, env = "REMEDY_STORE_ROOT")]
    store_root: Option<PathBuf>,

    /// Maximum number of batches in flight
    #[arg(long, env = "REMEDY_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Maximum files per batch
    #[arg(long, env = "REMEDY_BATCH_FILES")]
    batch_files: Option<usize>,

    /// Character budget per batch
    #[arg(long, env = "REMEDY_BATCH_CHARS")]
    batch_chars: Option<usize>,

    /// Abort the whole run after this many seconds
    #[arg(long, env = "REMEDY_RUN_TIMEOUT_SECS")]
    run_timeout_secs: Option<u64>,
}

impl ConfigArgs {
    fn flag(&self, name: &str) -> Option<String> {
        match name {
            "REMEDY_MODEL_ID" => self.model_id.clone(),
            "REMEDY_BACKEND_URL" => self.backend_url.clone(),
            "REMEDY_RESULTS_BUCKET" => self.results_bucket.clone(),
            "REMEDY_STORE_ROOT" => self.store_root.as_ref().map(|p| p.display().to_string()),
            "REMEDY_CONCURRENCY" => self.concurrency.map(|v| v.to_string()),
            "REMEDY_BATCH_FILES" => self.batch_files.map(|v| v.to_string()),
            "REMEDY_BATCH_CHARS" => self.batch_chars.map(|v| v.to_string()),
            "REMEDY_RUN_TIMEOUT_SECS" => self.run_timeout_secs.map(|v| v.to_string()),
            _ => None,
        }
    }

    fn to_config_with<F>(&self, env: F) -> Result<PipelineConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        PipelineConfig::from_lookup(|name| self.flag(name).or_else(|| env(name)))
            .context("Invalid Remedy configuration")
    }

    fn to_config(&self) -> Result<PipelineConfig> {
        self.to_config_with(|name| std::env::var(name).ok())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a repository and publish the result
    Analyze {
        /// Repository to clone
        #[arg(long, conflicts_with = "path", required_unless_present = "path")]
        git_url: Option<String>,

        /// Local directory to analyse in place
        #[arg(long)]
        path: Option<PathBuf>,

        /// Branch to clone (and to name artifacts after)
        #[arg(short, long, default_value = "main")]
        branch: String,

        /// Skip the issues section
        #[arg(long)]
        no_issues: bool,

        /// Request remediated code
        #[arg(long)]
        remediate: bool,

        /// File or glob to analyse (repeatable)
        #[arg(short, long = "pattern")]
        patterns: Vec<String>,

        /// Number of files to analyse when no pattern is given
        #[arg(long, conflicts_with = "all_files")]
        file_limit: Option<usize>,

        /// Analyse every listed file
        #[arg(long)]
        all_files: bool,

        /// Write the result JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Show which files would be analysed
    Files {
        /// Repository directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// File or glob to select (repeatable)
        #[arg(short, long = "pattern")]
        patterns: Vec<String>,

        /// Number of files to select when no pattern is given
        #[arg(long)]
        file_limit: Option<usize>,
    },

    /// List or invoke registered tools
    Tools {
        #[command(subcommand)]
        action: Option<ToolsAction>,

        #[command(flatten)]
        config: ConfigArgs,
    },
}

#[derive(Subcommand)]
enum ToolsAction {
    /// List tool names and input schemas
    List,

    /// Invoke a tool with a JSON input object
    Call {
        /// Tool name
        name: String,

        /// Input object, e.g. '{"git_url": "..."}'
        #[arg(long, default_value = "{}")]
        input: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let format = if cli.json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    remedy_core::init_tracing(&TelemetryConfig::new(format, level));

    match cli.command {
        Commands::Analyze {
            git_url,
            path,
            branch,
            no_issues,
            remediate,
            patterns,
            file_limit,
            all_files,
            output,
            config,
        } => {
            let config = config.to_config()?;
            let file_limit = match (all_files, file_limit) {
                (true, _) => FileLimit::All,
                (false, Some(n)) => FileLimit::At(n),
                (false, None) => FileLimit::Configured,
            };
            let options = AnalysisOptions {
                mode: AnalysisMode::new(!no_issues, remediate),
                file_patterns: patterns,
                file_limit,
            };
            let run = cmd_analyze(config, git_url, path, &branch, options).await?;
            write_output(&run, output.as_deref())
        }
        Commands::Files {
            path,
            patterns,
            file_limit,
        } => {
            for file in cmd_files(&path, &patterns, file_limit)? {
                println!("{file}");
            }
            Ok(())
        }
        Commands::Tools { action, config } => {
            let registry = build_registry(config.to_config()?)?;
            match action.unwrap_or(ToolsAction::List) {
                ToolsAction::List => cmd_tools_list(&registry),
                ToolsAction::Call { name, input } => cmd_tools_call(&registry, &name, &input).await,
            }
        }
    }
}

fn build_pipeline(
    config: PipelineConfig,
    source: Arc<dyn RepositorySource>,
) -> Result<RemediationPipeline> {
    let backend = Arc::new(HttpBackend::new(&config).context("Failed to create backend client")?);
    let store = Arc::new(
        FsObjectStore::new(&config.store_root)
            .with_context(|| format!("Failed to open store at {}", config.store_root.display()))?,
    );
    RemediationPipeline::new(config, backend, store, source).context("Failed to build pipeline")
}

fn build_registry(config: PipelineConfig) -> Result<ToolRegistry> {
    let pipeline = build_pipeline(config, Arc::new(GitCloneSource::new()))?;
    Ok(default_registry(Arc::new(pipeline)))
}

async fn cmd_analyze(
    config: PipelineConfig,
    git_url: Option<String>,
    path: Option<PathBuf>,
    branch: &str,
    options: AnalysisOptions,
) -> Result<AnalysisRun> {
    let source: Arc<dyn RepositorySource>;
    let url = match (git_url, path) {
        (Some(url), _) => {
            source = Arc::new(GitCloneSource::new());
            url
        }
        (None, Some(path)) => {
            source = Arc::new(LocalDirectorySource::new(path));
            String::new()
        }
        (None, None) => bail!("either --git-url or --path is required"),
    };

    let pipeline = build_pipeline(config, source)?;
    let request = AnalysisRequest::new(&url, branch).with_options(options);
    let run = pipeline
        .analyze_repository(&request)
        .await
        .context("Analysis run failed")?;

    info!(
        run_id = %run.stats.run_id,
        files = run.stats.files_loaded,
        batches = run.stats.batches,
        failed = run.stats.batches_failed,
        issues = run.stats.issues,
        "analysis complete"
    );
    Ok(run)
}

fn write_output(run: &AnalysisRun, output: Option<&Path>) -> Result<()> {
    let rendered = serde_json::to_string_pretty(&run.result)?;
    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "wrote result");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn cmd_files(path: &Path, patterns: &[String], file_limit: Option<usize>) -> Result<Vec<String>> {
    if !path.is_dir() {
        bail!("{} is not a directory", path.display());
    }
    let all = list_files(path);
    Ok(select_files(&all, patterns, file_limit))
}

fn cmd_tools_list(registry: &ToolRegistry) -> Result<()> {
    for descriptor in registry.descriptors() {
        println!("{} - {}", descriptor.name, descriptor.description);
        println!("{}", serde_json::to_string_pretty(&descriptor.input_schema)?);
    }
    Ok(())
}

async fn cmd_tools_call(registry: &ToolRegistry, name: &str, input: &str) -> Result<()> {
    let input: Value = serde_json::from_str(input).context("Tool input must be a JSON object")?;
    let output = registry
        .invoke(name, input)
        .await
        .with_context(|| format!("Tool {name} failed"))?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::collections::HashMap;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_analyze_requires_a_source() {
        assert!(Cli::try_parse_from(["remedy", "analyze"]).is_err());
        assert!(Cli::try_parse_from([
            "remedy", "analyze", "--git-url", "https://x/a.git", "--path", "."
        ])
        .is_err());
    }

    #[test]
    fn test_analyze_flags_parse() {
        let cli = Cli::try_parse_from([
            "remedy",
            "--json",
            "analyze",
            "--path",
            "/tmp/repo",
            "--remediate",
            "--no-issues",
            "-p",
            "src/*.rs",
            "-p",
            "main.py",
            "--model-id",
            "m1",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Analyze {
                path,
                branch,
                no_issues,
                remediate,
                patterns,
                config,
                ..
            } => {
                assert_eq!(path, Some(PathBuf::from("/tmp/repo")));
                assert_eq!(branch, "main");
                assert!(no_issues);
                assert!(remediate);
                assert_eq!(patterns, vec!["src/*.rs", "main.py"]);
                assert_eq!(config.model_id.as_deref(), Some("m1"));
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_flags_override_environment() {
        let env: HashMap<&str, &str> = [
            ("REMEDY_MODEL_ID", "env-model"),
            ("REMEDY_BACKEND_URL", "http://env"),
            ("REMEDY_RESULTS_BUCKET", "env-bucket"),
            ("REMEDY_BATCH_FILES", "7"),
        ]
        .into_iter()
        .collect();
        let args = ConfigArgs {
            model_id: Some("flag-model".to_string()),
            concurrency: Some(5),
            ..ConfigArgs::default()
        };

        let config = args
            .to_config_with(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.model_id, "flag-model");
        assert_eq!(config.results_bucket, "env-bucket");
        assert_eq!(config.limits.concurrency, 5);
        assert_eq!(config.limits.files_per_batch, 7);
    }

    #[test]
    fn test_missing_required_setting_is_reported() {
        let err = ConfigArgs::default().to_config_with(|_| None).unwrap_err();
        assert!(format!("{err:#}").contains("REMEDY_MODEL_ID"));
    }

    #[test]
    fn test_cmd_files_lists_and_limits() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "1").unwrap();
        std::fs::write(dir.path().join("b.py"), "2").unwrap();
        std::fs::write(dir.path().join("logo.png"), "x").unwrap();

        let all = cmd_files(dir.path(), &[], None).unwrap();
        assert_eq!(all, vec!["a.py", "b.py"]);
        let one = cmd_files(dir.path(), &[], Some(1)).unwrap();
        assert_eq!(one, vec!["a.py"]);
        assert!(cmd_files(&dir.path().join("missing"), &[], None).is_err());
    }

    #[test]
    fn test_tools_defaults_to_list() {
        let cli = Cli::try_parse_from(["remedy", "tools"]).unwrap();
        match cli.command {
            Commands::Tools { action, .. } => assert!(action.is_none()),
            _ => panic!("expected tools"),
        }
    }
}
