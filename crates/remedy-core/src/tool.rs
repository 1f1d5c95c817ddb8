//! Tool exposure boundary.
//!
//! Any capability implementing [`Tool`] (`name`, `input_schema`, `invoke`)
//! can be registered in a [`ToolRegistry`]. Transports (stdio, HTTP) live
//! outside this crate and only see JSON values.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::pipeline::{AnalysisOptions, AnalysisRequest, FileLimit, RemediationPipeline};
use crate::prompt::AnalysisMode;

/// Errors surfaced to the transport.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {tool_name}")]
    UnknownTool { tool_name: String },

    #[error("duplicate tool registration: {tool_name}")]
    DuplicateTool { tool_name: String },

    #[error("invalid input for {tool_name}: {reason}")]
    InvalidInput { tool_name: String, reason: String },

    #[error("tool {tool_name} failed: {reason}")]
    Failed { tool_name: String, reason: String },
}

/// An invokable capability.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the accepted input object.
    fn input_schema(&self) -> Value;

    async fn invoke(&self, input: Value) -> Result<Value, ToolError>;
}

/// Listing entry for a registered tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Name-indexed set of tools.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::DuplicateTool { tool_name: name });
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Registered tools, sorted by name.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools
            .values()
            .map(|tool| ToolDescriptor {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                input_schema: tool.input_schema(),
            })
            .collect()
    }

    pub async fn invoke(&self, name: &str, input: Value) -> Result<Value, ToolError> {
        let tool = self.get(name).ok_or_else(|| ToolError::UnknownTool {
            tool_name: name.to_string(),
        })?;
        tool.invoke(input).await
    }
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_true() -> bool {
    true
}

/// Input of `analyze_repository`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyzeRepositoryInput {
    pub git_url: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_true")]
    pub issue_flag: bool,
    #[serde(default)]
    pub remediated_code: bool,
    #[serde(default)]
    pub file_patterns: Vec<String>,
    /// Absent: the configured limit. `null`: every file.
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub file_limit: Option<Option<usize>>,
}

/// Tell an explicit `null` apart from an absent field.
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<usize>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<usize>::deserialize(deserializer).map(Some)
}

impl From<AnalyzeRepositoryInput> for AnalysisRequest {
    fn from(input: AnalyzeRepositoryInput) -> Self {
        AnalysisRequest::new(&input.git_url, &input.branch).with_options(AnalysisOptions {
            mode: AnalysisMode::new(input.issue_flag, input.remediated_code),
            file_patterns: input.file_patterns,
            file_limit: match input.file_limit {
                None => FileLimit::Configured,
                Some(None) => FileLimit::All,
                Some(Some(n)) => FileLimit::At(n),
            },
        })
    }
}

/// Runs the full pipeline on a repository and returns the `AnalysisResult`.
pub struct AnalyzeRepositoryTool {
    pipeline: Arc<RemediationPipeline>,
}

impl AnalyzeRepositoryTool {
    pub const NAME: &'static str = "analyze_repository";

    pub fn new(pipeline: Arc<RemediationPipeline>) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl Tool for AnalyzeRepositoryTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Analyze a git repository for security and quality issues, optionally producing remediated code"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "git_url": {"type": "string", "description": "Repository clone URL"},
                "branch": {"type": "string", "default": "main"},
                "issue_flag": {"type": "boolean", "default": true},
                "remediated_code": {"type": "boolean", "default": false},
                "file_patterns": {"type": "array", "items": {"type": "string"}},
                "file_limit": {
                    "type": ["integer", "null"],
                    "minimum": 1,
                    "description": "Files to analyse without patterns; null for all, default 20"
                }
            },
            "required": ["git_url"],
            "additionalProperties": false
        })
    }

    async fn invoke(&self, input: Value) -> Result<Value, ToolError> {
        let input: AnalyzeRepositoryInput =
            serde_json::from_value(input).map_err(|e| ToolError::InvalidInput {
                tool_name: Self::NAME.to_string(),
                reason: e.to_string(),
            })?;
        if input.git_url.trim().is_empty() {
            return Err(ToolError::InvalidInput {
                tool_name: Self::NAME.to_string(),
                reason: "git_url must not be empty".to_string(),
            });
        }

        let run = self
            .pipeline
            .analyze_repository(&input.into())
            .await
            .map_err(|e| ToolError::Failed {
                tool_name: Self::NAME.to_string(),
                reason: e.to_string(),
            })?;

        serde_json::to_value(&run.result).map_err(|e| ToolError::Failed {
            tool_name: Self::NAME.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Registry holding every tool the pipeline exposes.
pub fn default_registry(pipeline: Arc<RemediationPipeline>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    // only fails on duplicate names, which a fresh registry cannot have
    let _ = registry.register(Arc::new(AnalyzeRepositoryTool::new(pipeline)));
    registry
}
