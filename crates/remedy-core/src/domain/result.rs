//! The published analysis artifact and run statistics.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::issue::{lenient_string, string_or_number, FileIssues};

/// Keys that mark a JSON object as an executive summary.
pub const SUMMARY_KEYS: [&str; 5] = [
    "rating",
    "executive_summary",
    "priority_recommendations",
    "overall_assessment",
    "patterns_identified",
];

/// Executive summary produced by the second backend pass.
///
/// Field decoding is lenient: nulls become defaults, and non-string values
/// are kept as their JSON text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    #[serde(default, deserialize_with = "string_or_number")]
    pub rating: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub executive_summary: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub priority_recommendations: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub overall_assessment: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub patterns_identified: Vec<String>,
}

/// A list of strings; a lone value becomes a one-element list.
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = |value: Value| match value {
        Value::String(s) => s,
        other => other.to_string(),
    };
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .into_iter()
            .filter(|item| !item.is_null())
            .map(text)
            .collect(),
        Some(other) => vec![text(other)],
    })
}

/// Serializes as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EmptyObject {}

/// Either an empty object (no issues, or the summary pass failed) or the
/// parsed executive summary.
///
/// Deserializes from any JSON object. An object carrying none of
/// [`SUMMARY_KEYS`] is `Empty`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SummaryOrEmpty {
    Empty(EmptyObject),
    Summary(ExecutiveSummary),
}

impl<'de> Deserialize<'de> for SummaryOrEmpty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let object = serde_json::Map::<String, Value>::deserialize(deserializer)?;
        if !SUMMARY_KEYS.iter().any(|key| object.contains_key(*key)) {
            return Ok(SummaryOrEmpty::empty());
        }
        ExecutiveSummary::deserialize(Value::Object(object))
            .map(SummaryOrEmpty::Summary)
            .map_err(serde::de::Error::custom)
    }
}

impl SummaryOrEmpty {
    pub fn empty() -> Self {
        SummaryOrEmpty::Empty(EmptyObject {})
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SummaryOrEmpty::Empty(_))
    }

    pub fn as_summary(&self) -> Option<&ExecutiveSummary> {
        match self {
            SummaryOrEmpty::Summary(summary) => Some(summary),
            SummaryOrEmpty::Empty(_) => None,
        }
    }
}

impl Default for SummaryOrEmpty {
    fn default() -> Self {
        Self::empty()
    }
}

/// The artifact returned to callers and published to the durable store.
///
/// Locator fields are absent when the corresponding publish step was skipped
/// or failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub file_analysis: Vec<FileIssues>,
    pub summary: SummaryOrEmpty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediated_code_s3_url: Option<String>,
}

/// Bookkeeping for one run; not part of the published artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub run_id: String,
    pub files_listed: usize,
    pub files_loaded: usize,
    pub files_skipped: usize,
    pub batches: usize,
    pub batches_failed: usize,
    pub issues: usize,
    pub remediated_files: usize,
    pub duration_ms: u64,
}
