//! Issues reported by the analysis backend.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Issue severity as reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Severity {
    /// Case-insensitive parse; unrecognised labels fall back to `Medium`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "critical" => Severity::Critical,
            "high" => Severity::High,
            "low" => Severity::Low,
            _ => Severity::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = string_or_number(deserializer)?;
        Ok(label.as_deref().map(Severity::from_label).unwrap_or_default())
    }
}

/// A single issue found in a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default)]
    pub severity: Severity,
    /// Remediation steps, possibly with code.
    #[serde(default, alias = "remediation_text", deserialize_with = "lenient_string")]
    pub remediation: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub context: String,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub line_number: Option<String>,
}

/// All issues reported for one file. This is the unit the backend emits
/// inside an issues block and the element type of the published
/// `file_analysis` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileIssues {
    pub file_path: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub issues: Vec<Issue>,
}

impl FileIssues {
    /// Copy of this group with remediation text removed from every issue.
    pub fn without_remediation(&self) -> FileIssues {
        FileIssues {
            file_path: self.file_path.clone(),
            issues: self
                .issues
                .iter()
                .map(|issue| Issue {
                    remediation: String::new(),
                    ..issue.clone()
                })
                .collect(),
        }
    }
}

/// Accept a JSON string, number or null and keep it as an optional string.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Like [`string_or_number`], with null or absent values as `""`.
/// Objects and arrays are kept as their JSON text.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(string_or_number(deserializer)?.unwrap_or_default())
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
