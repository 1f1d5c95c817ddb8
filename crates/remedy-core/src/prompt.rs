//! Prompt templates for the analysis and summary passes.

use serde::{Deserialize, Serialize};

use crate::domain::issue::FileIssues;

/// Opening line of every analysis prompt.
pub const ANALYSIS_PREAMBLE: &str =
    "You are a security and code quality expert analyzing files for vulnerabilities and quality issues.";

/// Opening line of the summary prompt.
pub const SUMMARY_PREAMBLE: &str =
    "You are a security and code quality expert reviewing analysis results.";

const ISSUES_FORMAT: &str = r#"%issueStart
[{
  "file_path": "<file path>",
  "issues": [
    {
      "description": "Issue description",
      "severity": "Critical|High|Medium|Low",
      "remediation": "Specific remediation steps with code",
      "context": "Additional explanation",
      "line_number": "Line number where the issue was found"
    }
  ]
}]
%issueEnd"#;

const REMEDIATION_FORMAT: &str = r#"%remediated_codeStart
***<file path>***
<complete remediated file content, with comments explaining the changes>
================
%remediated_codeEnd
Repeat the ***<file path>*** header and the ================ separator line for every file."#;

const SUMMARY_FORMAT: &str = r#"{
  "rating": "Rating of the code quality and security between 1 and 10",
  "executive_summary": "Summary of key findings",
  "priority_recommendations": ["Recommendation 1", "Recommendation 2"],
  "overall_assessment": "Overall assessment of code quality and security",
  "patterns_identified": ["Pattern 1", "Pattern 2"]
}"#;

/// Which payloads the backend is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisMode {
    pub issues: bool,
    pub remediation: bool,
}

impl Default for AnalysisMode {
    fn default() -> Self {
        Self {
            issues: true,
            remediation: false,
        }
    }
}

impl AnalysisMode {
    pub fn new(issues: bool, remediation: bool) -> Self {
        Self {
            issues,
            remediation,
        }
    }

    fn instructions(&self) -> (&'static str, String) {
        match (self.issues, self.remediation) {
            (true, false) => (
                "Focus only on finding and explaining issues. Do not provide remediated code.",
                format!("Respond with the issues block below:\n{ISSUES_FORMAT}"),
            ),
            (false, true) => (
                "Focus only on providing the fixed code, with comments explaining each change.",
                format!("Respond with the remediated code block below:\n{REMEDIATION_FORMAT}"),
            ),
            (true, true) => (
                "For each issue found, explain it and show how to remediate it. \
                 Also provide a complete remediated version of every file that incorporates all fixes.",
                format!(
                    "Respond with both blocks:\n{ISSUES_FORMAT}\n\n{REMEDIATION_FORMAT}\n\n\
                     If no issues are found, return an empty issues array and the original code as remediated code."
                ),
            ),
            (false, false) => ("Give a general assessment of the files.", String::new()),
        }
    }
}

/// Prompt for one batch. `payload` is the batch's JSON file array.
pub fn analysis_prompt(payload: &str, mode: AnalysisMode) -> String {
    let (focus, format) = mode.instructions();
    format!(
        "{ANALYSIS_PREAMBLE}\n\
         {payload}\n\n\
         ## Analysis Mode\n\
         Please analyze the files above and identify security issues, bugs, code quality problems and potential improvements.\n\
         {focus}\n\n\
         ## Response Format\n\
         {format}\n"
    )
}

/// Prompt for the run-level summary. Remediation text is stripped from
/// every issue to bound the prompt size.
pub fn summary_prompt(issues: &[FileIssues]) -> Result<String, serde_json::Error> {
    let stripped: Vec<FileIssues> = issues.iter().map(FileIssues::without_remediation).collect();
    let results = serde_json::to_string_pretty(&stripped)?;
    Ok(format!(
        "{SUMMARY_PREAMBLE}\n\n\
         Below are the analysis results from multiple files. Please provide:\n\
         1. An executive summary of the key findings\n\
         2. Prioritized recommendations for the most critical issues\n\
         3. An overall assessment of the code quality and security\n\
         4. Any patterns or systemic issues identified\n\n\
         Analysis results:\n{results}\n\n\
         Format your response as a JSON object with the following structure:\n{SUMMARY_FORMAT}\n"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::issue::{Issue, Severity};

    const PAYLOAD: &str = r#"[{"file_path":"a.py","content":"print(1)"}]"#;

    #[test]
    fn issues_only_prompt_requests_issue_block() {
        let prompt = analysis_prompt(PAYLOAD, AnalysisMode::new(true, false));
        assert!(prompt.starts_with(ANALYSIS_PREAMBLE));
        assert!(prompt.contains(PAYLOAD));
        assert!(prompt.contains("%issueStart"));
        assert!(!prompt.contains("%remediated_codeStart"));
    }

    #[test]
    fn remediation_only_prompt_requests_code_block() {
        let prompt = analysis_prompt(PAYLOAD, AnalysisMode::new(false, true));
        assert!(prompt.contains("%remediated_codeStart"));
        assert!(!prompt.contains("%issueStart"));
    }

    #[test]
    fn combined_prompt_requests_both() {
        let prompt = analysis_prompt(PAYLOAD, AnalysisMode::new(true, true));
        assert!(prompt.contains("%issueEnd"));
        assert!(prompt.contains("%remediated_codeEnd"));
        assert!(prompt.contains("original code as remediated code"));
    }

    #[test]
    fn neither_prompt_has_no_format() {
        let prompt = analysis_prompt(PAYLOAD, AnalysisMode::new(false, false));
        assert!(!prompt.contains('%'));
    }

    #[test]
    fn summary_prompt_omits_remediation_text() {
        let issues = vec![FileIssues {
            file_path: "a.py".to_string(),
            issues: vec![Issue {
                description: "hardcoded password".to_string(),
                severity: Severity::High,
                remediation: "SECRET_FIX_TEXT".to_string(),
                context: String::new(),
                line_number: Some("3".to_string()),
            }],
        }];
        let prompt = summary_prompt(&issues).unwrap();
        assert!(prompt.starts_with(SUMMARY_PREAMBLE));
        assert!(prompt.contains("hardcoded password"));
        assert!(!prompt.contains("SECRET_FIX_TEXT"));
        assert!(prompt.contains("patterns_identified"));
    }
}
