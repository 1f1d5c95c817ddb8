//! Issues payload decoding.

use serde_json::Value;
use tracing::warn;

use crate::domain::issue::FileIssues;

/// Remove a surrounding Markdown code fence, if any.
pub(crate) fn strip_code_fence(payload: &str) -> &str {
    let trimmed = payload.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the info string (e.g. "json") on the opening fence line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Decode the issues payload into issue groups.
///
/// Accepts a JSON array of groups or a single group object. Groups are
/// decoded one by one, so a malformed group is dropped without taking its
/// siblings with it. A payload that is not JSON yields an empty list and a
/// warning.
pub fn parse_issues(payload: &str) -> Vec<FileIssues> {
    let json = strip_code_fence(payload);
    if json.is_empty() {
        return Vec::new();
    }

    let items = match serde_json::from_str::<Value>(json) {
        Ok(Value::Array(items)) => items,
        Ok(object @ Value::Object(_)) => vec![object],
        Ok(other) => {
            warn!(kind = json_kind(&other), "issues payload is not a list of groups; treating as empty");
            return Vec::new();
        }
        Err(e) => {
            warn!(error = %e, bytes = json.len(), "failed to parse issues JSON; treating as empty");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(position, item)| match serde_json::from_value::<FileIssues>(item) {
            Ok(group) => Some(group),
            Err(e) => {
                warn!(position, error = %e, "dropping malformed issue group");
                None
            }
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::issue::Severity;

    #[test]
    fn parses_array_of_groups() {
        let payload = r#"
        [{"file_path": "a.py", "issues": [
            {"description": "eval on input", "severity": "Critical",
             "remediation": "use ast.literal_eval", "context": "", "line_number": 12}
        ]}]"#;
        let groups = parse_issues(payload);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].file_path, "a.py");
        assert_eq!(groups[0].issues[0].severity, Severity::Critical);
        assert_eq!(groups[0].issues[0].line_number.as_deref(), Some("12"));
    }

    #[test]
    fn accepts_fenced_payload() {
        let payload = "\n```json\n[{\"file_path\": \"b.rs\", \"issues\": []}]\n```\n";
        let groups = parse_issues(payload);
        assert_eq!(groups.len(), 1);
        assert!(groups[0].issues.is_empty());
    }

    #[test]
    fn accepts_single_object() {
        let groups = parse_issues(r#"{"file_path": "c.go", "issues": []}"#);
        assert_eq!(groups[0].file_path, "c.go");
    }

    #[test]
    fn malformed_json_is_empty() {
        assert!(parse_issues("[{\"file_path\": \"a.py\", ").is_empty());
        assert!(parse_issues("not json at all").is_empty());
        assert!(parse_issues("   ").is_empty());
    }

    #[test]
    fn strip_code_fence_leaves_plain_text() {
        assert_eq!(strip_code_fence("  [1, 2] "), "[1, 2]");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
    }

    #[test]
    fn null_fields_do_not_discard_sibling_groups() {
        let payload = r#"[
            {"file_path": "a.py", "issues": [
                {"description": "weak hash", "severity": "Low", "context": "md5(...)"}
            ]},
            {"file_path": "b.py", "issues": [
                {"description": "shell injection", "severity": "High",
                 "remediation": null, "context": null}
            ]}
        ]"#;
        let groups = parse_issues(payload);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].issues[0].context, "");
        assert_eq!(groups[1].issues[0].remediation, "");
    }

    #[test]
    fn object_valued_context_is_kept_as_text() {
        let payload = r#"[{"file_path": "c.py", "issues": [
            {"description": "d", "severity": "High", "context": {"snippet": "os.system(cmd)"}}
        ]}]"#;
        let groups = parse_issues(payload);
        assert_eq!(groups.len(), 1);
        assert!(groups[0].issues[0].context.contains("os.system(cmd)"));
    }

    #[test]
    fn malformed_group_is_dropped_alone() {
        let payload = r#"[
            {"issues": []},
            "not a group",
            {"file_path": "ok.py", "issues": []}
        ]"#;
        let groups = parse_issues(payload);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].file_path, "ok.py");
    }

    #[test]
    fn scalar_payload_is_empty() {
        assert!(parse_issues("42").is_empty());
        assert!(parse_issues("\"no issues\"").is_empty());
    }
}
