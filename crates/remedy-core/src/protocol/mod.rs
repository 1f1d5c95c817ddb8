//! Response protocol.
//!
//! Backend replies are free text that may embed one issues block
//! (`%issueStart` .. `%issueEnd`, a JSON list of issue groups) and one
//! remediation block (`%remediated_codeStart` .. `%remediated_codeEnd`,
//! per-file sub-blocks). Parsing is a pipeline of small stages:
//!
//! 1. [`scan`] lexes the marker tokens.
//! 2. [`scan::section`] cuts each section from its first start marker to the
//!    last matching end marker.
//! 3. [`issues`] and [`remediation`] decode the two payloads independently.
//!
//! No stage fails: a missing or malformed section decodes as empty.

pub mod issues;
pub mod remediation;
pub mod scan;
pub mod summary;

use tracing::debug;

use crate::domain::batch::ParsedResponse;

pub use issues::parse_issues;
pub use remediation::parse_remediation;
pub use scan::{Marker, Token};
pub use summary::parse_summary;

/// Extract the issues and remediation payloads from one backend reply.
pub fn parse_response(raw: &str) -> ParsedResponse {
    let tokens = scan::scan(raw);

    let issues = match scan::section(raw, &tokens, Marker::IssueStart, Marker::IssueEnd) {
        Some(payload) => parse_issues(payload),
        None => {
            debug!("no issues section in response");
            Vec::new()
        }
    };

    let remediation = match scan::section(
        raw,
        &tokens,
        Marker::RemediationStart,
        Marker::RemediationEnd,
    ) {
        Some(payload) => parse_remediation(payload),
        None => {
            debug!("no remediation section in response");
            Default::default()
        }
    };

    ParsedResponse { issues, remediation }
}
