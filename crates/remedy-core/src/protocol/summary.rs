//! Summary reply decoding.

use tracing::warn;

use crate::domain::result::SummaryOrEmpty;

/// Decode the summary reply.
///
/// Tries the span from the first `{` to the last `}`, then the whole text.
/// A reply that yields no JSON object becomes the empty summary.
pub fn parse_summary(text: &str) -> SummaryOrEmpty {
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            match serde_json::from_str::<SummaryOrEmpty>(&text[start..=end]) {
                Ok(summary) => return summary,
                Err(e) => warn!(error = %e, "failed to parse summary JSON object"),
            }
        }
    }

    match serde_json::from_str::<SummaryOrEmpty>(text.trim()) {
        Ok(summary) => summary,
        Err(e) => {
            warn!(error = %e, bytes = text.len(), "failed to parse summary from text");
            SummaryOrEmpty::empty()
        }
    }
}
