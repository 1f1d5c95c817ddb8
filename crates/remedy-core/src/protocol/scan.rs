//! Marker lexer.
//!
//! Turns raw backend text into an ordered stream of marker tokens, each
//! carrying the byte offset of the marker. Everything between markers is
//! left to the section extractor.

/// Literal delimiters of the response protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    IssueStart,
    IssueEnd,
    RemediationStart,
    RemediationEnd,
}

impl Marker {
    pub const ALL: [Marker; 4] = [
        Marker::IssueStart,
        Marker::IssueEnd,
        Marker::RemediationStart,
        Marker::RemediationEnd,
    ];

    pub const fn literal(&self) -> &'static str {
        match self {
            Marker::IssueStart => "%issueStart",
            Marker::IssueEnd => "%issueEnd",
            Marker::RemediationStart => "%remediated_codeStart",
            Marker::RemediationEnd => "%remediated_codeEnd",
        }
    }
}

/// One marker occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub marker: Marker,
    /// Byte offset of the first character of the marker.
    pub offset: usize,
}

impl Token {
    /// Byte offset just past the marker.
    pub fn end(&self) -> usize {
        self.offset + self.marker.literal().len()
    }
}

/// All marker occurrences in `raw`, ordered by offset.
pub fn scan(raw: &str) -> Vec<Token> {
    let mut tokens: Vec<Token> = Marker::ALL
        .iter()
        .flat_map(|marker| {
            raw.match_indices(marker.literal()).map(move |(offset, _)| Token {
                marker: *marker,
                offset,
            })
        })
        .collect();
    tokens.sort_by_key(|t| t.offset);
    tokens
}

/// Payload between the first `start` marker and the last `end` marker after it.
///
/// Returns `None` when either marker is missing or every `end` precedes the
/// first `start`.
pub fn section<'a>(raw: &'a str, tokens: &[Token], start: Marker, end: Marker) -> Option<&'a str> {
    let open = tokens.iter().find(|t| t.marker == start)?;
    let close = tokens
        .iter()
        .rev()
        .find(|t| t.marker == end && t.offset >= open.end())?;
    raw.get(open.end()..close.offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_orders_tokens_by_offset() {
        let raw = "a %remediated_codeStart b %issueStart c %issueEnd d %remediated_codeEnd";
        let kinds: Vec<Marker> = scan(raw).into_iter().map(|t| t.marker).collect();
        assert_eq!(
            kinds,
            vec![
                Marker::RemediationStart,
                Marker::IssueStart,
                Marker::IssueEnd,
                Marker::RemediationEnd
            ]
        );
    }

    #[test]
    fn section_spans_first_start_to_last_end() {
        let raw = "x%issueStart[1]%issueEnd y %issueEnd z";
        let tokens = scan(raw);
        assert_eq!(
            section(raw, &tokens, Marker::IssueStart, Marker::IssueEnd),
            Some("[1]%issueEnd y ")
        );
    }

    #[test]
    fn section_missing_end_is_none() {
        let raw = "%issueStart [] no end";
        let tokens = scan(raw);
        assert_eq!(section(raw, &tokens, Marker::IssueStart, Marker::IssueEnd), None);
    }

    #[test]
    fn end_before_start_is_none() {
        let raw = "%issueEnd junk %issueStart []";
        let tokens = scan(raw);
        assert_eq!(section(raw, &tokens, Marker::IssueStart, Marker::IssueEnd), None);
    }

    #[test]
    fn markers_inside_other_section_are_independent() {
        let raw = "%issueStart[]%issueEnd%remediated_codeStart***a.py***\nx\n%remediated_codeEnd";
        let tokens = scan(raw);
        assert_eq!(section(raw, &tokens, Marker::IssueStart, Marker::IssueEnd), Some("[]"));
        assert_eq!(
            section(raw, &tokens, Marker::RemediationStart, Marker::RemediationEnd),
            Some("***a.py***\nx\n")
        );
    }
}
