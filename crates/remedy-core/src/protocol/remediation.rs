//! Remediation block grammar.
//!
//! ```text
//! block     := (noise | file)*
//! file      := header line* (separator | <end of block>)
//! header    := "***" path "***"          (one trimmed line)
//! separator := "=" * 16..                (one trimmed line)
//! ```
//!
//! Lines outside a file are noise. A header met while a file is still open
//! means the open file lost its separator; that file is dropped.

use tracing::debug;

use crate::domain::remediation::RemediationMap;

const MIN_SEPARATOR_LEN: usize = 16;

/// Path named by a header line, if `line` is one.
pub fn header_path(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.len() < 6 || !trimmed.starts_with("***") || !trimmed.ends_with("***") {
        return None;
    }
    let path = trimmed.trim_matches(|c: char| c == '*' || c.is_whitespace());
    (!path.is_empty()).then_some(path)
}

pub fn is_separator(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= MIN_SEPARATOR_LEN && trimmed.chars().all(|c| c == '=')
}

enum State<'a> {
    Seeking,
    InFile { path: &'a str, lines: Vec<&'a str> },
}

fn finish(map: &mut RemediationMap, path: &str, lines: &[&str]) {
    let content = lines.join("\n");
    let content = content.trim_matches(|c| c == '\n' || c == '\r');
    if map.insert(path, content).is_some() {
        debug!(path = %path, "duplicate remediation block; keeping the later one");
    }
}

/// Split a remediation payload into per-file contents.
pub fn parse_remediation(payload: &str) -> RemediationMap {
    let mut map = RemediationMap::new();
    let mut state = State::Seeking;

    for line in payload.lines() {
        if is_separator(line) {
            if let State::InFile { path, lines } = std::mem::replace(&mut state, State::Seeking) {
                finish(&mut map, path, &lines);
            }
            continue;
        }

        if let Some(next_path) = header_path(line) {
            if let State::InFile { path, .. } = &state {
                debug!(path = %path, "remediation block without separator; skipping");
            }
            state = State::InFile {
                path: next_path,
                lines: Vec::new(),
            };
            continue;
        }

        if let State::InFile { lines, .. } = &mut state {
            lines.push(line);
        }
    }

    if let State::InFile { path, lines } = state {
        finish(&mut map, path, &lines);
    }

    map
}
