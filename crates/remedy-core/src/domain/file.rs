//! File records produced by the loader.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix of the sentinel for a path that does not name a regular file.
pub const NOT_FOUND_PREFIX: &str = "File not found: ";
/// Prefix of the sentinel for a file above the size cap.
pub const TOO_LARGE_PREFIX: &str = "File too large to process";
/// Prefix of the sentinel for any other read failure.
pub const READ_ERROR_PREFIX: &str = "Error reading file: ";

/// Outcome of loading a single file.
///
/// Only [`FileContent::Text`] is analyzable. The other variants render to
/// sentinel strings starting with one of the fixed prefixes above.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Text(String),
    NotFound { path: String },
    TooLarge { size: u64, limit: u64 },
    ReadError { message: String },
}

impl FileContent {
    pub fn is_text(&self) -> bool {
        matches!(self, FileContent::Text(_))
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            FileContent::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Sentinel string for non-text outcomes; `None` for text.
    pub fn sentinel(&self) -> Option<String> {
        match self {
            FileContent::Text(_) => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for FileContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileContent::Text(text) => f.write_str(text),
            FileContent::NotFound { path } => write!(f, "{NOT_FOUND_PREFIX}{path}"),
            FileContent::TooLarge { limit, .. } => {
                write!(f, "{TOO_LARGE_PREFIX} (>{limit} bytes)")
            }
            FileContent::ReadError { message } => write!(f, "{READ_ERROR_PREFIX}{message}"),
        }
    }
}

/// A loaded, analyzable file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path relative to the repository root, `/`-separated.
    pub file_path: String,
    pub content: String,
    /// Size in characters, counted once at load time.
    #[serde(skip)]
    pub char_count: usize,
}

impl FileRecord {
    pub fn new(file_path: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let char_count = content.chars().count();
        Self {
            file_path: file_path.into(),
            content,
            char_count,
        }
    }
}
