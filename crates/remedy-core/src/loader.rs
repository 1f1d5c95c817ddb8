//! File loader.
//!
//! Reads one file under a size cap. Never fails past its boundary: missing
//! files, oversize files and read errors all come back as sentinel variants
//! of [`FileContent`]. Oversize files are never truncated.

use std::path::Path;

use tracing::{debug, error};

use crate::domain::file::FileContent;

/// Load `relative_path` under `root`, refusing files larger than `max_size` bytes.
///
/// Invalid UTF-8 is replaced rather than rejected.
pub fn load_file(root: &Path, relative_path: &str, max_size: u64) -> FileContent {
    let full_path = root.join(relative_path);

    let metadata = match std::fs::metadata(&full_path) {
        Ok(m) if m.is_file() => m,
        Ok(_) => {
            return FileContent::NotFound {
                path: relative_path.to_string(),
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return FileContent::NotFound {
                path: relative_path.to_string(),
            }
        }
        Err(e) => {
            error!(path = %relative_path, error = %e, "failed to stat file");
            return FileContent::ReadError {
                message: e.to_string(),
            };
        }
    };

    if metadata.len() > max_size {
        debug!(path = %relative_path, size = metadata.len(), limit = max_size, "file over size cap");
        return FileContent::TooLarge {
            size: metadata.len(),
            limit: max_size,
        };
    }

    match std::fs::read(&full_path) {
        Ok(bytes) => FileContent::Text(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            error!(path = %relative_path, error = %e, "failed to read file");
            FileContent::ReadError {
                message: e.to_string(),
            }
        }
    }
}
