//! Repository file listing and selection.

use std::collections::HashSet;
use std::path::Path;

use globset::{Glob, GlobMatcher};
use tracing::{error, info, warn};
use walkdir::WalkDir;

/// Extensions of binary-like files that are never analysed.
pub const SKIP_EXTENSIONS: &[&str] = &[
    // images
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "svg", "webp", "tiff", "psd",
    // archives
    "zip", "tar", "gz", "tgz", "bz2", "xz", "7z", "rar", "jar", "war", "whl", "egg",
    // compiled objects and executables
    "exe", "dll", "so", "dylib", "o", "a", "lib", "bin", "class", "pyc", "pyo", "wasm",
    // fonts
    "ttf", "otf", "woff", "woff2", "eot",
    // media
    "mp3", "mp4", "wav", "ogg", "avi", "mov", "mkv", "flac",
    // documents and data blobs
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "db", "sqlite", "pkl", "lock",
];

fn is_skipped_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_ascii_lowercase();
            SKIP_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

fn is_excluded_component(name: &str) -> bool {
    name.starts_with('.') || name.starts_with("__")
}

/// List analysable files under `repo_root`.
///
/// Excludes version-control metadata, dotfiles and dot-directories,
/// `__`-prefixed paths and binary-like extensions. Paths are relative,
/// `/`-separated and sorted. A walk error yields an empty list.
pub fn list_files(repo_root: &Path) -> Vec<String> {
    let walker = WalkDir::new(repo_root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0 || !is_excluded_component(&e.file_name().to_string_lossy())
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                error!(root = %repo_root.display(), error = %e, "error listing repository files");
                return Vec::new();
            }
        };

        if !entry.file_type().is_file() || is_skipped_extension(entry.path()) {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(repo_root) else {
            continue;
        };
        let relative: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        files.push(relative.join("/"));
    }

    files.sort();
    info!(count = files.len(), "listed repository files");
    files
}

fn is_glob_pattern(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Choose which files to analyse.
///
/// With patterns, glob patterns (`*`, `?`, `[`) match any listed file and
/// plain patterns must equal a listed path; matches are concatenated in
/// pattern order with duplicates removed. Without patterns, the first
/// `limit` files are taken (`None` = all).
pub fn select_files(all_files: &[String], patterns: &[String], limit: Option<usize>) -> Vec<String> {
    if patterns.is_empty() {
        let take = limit.unwrap_or(all_files.len());
        let selected: Vec<String> = all_files.iter().take(take).cloned().collect();
        info!(selected = selected.len(), total = all_files.len(), "selected files by limit");
        return selected;
    }

    let mut seen = HashSet::new();
    let mut selected = Vec::new();
    for pattern in patterns {
        if is_glob_pattern(pattern) {
            let matcher: GlobMatcher = match Glob::new(pattern) {
                Ok(glob) => glob.compile_matcher(),
                Err(e) => {
                    warn!(pattern = %pattern, error = %e, "ignoring invalid file pattern");
                    continue;
                }
            };
            for file in all_files.iter().filter(|f| matcher.is_match(f.as_str())) {
                if seen.insert(file.clone()) {
                    selected.push(file.clone());
                }
            }
        } else if all_files.iter().any(|f| f == pattern) && seen.insert(pattern.clone()) {
            selected.push(pattern.clone());
        }
    }

    info!(selected = selected.len(), patterns = patterns.len(), "selected files by pattern");
    selected
}
