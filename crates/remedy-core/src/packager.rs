//! Remediation packager.
//!
//! Materializes a [`RemediationMap`] under `work_dir/remediated_code/` and
//! zips that tree into `work_dir/remediated_code.zip`. Keys that would
//! escape the tree, or that cannot be written (e.g. a file key that is also
//! another key's directory), are skipped.

use std::fs::File;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::domain::remediation::RemediationMap;

/// Directory (under the work dir) that receives remediated files.
pub const TREE_DIR: &str = "remediated_code";
/// Archive file name (under the work dir).
pub const ARCHIVE_NAME: &str = "remediated_code.zip";

/// Errors from the packaging step. Never fatal to a run.
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error("no remediated file could be written")]
    NothingToPackage,

    #[error("io error while packaging: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("walk error while archiving: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Relative path for `key` if it stays inside the tree.
///
/// Rejects empty keys, absolute paths and any `..` component.
pub fn sanitize_key(key: &str) -> Option<PathBuf> {
    let mut clean = PathBuf::new();
    for component in Path::new(key.trim()).components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    (!clean.as_os_str().is_empty()).then_some(clean)
}

/// Write every entry of `remediation` under `work_dir` and archive the tree.
///
/// Returns the archive path.
pub fn package(remediation: &RemediationMap, work_dir: &Path) -> Result<PathBuf, PackageError> {
    let tree = work_dir.join(TREE_DIR);
    std::fs::create_dir_all(&tree)?;

    let mut written = 0usize;
    for (key, content) in remediation.iter() {
        let Some(relative) = sanitize_key(key) else {
            warn!(key = %key, "rejecting remediation path outside the work dir");
            continue;
        };
        match write_entry(&tree.join(&relative), content) {
            Ok(()) => {
                debug!(path = %relative.display(), "wrote remediated file");
                written += 1;
            }
            Err(e) => warn!(key = %key, error = %e, "skipping remediated file that could not be written"),
        }
    }

    if written == 0 {
        return Err(PackageError::NothingToPackage);
    }

    let archive = work_dir.join(ARCHIVE_NAME);
    let entries = zip_tree(&tree, &archive)?;
    info!(archive = %archive.display(), entries = entries, "packaged remediated code");
    Ok(archive)
}

fn write_entry(target: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(target, content)
}

fn zip_tree(tree: &Path, archive: &Path) -> Result<usize, PackageError> {
    let mut writer = ZipWriter::new(File::create(archive)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries = 0usize;
    for entry in WalkDir::new(tree).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(tree) else {
            continue;
        };
        let name: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();

        writer.start_file(name.join("/"), options)?;
        writer.write_all(&std::fs::read(entry.path())?)?;
        entries += 1;
    }

    writer.finish()?;
    Ok(entries)
}
