//! Batcher.
//!
//! Groups files into ordered batches bounded by a file count and a
//! cumulative character budget. The budget check is "would this file push
//! the batch over", evaluated before insertion, so a file larger than the
//! whole budget still lands in a batch of its own.

use std::path::Path;

use tracing::{info, warn};

use crate::domain::batch::Batch;
use crate::domain::file::FileRecord;
use crate::loader::load_file;
use crate::metrics::METRICS;

/// Limits applied while building batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    pub max_file_size: u64,
    pub files_per_batch: usize,
    pub chars_per_batch: usize,
}

impl From<&crate::config::BatchLimits> for BatchPlan {
    fn from(limits: &crate::config::BatchLimits) -> Self {
        Self {
            max_file_size: limits.max_file_size,
            files_per_batch: limits.files_per_batch,
            chars_per_batch: limits.chars_per_batch,
        }
    }
}

/// Batches plus the paths that were skipped while loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSet {
    pub batches: Vec<Batch>,
    pub skipped: Vec<String>,
}

impl BatchSet {
    pub fn loaded_files(&self) -> usize {
        self.batches.iter().map(Batch::len).sum()
    }
}

/// Load each of `files` under `root` and group the loadable ones into batches.
///
/// Files whose load result is a sentinel are skipped and logged.
pub fn make_batches(root: &Path, files: &[String], plan: BatchPlan) -> BatchSet {
    let mut skipped = Vec::new();
    let records = files.iter().filter_map(|path| {
        let content = load_file(root, path, plan.max_file_size);
        if let Some(reason) = content.sentinel() {
            info!(path = %path, reason = %reason, "skipping file");
            METRICS.inc_files_skipped();
            skipped.push(path.clone());
            return None;
        }
        METRICS.inc_files_loaded();
        content
            .into_text()
            .map(|text| FileRecord::new(path.clone(), text))
    });

    let batches = group_records(records, plan.files_per_batch, plan.chars_per_batch);
    info!(batches = batches.len(), skipped = skipped.len(), "created batches of files");
    BatchSet { batches, skipped }
}

/// Group already-loaded records into batches, preserving input order.
pub fn group_records<I>(records: I, files_per_batch: usize, chars_per_batch: usize) -> Vec<Batch>
where
    I: IntoIterator<Item = FileRecord>,
{
    let files_per_batch = files_per_batch.max(1);
    let mut batches = Vec::new();
    let mut current: Vec<FileRecord> = Vec::new();
    let mut current_chars = 0usize;

    for record in records {
        let would_exceed = current_chars + record.char_count > chars_per_batch;
        if (would_exceed || current.len() >= files_per_batch) && !current.is_empty() {
            batches.push(Batch::new(batches.len(), std::mem::take(&mut current)));
            current_chars = 0;
        }

        if record.char_count > chars_per_batch {
            warn!(
                path = %record.file_path,
                chars = record.char_count,
                budget = chars_per_batch,
                "file exceeds batch budget on its own; placing it in a dedicated batch"
            );
        }

        current_chars += record.char_count;
        current.push(record);
    }

    if !current.is_empty() {
        batches.push(Batch::new(batches.len(), current));
    }

    batches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(path: &str, chars: usize) -> FileRecord {
        FileRecord::new(path, "x".repeat(chars))
    }

    fn paths(batches: &[Batch]) -> Vec<Vec<String>> {
        batches.iter().map(Batch::file_paths).collect()
    }

    #[test]
    fn splits_on_file_count_and_char_budget() {
        let batches = group_records(vec![rec("A", 40), rec("B", 40), rec("C", 40)], 2, 100);
        assert_eq!(paths(&batches), vec![vec!["A", "B"], vec!["C"]]);
        assert_eq!(batches[0].char_count(), 80);
        assert_eq!(batches[1].index, 1);
    }

    #[test]
    fn char_budget_closes_batch_before_file_limit() {
        let batches = group_records(vec![rec("A", 60), rec("B", 60), rec("C", 30)], 3, 100);
        assert_eq!(paths(&batches), vec![vec!["A"], vec!["B", "C"]]);
    }

    #[test]
    fn oversized_file_gets_its_own_batch() {
        let batches = group_records(vec![rec("A", 10), rec("HUGE", 500), rec("B", 10)], 3, 100);
        assert_eq!(paths(&batches), vec![vec!["A"], vec!["HUGE"], vec!["B"]]);
    }

    #[test]
    fn oversized_first_file_does_not_create_empty_batch() {
        let batches = group_records(vec![rec("HUGE", 500)], 3, 100);
        assert_eq!(paths(&batches), vec![vec!["HUGE"]]);
    }

    #[test]
    fn empty_input_yields_no_batches() {
        assert!(group_records(Vec::new(), 3, 100).is_empty());
    }

    #[test]
    fn make_batches_skips_sentinels_and_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "a".repeat(40)).unwrap();
        std::fs::write(dir.path().join("big.py"), "b".repeat(500)).unwrap();
        std::fs::write(dir.path().join("c.py"), "c".repeat(40)).unwrap();

        let files: Vec<String> = ["a.py", "missing.py", "big.py", "c.py"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let plan = BatchPlan {
            max_file_size: 100,
            files_per_batch: 3,
            chars_per_batch: 1000,
        };
        let set = make_batches(dir.path(), &files, plan);

        assert_eq!(paths(&set.batches), vec![vec!["a.py", "c.py"]]);
        assert_eq!(set.skipped, vec!["missing.py", "big.py"]);
        assert_eq!(set.loaded_files(), 2);
    }
}
