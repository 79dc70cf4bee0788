//! Scan report entity
//!
//! Result of walking a root folder for unsigned documents.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Number of unsigned documents found per directory.
///
/// Used for reporting only; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderScanStats {
    counts: BTreeMap<PathBuf, usize>,
}

impl FolderScanStats {
    /// Creates empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one unsigned document in `dir`
    pub fn record(&mut self, dir: &Path) {
        *self.counts.entry(dir.to_path_buf()).or_insert(0) += 1;
    }

    /// Returns the count for a directory
    pub fn count_for(&self, dir: &Path) -> usize {
        self.counts.get(dir).copied().unwrap_or(0)
    }

    /// Iterates over (directory, count) pairs in path order
    pub fn iter(&self) -> impl Iterator<Item = (&Path, usize)> {
        self.counts.iter().map(|(dir, count)| (dir.as_path(), *count))
    }

    /// Returns the number of directories holding unsigned documents
    pub fn directories(&self) -> usize {
        self.counts.len()
    }

    /// Returns the total number of unsigned documents
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Everything a scan produced
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Unsigned documents, in traversal order
    pub files: Vec<PathBuf>,
    /// Per-directory counts
    pub folder_stats: FolderScanStats,
    /// Entries that could not be read and were skipped
    pub skipped_entries: usize,
}

impl ScanReport {
    /// Returns whether nothing needs signing
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Returns a summary string
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Found {} unsigned document(s) in {} folder(s)\n",
            self.files.len(),
            self.folder_stats.directories()
        );

        for (dir, count) in self.folder_stats.iter() {
            summary.push_str(&format!("  - {}: {}\n", dir.display(), count));
        }

        if self.skipped_entries > 0 {
            summary.push_str(&format!("\nSkipped {} unreadable entries\n", self.skipped_entries));
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_stats_counts() {
        let mut stats = FolderScanStats::new();
        stats.record(Path::new("a"));
        stats.record(Path::new("a"));
        stats.record(Path::new("b"));

        assert_eq!(stats.count_for(Path::new("a")), 2);
        assert_eq!(stats.count_for(Path::new("c")), 0);
        assert_eq!(stats.directories(), 2);
        assert_eq!(stats.total(), 3);
    }

    #[test]
    fn test_summary_lists_folders() {
        let mut report = ScanReport::default();
        report.files.push(PathBuf::from("a/x.pdf"));
        report.folder_stats.record(Path::new("a"));

        let summary = report.summary();
        assert!(summary.contains("Found 1 unsigned document(s) in 1 folder(s)"));
        assert!(summary.contains("a: 1"));
    }
}
