//! Filesystem scanner for unsigned documents

use crate::domain::entities::{
    FolderScanStats, ScanReport, has_signature_artifact, is_signature_artifact, normalize_extension,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Default recursion bound; symlinks are not followed either
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Errors that prevent a scan from starting
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Root folder not found: {0}")]
    RootNotFound(PathBuf),

    #[error("Root is not a folder: {0}")]
    RootNotDirectory(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

/// Recursively finds documents that have no signature artifact yet
#[derive(Debug, Clone)]
pub struct FileScanner {
    extensions: Vec<String>,
    max_depth: usize,
}

impl FileScanner {
    /// Creates a scanner for the given extensions (`pdf`, `.PDF`, ...)
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Self {
        let mut extensions: Vec<String> = extensions
            .iter()
            .filter_map(|ext| normalize_extension(ext.as_ref()))
            .collect();
        extensions.sort();
        extensions.dedup();

        Self {
            extensions,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets the deepest directory level to descend to
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Returns the normalised extensions
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Returns the unsigned documents under `root` in walk order
    pub fn find_unsigned_files(&self, root: &Path) -> Result<Vec<PathBuf>, ScanError> {
        Ok(self.scan(root)?.files)
    }

    /// Walks `root` and reports unsigned documents with per-folder counts.
    ///
    /// Unreadable entries are skipped with a warning.
    pub fn scan(&self, root: &Path) -> Result<ScanReport, ScanError> {
        check_root(root)?;
        tracing::debug!(
            root = %root.display(),
            extensions = ?self.extensions,
            "scanning for unsigned documents"
        );

        let mut files = Vec::new();
        let mut folder_stats = FolderScanStats::new();
        let mut skipped_entries = 0usize;

        let walker = WalkDir::new(root)
            .follow_links(false)
            .max_depth(self.max_depth)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable entry");
                    skipped_entries += 1;
                    continue;
                }
            };

            if !self.is_candidate(&entry) {
                continue;
            }

            let path = entry.into_path();
            if has_signature_artifact(&path) {
                continue;
            }

            if let Some(parent) = path.parent() {
                folder_stats.record(parent);
            }
            files.push(path);
        }

        for (dir, count) in folder_stats.iter() {
            tracing::debug!(dir = %dir.display(), unsigned = count, "folder scanned");
        }

        let report = ScanReport {
            files,
            folder_stats,
            skipped_entries,
        };
        tracing::info!(
            root = %root.display(),
            unsigned = report.files.len(),
            skipped = skipped_entries,
            "scan complete"
        );
        Ok(report)
    }

    fn is_candidate(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_file() {
            return false;
        }
        let path = entry.path();
        if is_signature_artifact(path) {
            return false;
        }
        self.matches_extension(path)
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| normalize_extension(&ext.to_string_lossy()))
            .is_some_and(|ext| self.extensions.contains(&ext))
    }
}

/// Returns the unsigned documents under `root` with the given extensions
pub fn find_unsigned_files<S: AsRef<str>>(
    root: &Path,
    extensions: &[S],
) -> Result<Vec<PathBuf>, ScanError> {
    FileScanner::new(extensions).find_unsigned_files(root)
}

/// Deletes every signature artifact under `root`.
///
/// Returns the number of files removed. Files that cannot be removed are
/// logged and skipped.
pub fn remove_signatures(root: &Path) -> Result<usize, ScanError> {
    check_root(root)?;

    let mut removed = 0usize;
    let walker = WalkDir::new(root).follow_links(false).max_depth(DEFAULT_MAX_DEPTH);

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };

        if !entry.file_type().is_file() || !is_signature_artifact(entry.path()) {
            continue;
        }

        match fs::remove_file(entry.path()) {
            Ok(()) => {
                tracing::debug!(path = %entry.path().display(), "removed signature");
                removed += 1;
            }
            Err(e) => tracing::warn!(
                path = %entry.path().display(),
                error = %e,
                "could not remove signature"
            ),
        }
    }

    tracing::info!(root = %root.display(), removed, "signatures removed");
    Ok(removed)
}

fn check_root(root: &Path) -> Result<(), ScanError> {
    let metadata = fs::metadata(root).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ScanError::RootNotFound(root.to_path_buf())
        } else {
            ScanError::Io {
                path: root.to_path_buf(),
                source,
            }
        }
    })?;

    if !metadata.is_dir() {
        return Err(ScanError::RootNotDirectory(root.to_path_buf()));
    }
    Ok(())
}
