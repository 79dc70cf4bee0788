//! Signing ledger trait
//!
//! Optional bookkeeping of which documents have been signed. Signing
//! never depends on it; failures are reported and otherwise ignored.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while updating a ledger
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Ledger is corrupt: {0}")]
    Corrupt(String),

    #[error("Records missing from the ledger: {0:?}")]
    MissingRecords(Vec<String>),
}

/// Trait for recording signing state outside the filesystem
pub trait SigningLedger: Send + Sync {
    /// Registers documents about to be signed.
    ///
    /// Returns the number of newly added records.
    fn record_pending(&self, paths: &[PathBuf]) -> Result<usize, LedgerError>;

    /// Marks a document as signed by its ledger path.
    ///
    /// Returns false when the ledger has no such record.
    fn mark_signed(&self, relative_path: &str) -> Result<bool, LedgerError>;

    /// Marks several documents as signed, returning how many were found
    fn mark_many_signed(&self, relative_paths: &[String]) -> Result<usize, LedgerError> {
        let mut updated = 0;
        for path in relative_paths {
            if self.mark_signed(path)? {
                updated += 1;
            }
        }
        Ok(updated)
    }
}

/// Returns the ledger key of a document: `parent_dir/file_name`
pub fn ledger_relative_path(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    match path.parent().and_then(|p| p.file_name()) {
        Some(parent) => format!("{}/{}", parent.to_string_lossy(), name),
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_uses_parent_folder() {
        let path = Path::new("/data/claims/198321380/claim.pdf");
        assert_eq!(ledger_relative_path(path), "198321380/claim.pdf");
    }

    #[test]
    fn test_relative_path_without_parent() {
        assert_eq!(ledger_relative_path(Path::new("claim.pdf")), "claim.pdf");
    }
}
