//! JSON file signing ledger
//!
//! Keeps one record per document in a JSON array on disk:
//!
//! ```json
//! [ { "name": "claim.pdf", "relative_path": "198321380/claim.pdf", "is_signed": true } ]
//! ```

use crate::domain::repositories::{LedgerError, SigningLedger, ledger_relative_path};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One document known to the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub name: String,
    pub relative_path: String,
    #[serde(default)]
    pub is_signed: bool,
}

impl LedgerRecord {
    fn pending(path: &Path) -> Self {
        Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            relative_path: ledger_relative_path(path),
            is_signed: false,
        }
    }
}

/// Signing ledger stored as a JSON file
///
/// In strict mode every document must already be registered;
/// `record_pending` then reports unknown documents instead of adding
/// them.
pub struct JsonFileLedger {
    path: PathBuf,
    strict: bool,
    records: Mutex<Vec<LedgerRecord>>,
}

impl JsonFileLedger {
    /// Opens the ledger at `path`, starting empty when the file is absent
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let records = match fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Vec::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| LedgerError::Corrupt(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), records = records.len(), "ledger opened");
        Ok(Self {
            path,
            strict: false,
            records: Mutex::new(records),
        })
    }

    /// Requires documents to be registered before they are signed
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Returns a copy of every record
    pub fn records(&self) -> Vec<LedgerRecord> {
        self.records.lock().clone()
    }

    /// Returns the records not signed yet
    pub fn unsigned(&self) -> Vec<LedgerRecord> {
        self.records.lock().iter().filter(|r| !r.is_signed).cloned().collect()
    }

    /// Returns the signed records
    pub fn signed(&self) -> Vec<LedgerRecord> {
        self.records.lock().iter().filter(|r| r.is_signed).cloned().collect()
    }

    /// Writes `records` through a temporary file and a rename
    fn persist(&self, records: &[LedgerRecord]) -> Result<(), LedgerError> {
        let json =
            serde_json::to_vec_pretty(records).map_err(|e| LedgerError::Corrupt(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SigningLedger for JsonFileLedger {
    fn record_pending(&self, paths: &[PathBuf]) -> Result<usize, LedgerError> {
        let mut records = self.records.lock();

        let mut missing: Vec<LedgerRecord> = Vec::new();
        for path in paths {
            let record = LedgerRecord::pending(path);
            let known = records.iter().any(|r| r.relative_path == record.relative_path)
                || missing.iter().any(|r| r.relative_path == record.relative_path);
            if !known {
                missing.push(record);
            }
        }

        if missing.is_empty() {
            return Ok(0);
        }
        if self.strict {
            return Err(LedgerError::MissingRecords(
                missing.into_iter().map(|r| r.relative_path).collect(),
            ));
        }

        let added = missing.len();
        records.extend(missing);
        self.persist(&records)?;
        Ok(added)
    }

    fn mark_signed(&self, relative_path: &str) -> Result<bool, LedgerError> {
        let mut records = self.records.lock();
        match records.iter_mut().find(|r| r.relative_path == relative_path) {
            Some(record) => {
                record.is_signed = true;
                self.persist(&records)?;
                Ok(true)
            }
            None => {
                tracing::warn!(relative_path, "document not found in ledger");
                Ok(false)
            }
        }
    }

    fn mark_many_signed(&self, relative_paths: &[String]) -> Result<usize, LedgerError> {
        let mut records = self.records.lock();
        let mut updated = 0;

        for relative_path in relative_paths {
            match records.iter_mut().find(|r| &r.relative_path == relative_path) {
                Some(record) => {
                    record.is_signed = true;
                    updated += 1;
                }
                None => {
                    tracing::warn!(relative_path = %relative_path, "document not found in ledger")
                }
            }
        }

        if updated > 0 {
            self.persist(&records)?;
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_opens_empty() {
        let tmp = TempDir::new().unwrap();
        let ledger = JsonFileLedger::open(tmp.path().join("ledger.json")).unwrap();
        assert!(ledger.records().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ledger.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(JsonFileLedger::open(&path), Err(LedgerError::Corrupt(_))));
    }

    #[test]
    fn test_records_are_persisted() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ledger.json");
        let ledger = JsonFileLedger::open(&path).unwrap();

        let docs = vec![PathBuf::from("/in/a/one.pdf"), PathBuf::from("/in/b/two.pdf")];
        assert_eq!(ledger.record_pending(&docs).unwrap(), 2);
        assert_eq!(ledger.record_pending(&docs).unwrap(), 0);
        assert!(ledger.mark_signed("a/one.pdf").unwrap());
        assert!(!ledger.mark_signed("c/three.pdf").unwrap());

        let reopened = JsonFileLedger::open(&path).unwrap();
        assert_eq!(reopened.signed().len(), 1);
        assert_eq!(reopened.unsigned()[0].relative_path, "b/two.pdf");
        assert!(!tmp.path().join("ledger.json.tmp").exists());
    }

    #[test]
    fn test_strict_mode_reports_unknown_documents() {
        let tmp = TempDir::new().unwrap();
        let ledger = JsonFileLedger::open(tmp.path().join("ledger.json")).unwrap().strict();

        let err = ledger.record_pending(&[PathBuf::from("/in/a/one.pdf")]).unwrap_err();
        match err {
            LedgerError::MissingRecords(paths) => assert_eq!(paths, vec!["a/one.pdf".to_string()]),
            other => panic!("unexpected error: {other}"),
        }
        assert!(ledger.records().is_empty());
    }
}
