//! Document discovery on the local filesystem

mod file_scanner;

pub use file_scanner::{
    DEFAULT_MAX_DEPTH, FileScanner, ScanError, find_unsigned_files, remove_signatures,
};
