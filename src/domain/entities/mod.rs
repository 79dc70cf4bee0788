//! Domain entities
//!
//! Core business objects of the batch signing domain: tasks, results,
//! progress accounting, scan reports and algorithm identifiers.

mod algorithm;
mod progress;
mod scan_report;
mod sign_result;
mod sign_task;
mod signature_artifact;

pub use algorithm::{HashAlgorithm, KeyType, SignAlgorithm, SignatureProfile};
pub use progress::{ProgressCounter, ProgressSnapshot};
pub use scan_report::{FolderScanStats, ScanReport};
pub use sign_result::SignResult;
pub use sign_task::{CancellationToken, CompletionSignal, SignTask};
pub use signature_artifact::{
    SIGNATURE_EXTENSION, has_signature_artifact, is_signature_artifact, normalize_extension,
    signature_path_for,
};
