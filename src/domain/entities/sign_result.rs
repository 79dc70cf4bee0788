//! Sign result entity
//!
//! Outcome of one sign task. Exactly one result exists per task, whether
//! the file was signed or every attempt failed.

use super::algorithm::SignatureProfile;
use std::path::{Path, PathBuf};
use std::time::Duration;

const UNKNOWN_ERROR: &str = "unknown error";

/// Immutable outcome of signing a single file
#[derive(Debug, Clone, PartialEq)]
pub struct SignResult {
    file_path: PathBuf,
    output_path: Option<PathBuf>,
    error_message: Option<String>,
    applied_profile: Option<SignatureProfile>,
    processing_time: Duration,
}

impl SignResult {
    /// Creates a successful result
    pub fn signed(
        file_path: PathBuf,
        output_path: PathBuf,
        applied_profile: SignatureProfile,
        processing_time: Duration,
    ) -> Self {
        Self {
            file_path,
            output_path: Some(output_path),
            error_message: None,
            applied_profile: Some(applied_profile),
            processing_time,
        }
    }

    /// Creates a failed result.
    ///
    /// An empty message is replaced so that a failure always explains
    /// itself.
    pub fn failed(
        file_path: PathBuf,
        error_message: impl Into<String>,
        processing_time: Duration,
    ) -> Self {
        let mut message = error_message.into();
        if message.trim().is_empty() {
            message = UNKNOWN_ERROR.to_string();
        }

        Self {
            file_path,
            output_path: None,
            error_message: Some(message),
            applied_profile: None,
            processing_time,
        }
    }

    /// Returns the document path
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Returns the written container path (successful results only)
    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    /// Returns whether the file was signed
    pub fn success(&self) -> bool {
        self.output_path.is_some()
    }

    /// Returns the last error (failed results only)
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Returns the profile actually written.
    ///
    /// A long-term batch reports `Basic` here for files whose validation
    /// data could not be fetched.
    pub fn applied_profile(&self) -> Option<SignatureProfile> {
        self.applied_profile
    }

    /// Returns the wall time spent on this file, retries included
    pub fn processing_time(&self) -> Duration {
        self.processing_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_result() {
        let result = SignResult::signed(
            PathBuf::from("a.pdf"),
            PathBuf::from("a.pdf.p7s"),
            SignatureProfile::LongTerm,
            Duration::from_millis(5),
        );
        assert!(result.success());
        assert_eq!(result.output_path(), Some(Path::new("a.pdf.p7s")));
        assert!(result.error_message().is_none());
    }

    #[test]
    fn test_failed_result_never_has_empty_message() {
        let result = SignResult::failed(PathBuf::from("a.pdf"), "  ", Duration::ZERO);
        assert!(!result.success());
        assert_eq!(result.error_message(), Some(UNKNOWN_ERROR));
        assert!(result.output_path().is_none());
    }
}
