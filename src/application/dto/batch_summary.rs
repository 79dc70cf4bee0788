//! Batch summary DTO

use crate::domain::entities::{SignResult, SignatureProfile};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Aggregate view over the results of one batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    /// Files in the batch
    pub total: usize,
    /// Files signed
    pub successful: usize,
    /// Files that failed every attempt
    pub failed: usize,
    /// Signed files that carry validation data
    pub long_term: usize,
    /// Signed files that fell back to the basic profile
    pub basic: usize,
    /// Wall-clock duration of the batch
    pub elapsed: Duration,
    /// Sum of per-file processing times
    pub processing_time: Duration,
    /// Failed files with their last error
    pub failures: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    /// Builds a summary from a batch's results
    pub fn from_results(results: &[SignResult], elapsed: Duration) -> Self {
        let mut summary = Self {
            total: results.len(),
            successful: 0,
            failed: 0,
            long_term: 0,
            basic: 0,
            elapsed,
            processing_time: Duration::ZERO,
            failures: Vec::new(),
        };

        for result in results {
            summary.processing_time += result.processing_time();
            if result.success() {
                summary.successful += 1;
                match result.applied_profile() {
                    Some(SignatureProfile::LongTerm) => summary.long_term += 1,
                    _ => summary.basic += 1,
                }
            } else {
                summary.failed += 1;
                summary.failures.push((
                    result.file_path().to_path_buf(),
                    result.error_message().unwrap_or_default().to_string(),
                ));
            }
        }

        summary
    }

    /// Returns whether every file was signed
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    /// Returns the mean processing time per file
    pub fn average_per_file(&self) -> Duration {
        if self.total == 0 {
            return Duration::ZERO;
        }
        self.processing_time / self.total as u32
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Signed {} of {} files in {:.2}s ({} failed)",
            self.successful,
            self.total,
            self.elapsed.as_secs_f64(),
            self.failed
        )?;

        if self.basic > 0 {
            writeln!(
                f,
                "  {} long-term, {} basic (validation data unavailable)",
                self.long_term, self.basic
            )?;
        }

        if self.total > 0 {
            writeln!(
                f,
                "  Average {:.0}ms per file",
                self.average_per_file().as_secs_f64() * 1000.0
            )?;
        }

        for (path, error) in &self.failures {
            writeln!(f, "  FAILED {}: {}", path.display(), error)?;
        }

        Ok(())
    }
}
