//! Progress reporting for CLI

use crate::application::ProgressCallback;
use indicatif::{ProgressBar, ProgressStyle};

/// Progress reporter using indicatif
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Creates a reporter counting signed files
    pub fn for_signing(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(concat!(
                    "{msg}\n{spinner:.green} [{elapsed_precise}] ",
                    "[{wide_bar:.cyan/blue}] {pos}/{len} files ({eta})"
                ))
                .expect("invalid progress bar template")
                .progress_chars("#>-"),
        );
        bar.set_message("Signing documents...".to_string());

        Self { bar }
    }

    /// Creates a reporter with an unknown total
    pub fn pending() -> Self {
        Self::for_signing(0)
    }

    /// Updates the progress bar
    pub fn update(&self, completed: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(completed as u64);
    }

    /// Finishes with a message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Removes the bar from the terminal
    pub fn clear(&self) {
        self.bar.finish_and_clear();
    }

    /// Gets a callback for batch progress
    pub fn signing_callback(&self) -> ProgressCallback<'_> {
        Box::new(move |completed: usize, total: usize| self.update(completed, total))
    }
}
