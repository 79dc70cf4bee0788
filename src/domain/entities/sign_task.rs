//! Sign task entity
//!
//! One unit of signing work. A task is created by the orchestrator for a
//! discovered file, owned by the worker that executes it and dropped once
//! its result has been reported.

use crossbeam_channel::Sender;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag shared by every task of a batch.
///
/// Checked between signing attempts only; provider calls are never
/// interrupted.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token in the "running" state
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Posts a task's completion to the orchestrator.
///
/// Fires exactly once: either through [`CompletionSignal::complete`] or,
/// failing that, when the signal is dropped (including during unwinding).
#[derive(Debug)]
pub struct CompletionSignal {
    file_path: PathBuf,
    tx: Option<Sender<PathBuf>>,
}

impl CompletionSignal {
    /// Creates a signal bound to the orchestrator's progress channel
    pub fn new(file_path: PathBuf, tx: Sender<PathBuf>) -> Self {
        Self {
            file_path,
            tx: Some(tx),
        }
    }

    /// Creates a signal nobody listens to (single-file signing)
    pub fn detached(file_path: PathBuf) -> Self {
        Self { file_path, tx: None }
    }

    /// Reports completion
    pub fn complete(mut self) {
        self.fire();
    }

    fn fire(&mut self) {
        if let Some(tx) = self.tx.take() {
            // The receiver is gone only when the batch itself was abandoned.
            let _ = tx.send(self.file_path.clone());
        }
    }
}

impl Drop for CompletionSignal {
    fn drop(&mut self) {
        self.fire();
    }
}

/// A single file waiting to be signed
#[derive(Debug)]
pub struct SignTask {
    file_path: PathBuf,
    output_dir: Option<PathBuf>,
    completion: CompletionSignal,
    cancellation: CancellationToken,
}

impl SignTask {
    /// Creates a task for `file_path`.
    ///
    /// Fails when the path does not reference an existing regular file.
    pub fn new(
        file_path: PathBuf,
        output_dir: Option<PathBuf>,
        completion: CompletionSignal,
        cancellation: CancellationToken,
    ) -> io::Result<Self> {
        let metadata = fs::metadata(&file_path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", file_path.display()),
            ));
        }

        Ok(Self {
            file_path,
            output_dir,
            completion,
            cancellation,
        })
    }

    /// Creates a task with a detached completion signal and its own token
    pub fn detached(file_path: PathBuf, output_dir: Option<PathBuf>) -> io::Result<Self> {
        let completion = CompletionSignal::detached(file_path.clone());
        Self::new(file_path, output_dir, completion, CancellationToken::new())
    }

    /// Returns the document path
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Returns the output directory, if any
    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    /// Returns the cancellation token
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Splits the task into its parts
    pub fn into_parts(self) -> (PathBuf, Option<PathBuf>, CompletionSignal, CancellationToken) {
        (
            self.file_path,
            self.output_dir,
            self.completion,
            self.cancellation,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use tempfile::TempDir;

    #[test]
    fn test_signal_fires_once_on_complete() {
        let (tx, rx) = unbounded();
        let signal = CompletionSignal::new(PathBuf::from("a.pdf"), tx);
        signal.complete();

        assert_eq!(rx.try_recv().unwrap(), PathBuf::from("a.pdf"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_signal_fires_on_drop() {
        let (tx, rx) = unbounded();
        {
            let _signal = CompletionSignal::new(PathBuf::from("b.pdf"), tx);
        }
        assert_eq!(rx.try_recv().unwrap(), PathBuf::from("b.pdf"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_task_rejects_missing_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.pdf");
        assert!(SignTask::detached(missing, None).is_err());
    }

    #[test]
    fn test_task_rejects_directory() {
        let dir = TempDir::new().unwrap();
        let err = SignTask::detached(dir.path().to_path_buf(), None).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_cancellation_is_shared() {
        let token = CancellationToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
