//! Batch orchestrator
//!
//! Fans a scanned folder out to a pool of signing workers and collects
//! exactly one result per file.
//!
//! ```text
//!  orchestrator ──tasks──▶ worker 0..n ──results──▶ orchestrator
//!       ▲                      │
//!       └──── completions ─────┘   (bounded, drained every 100ms)
//! ```
//!
//! The progress callback only ever runs on the thread that called
//! [`BatchOrchestrator::process_folder`].

use crate::application::error::BatchError;
use crate::domain::entities::{
    CancellationToken, CompletionSignal, ProgressCounter, ScanReport, SignResult, SignTask,
};
use crate::domain::repositories::{SigningLedger, SigningProvider, ledger_relative_path};
use crate::domain::services::SignatureService;
use crate::infrastructure::scanning::FileScanner;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded, unbounded};
use std::any::Any;
use std::collections::HashSet;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Poll interval of the completion drain loop
pub const PROGRESS_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Receives `(completed, total)` after every finished file
pub type ProgressCallback<'a> = Box<dyn FnMut(usize, usize) + 'a>;

/// Runs one batch over a folder
pub struct BatchOrchestrator<P: SigningProvider + 'static> {
    service: Arc<SignatureService<P>>,
    scanner: FileScanner,
    max_workers: usize,
    ledger: Option<Arc<dyn SigningLedger>>,
    cancellation: CancellationToken,
}

impl<P: SigningProvider + 'static> BatchOrchestrator<P> {
    /// Creates an orchestrator with at most `max_workers` signing threads
    pub fn new(
        service: Arc<SignatureService<P>>,
        scanner: FileScanner,
        max_workers: usize,
    ) -> Self {
        Self {
            service,
            scanner,
            max_workers: max_workers.max(1),
            ledger: None,
            cancellation: CancellationToken::new(),
        }
    }

    /// Records pending and signed documents in `ledger`
    pub fn with_ledger(mut self, ledger: Arc<dyn SigningLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Shares an externally owned cancellation token
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Returns the token that stops the batch between attempts
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Scans `root` and signs every unsigned document found.
    ///
    /// An empty folder yields an empty vector. A missing or unreadable
    /// root is an error.
    pub fn process_folder(
        &self,
        root: &Path,
        output_base_dir: Option<&Path>,
        on_progress: Option<ProgressCallback<'_>>,
    ) -> Result<Vec<SignResult>, BatchError> {
        let report = self.scanner.scan(root)?;
        self.process_report(root, report, output_base_dir, on_progress)
    }

    /// Signs the files of an existing scan report
    pub fn process_report(
        &self,
        root: &Path,
        report: ScanReport,
        output_base_dir: Option<&Path>,
        mut on_progress: Option<ProgressCallback<'_>>,
    ) -> Result<Vec<SignResult>, BatchError> {
        let files = report.files;
        let total = files.len();
        if total == 0 {
            tracing::info!(root = %root.display(), "no unsigned documents found");
            return Ok(Vec::new());
        }

        let start = Instant::now();
        self.record_pending(&files);

        let worker_count = self.max_workers.min(total);
        let (task_tx, task_rx) = unbounded::<SignTask>();
        let (result_tx, result_rx) = unbounded::<SignResult>();
        let (done_tx, done_rx) = bounded::<PathBuf>(total);

        let handles = self.spawn_workers(worker_count, &task_rx, &result_tx)?;
        drop(task_rx);
        drop(result_tx);

        tracing::info!(
            root = %root.display(),
            files = total,
            workers = handles.len(),
            "starting batch"
        );

        let mut rejected = Vec::new();
        for file in &files {
            let output_dir = output_base_dir.map(|base| mirror_output_dir(root, base, file));
            let completion = CompletionSignal::new(file.clone(), done_tx.clone());

            match SignTask::new(file.clone(), output_dir, completion, self.cancellation.clone()) {
                Ok(task) => {
                    if let Err(e) = task_tx.send(task) {
                        // All workers are gone; the returned task drops and reports itself.
                        tracing::error!(file = %file.display(), "no worker left to accept task");
                        drop(e.into_inner());
                        rejected.push(SignResult::failed(
                            file.clone(),
                            "no signing worker available",
                            Duration::ZERO,
                        ));
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        file = %file.display(),
                        error = %e,
                        "document disappeared before signing"
                    );
                    rejected.push(SignResult::failed(file.clone(), e.to_string(), Duration::ZERO));
                }
            }
        }
        drop(task_tx);
        drop(done_tx);

        drain_completions(&done_rx, total, &mut on_progress);

        for (i, handle) in handles.into_iter().enumerate() {
            if handle.join().is_err() {
                tracing::error!(worker = i, "signing worker panicked");
            }
        }

        // Workers send results as they finish, so the channel holds them
        // in completion order.
        let mut results: Vec<SignResult> = result_rx.try_iter().collect();
        results.extend(rejected);
        let results = reconcile(&files, results);

        self.record_signed(&results);

        let signed = results.iter().filter(|r| r.success()).count();
        tracing::info!(
            signed,
            failed = total - signed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            cancelled = self.cancellation.is_cancelled(),
            "batch finished"
        );

        Ok(results)
    }

    fn spawn_workers(
        &self,
        count: usize,
        tasks: &Receiver<SignTask>,
        results: &Sender<SignResult>,
    ) -> Result<Vec<JoinHandle<()>>, BatchError> {
        let mut handles = Vec::with_capacity(count);

        for worker_id in 0..count {
            let service = Arc::clone(&self.service);
            let tasks = tasks.clone();
            let results = results.clone();

            let spawned = thread::Builder::new()
                .name(format!("signer-{}", worker_id))
                .spawn(move || worker_loop(&service, tasks, results));

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) if handles.is_empty() => return Err(BatchError::WorkerSpawn(e)),
                Err(e) => {
                    tracing::warn!(
                        requested = count,
                        running = handles.len(),
                        error = %e,
                        "could not start every signing worker"
                    );
                    break;
                }
            }
        }

        Ok(handles)
    }

    fn record_pending(&self, files: &[PathBuf]) {
        if let Some(ledger) = &self.ledger {
            match ledger.record_pending(files) {
                Ok(added) => tracing::debug!(added, "ledger updated with pending documents"),
                Err(e) => tracing::warn!(error = %e, "could not record pending documents"),
            }
        }
    }

    fn record_signed(&self, results: &[SignResult]) {
        let Some(ledger) = &self.ledger else {
            return;
        };

        let signed: Vec<String> = results
            .iter()
            .filter(|r| r.success())
            .map(|r| ledger_relative_path(r.file_path()))
            .collect();
        if signed.is_empty() {
            return;
        }

        match ledger.mark_many_signed(&signed) {
            Ok(updated) => tracing::debug!(updated, "ledger updated with signed documents"),
            Err(e) => tracing::warn!(error = %e, "could not mark documents as signed"),
        }
    }
}

/// Pulls tasks until the queue closes, one result per task.
///
/// A panic escaping the signing service becomes a failed result; the
/// task's completion signal fires while unwinding.
fn worker_loop<P: SigningProvider>(
    service: &SignatureService<P>,
    tasks: Receiver<SignTask>,
    results: Sender<SignResult>,
) {
    for task in tasks {
        let file_path = task.file_path().to_path_buf();
        let start = Instant::now();

        let result = panic::catch_unwind(AssertUnwindSafe(|| service.sign_file(task)))
            .unwrap_or_else(|payload| {
                let message = panic_message(payload.as_ref());
                tracing::error!(file = %file_path.display(), panic = %message, "signing panicked");
                SignResult::failed(
                    file_path,
                    format!("unexpected failure: {}", message),
                    start.elapsed(),
                )
            });

        if results.send(result).is_err() {
            break;
        }
    }
}

/// Counts completion signals until every task reported or every sender
/// is gone, calling `on_progress` on this thread.
fn drain_completions(
    done_rx: &Receiver<PathBuf>,
    total: usize,
    on_progress: &mut Option<ProgressCallback<'_>>,
) {
    let mut counter = ProgressCounter::new(total);

    loop {
        match done_rx.recv_timeout(PROGRESS_POLL_INTERVAL) {
            Ok(file) => {
                let snapshot = counter.increment();
                tracing::trace!(
                    file = %file.display(),
                    completed = snapshot.completed,
                    total,
                    "file finished"
                );
                if let Some(callback) = on_progress.as_mut() {
                    callback(snapshot.completed, snapshot.total);
                }
                if snapshot.is_complete() {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// Keeps `results` in completion order, one per file, and appends a
/// failed result for every file that never reported
fn reconcile(files: &[PathBuf], results: Vec<SignResult>) -> Vec<SignResult> {
    let mut outstanding: HashSet<&Path> = files.iter().map(PathBuf::as_path).collect();

    let mut reconciled: Vec<SignResult> = results
        .into_iter()
        .filter(|result| {
            let expected = outstanding.remove(result.file_path());
            if !expected {
                tracing::warn!(file = %result.file_path().display(), "dropping duplicate result");
            }
            expected
        })
        .collect();

    for file in files {
        if outstanding.contains(file.as_path()) {
            tracing::error!(file = %file.display(), "no result reported for document");
            reconciled.push(SignResult::failed(
                file.clone(),
                "no result reported by signing worker",
                Duration::ZERO,
            ));
        }
    }
    reconciled
}

/// Maps `file`'s directory under `root` onto `base`, creating it
fn mirror_output_dir(root: &Path, base: &Path, file: &Path) -> PathBuf {
    let relative = file
        .parent()
        .and_then(|parent| parent.strip_prefix(root).ok())
        .unwrap_or_else(|| Path::new(""));
    let dir = base.join(relative);

    if let Err(e) = fs::create_dir_all(&dir) {
        tracing::warn!(dir = %dir.display(), error = %e, "could not create output directory");
    }
    dir
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mirror_output_dir() {
        let tmp = TempDir::new().unwrap();
        let root = Path::new("/data/in");
        let base = tmp.path().join("out");

        let dir = mirror_output_dir(root, &base, Path::new("/data/in/a/b/doc.pdf"));
        assert_eq!(dir, base.join("a/b"));
        assert!(dir.is_dir());

        let dir = mirror_output_dir(root, &base, Path::new("/data/in/doc.pdf"));
        assert_eq!(dir, base);
    }

    #[test]
    fn test_reconcile_keeps_completion_order_and_fills_missing() {
        let files = vec![
            PathBuf::from("a.pdf"),
            PathBuf::from("b.pdf"),
            PathBuf::from("c.pdf"),
        ];
        let results = vec![
            SignResult::failed(PathBuf::from("c.pdf"), "boom", Duration::ZERO),
            SignResult::failed(PathBuf::from("c.pdf"), "again", Duration::ZERO),
            SignResult::failed(PathBuf::from("b.pdf"), "late", Duration::ZERO),
        ];

        let reconciled = reconcile(&files, results);
        let order: Vec<&Path> = reconciled.iter().map(|r| r.file_path()).collect();
        assert_eq!(
            order,
            vec![Path::new("c.pdf"), Path::new("b.pdf"), Path::new("a.pdf")]
        );
        assert_eq!(reconciled[0].error_message(), Some("boom"));
        assert!(!reconciled[2].success());
    }

    #[test]
    fn test_drain_counts_every_signal() {
        let (tx, rx) = bounded(3);
        for name in ["a", "b", "c"] {
            tx.send(PathBuf::from(name)).unwrap();
        }
        drop(tx);

        let mut seen = Vec::new();
        let mut callback: Option<ProgressCallback<'_>> =
            Some(Box::new(|done, total| seen.push((done, total))));
        drain_completions(&rx, 3, &mut callback);
        drop(callback);

        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("exploded");
        assert_eq!(panic_message(payload.as_ref()), "exploded");
        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(payload.as_ref()), "panic");
    }
}
