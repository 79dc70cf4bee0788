//! Batch signer
//!
//! Entry point for callers: scans a folder, opens a provider session
//! with the configured key and signs everything found.

use crate::application::batch_orchestrator::{BatchOrchestrator, ProgressCallback};
use crate::application::dto::SignerConfig;
use crate::application::error::{BatchError, ConfigError};
use crate::domain::entities::{CancellationToken, SignResult};
use crate::domain::repositories::{SigningLedger, SigningProvider};
use crate::domain::services::{ProviderSession, SignatureService};
use crate::infrastructure::scanning::{FileScanner, ScanError};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Signs folders of documents with one key and one provider
pub struct BatchSigner<P: SigningProvider + 'static> {
    config: SignerConfig,
    provider: Arc<P>,
    ledger: Option<Arc<dyn SigningLedger>>,
    cancellation: CancellationToken,
}

impl<P: SigningProvider + 'static> BatchSigner<P> {
    /// Creates a signer after validating `config`
    pub fn new(config: SignerConfig, provider: Arc<P>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            provider,
            ledger: None,
            cancellation: CancellationToken::new(),
        })
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

    pub fn config(&self) -> &SignerConfig {
        &self.config
    }

    /// Returns the token that stops running batches between attempts
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Lists the unsigned documents under `root_folder` without signing
    pub fn find_documents_to_sign(
        &self,
        root_folder: &Path,
        extensions: &[String],
    ) -> Result<Vec<PathBuf>, ScanError> {
        let scanner = if extensions.is_empty() {
            self.scanner()
        } else {
            FileScanner::new(extensions).with_max_depth(self.config.max_scan_depth)
        };
        scanner.find_unsigned_files(root_folder)
    }

    /// Signs every unsigned document under `root_folder`.
    ///
    /// Returns one result per document. The key is only loaded when
    /// there is something to sign.
    pub fn sign_documents_batch(
        &self,
        root_folder: &Path,
        key_password: &str,
        output_base_dir: Option<&Path>,
        on_progress: Option<ProgressCallback<'_>>,
    ) -> Result<Vec<SignResult>, BatchError> {
        let scanner = self.scanner();
        let report = scanner.scan(root_folder)?;
        if report.is_empty() {
            tracing::info!(root = %root_folder.display(), "nothing to sign");
            return Ok(Vec::new());
        }
        tracing::debug!("{}", report.summary());

        let session = Arc::new(self.open_session(key_password)?);
        let service = Arc::new(SignatureService::new(
            session,
            self.config.signature_profile,
            self.config.retry_policy(),
        ));

        let mut orchestrator = BatchOrchestrator::new(service, scanner, self.config.max_workers)
            .with_cancellation(self.cancellation.clone());
        if let Some(ledger) = &self.ledger {
            orchestrator = orchestrator.with_ledger(Arc::clone(ledger));
        }

        orchestrator.process_report(root_folder, report, output_base_dir, on_progress)
    }

    fn scanner(&self) -> FileScanner {
        FileScanner::new(&self.config.extensions).with_max_depth(self.config.max_scan_depth)
    }

    /// Loads the configured key and certificate into a provider session
    pub fn open_session(&self, key_password: &str) -> Result<ProviderSession<P>, BatchError> {
        let key_path = &self.config.key_file_path;
        let key_bytes = fs::read(key_path).map_err(|source| ConfigError::KeyFile {
            path: key_path.clone(),
            source,
        })?;

        let certificate = match &self.config.cert_file_path {
            Some(path) => Some(fs::read(path).map_err(|source| ConfigError::CertificateFile {
                path: path.clone(),
                source,
            })?),
            None => None,
        };

        Ok(ProviderSession::open(
            Arc::clone(&self.provider),
            &key_bytes,
            key_password,
            certificate,
        )?)
    }
}
