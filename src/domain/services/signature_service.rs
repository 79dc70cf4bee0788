//! Signature service
//!
//! Runs the per-file signing protocol against a provider session and
//! turns the outcome into a [`SignResult`], retrying failed attempts.
//!
//! One attempt:
//! 1. take the session's key and certificate
//! 2. take the algorithm pair resolved from the certificate
//! 3. hash the document
//! 4. create a detached signer, with a content timestamp for long-term
//!    batches
//! 5. append validation data (long-term only), falling back to the plain
//!    signer when that fails
//! 6. write an empty container bound to the certificate and append the
//!    signer to it
//! 7. read the container back

use super::provider_session::ProviderSession;
use super::retry::RetryPolicy;
use crate::domain::entities::{SignResult, SignTask, SignatureProfile, signature_path_for};
use crate::domain::repositories::{ProviderError, SigningProvider};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Errors that can end a single attempt
#[derive(Error, Debug)]
pub enum SignError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("I/O error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("Provider returned an empty {0}")]
    EmptyOutput(&'static str),

    #[error("Signing cancelled")]
    Cancelled,
}

impl SignError {
    fn io(path: &Path, source: io::Error) -> Self {
        SignError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Returns whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            SignError::Provider(e) => !e.is_fatal(),
            SignError::Io { .. } | SignError::EmptyOutput(_) => true,
            SignError::Cancelled => false,
        }
    }
}

/// A container written by one successful attempt
#[derive(Debug, Clone)]
pub struct SignedArtifact {
    /// Where the container was written
    pub output_path: PathBuf,
    /// Container bytes as read back from disk
    pub container: Vec<u8>,
    /// Profile actually applied
    pub profile: SignatureProfile,
}

/// Signs files one at a time against a shared provider session
pub struct SignatureService<P: SigningProvider> {
    session: Arc<ProviderSession<P>>,
    profile: SignatureProfile,
    retry: RetryPolicy,
}

impl<P: SigningProvider> SignatureService<P> {
    /// Creates a new signature service
    pub fn new(
        session: Arc<ProviderSession<P>>,
        profile: SignatureProfile,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            session,
            profile,
            retry,
        }
    }

    pub fn session(&self) -> &ProviderSession<P> {
        &self.session
    }

    pub fn profile(&self) -> SignatureProfile {
        self.profile
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Signs the task's file, retrying up to the policy's limit.
    ///
    /// Always returns a result and always posts the task's completion
    /// signal. A failed file leaves any existing container untouched and
    /// creates none.
    pub fn sign_file(&self, task: SignTask) -> SignResult {
        let start = Instant::now();
        let (file_path, output_dir, completion, cancellation) = task.into_parts();
        let output_path = signature_path_for(&file_path, output_dir.as_deref());
        let max_attempts = self.retry.max_attempts();

        let mut last_error = SignError::Cancelled;
        for attempt in 1..=max_attempts {
            if cancellation.is_cancelled() {
                last_error = SignError::Cancelled;
                break;
            }

            match self.sign_once(&file_path, &output_path) {
                Ok(artifact) => {
                    tracing::debug!(
                        file = %file_path.display(),
                        attempt,
                        profile = %artifact.profile,
                        bytes = artifact.container.len(),
                        "signed"
                    );
                    completion.complete();
                    return SignResult::signed(
                        file_path,
                        artifact.output_path,
                        artifact.profile,
                        start.elapsed(),
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        file = %file_path.display(),
                        attempt,
                        max_attempts,
                        error = %e,
                        "signing attempt failed"
                    );

                    let retryable = e.is_retryable();
                    last_error = e;
                    if !retryable || attempt == max_attempts {
                        break;
                    }
                    if !self.retry.wait_after(attempt, &cancellation) {
                        last_error = SignError::Cancelled;
                        break;
                    }
                }
            }
        }

        completion.complete();
        SignResult::failed(file_path, last_error.to_string(), start.elapsed())
    }

    /// Runs the protocol once for `file_path`, writing to `output_path`.
    ///
    /// The container is assembled next to `output_path` and only renamed
    /// over it once it has been read back.
    pub fn sign_once(
        &self,
        file_path: &Path,
        output_path: &Path,
    ) -> Result<SignedArtifact, SignError> {
        let staging = staging_path_for(output_path);
        let outcome = self.assemble(file_path, output_path, &staging);
        if outcome.is_err() {
            discard_partial(&staging);
        }
        outcome
    }

    fn assemble(
        &self,
        file_path: &Path,
        output_path: &Path,
        staging: &Path,
    ) -> Result<SignedArtifact, SignError> {
        let data = fs::read(file_path).map_err(|e| SignError::io(file_path, e))?;

        if let Some(parent) = output_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| SignError::io(parent, e))?;
        }

        let session = &*self.session;
        let profile = session.exclusive(|| -> Result<SignatureProfile, SignError> {
            let provider = session.provider();
            let algorithm = session.algorithm();
            let certificate = session.certificate();

            let digest = provider.hash(algorithm.hash_algorithm(), &data)?;
            if digest.is_empty() {
                return Err(SignError::EmptyOutput("digest"));
            }

            let signer = provider.create_signer(
                session.key(),
                algorithm,
                &digest,
                self.profile.is_long_term(),
            )?;
            if signer.is_empty() {
                return Err(SignError::EmptyOutput("signer"));
            }

            let (signer, profile) = self.with_validation_data(signer);

            provider.create_empty_signature_container(algorithm, certificate, staging)?;
            provider.append_signer_to_container(algorithm, &signer, certificate, staging)?;
            Ok(profile)
        })?;

        let container = fs::read(staging).map_err(|e| SignError::io(staging, e))?;
        if container.is_empty() {
            return Err(SignError::EmptyOutput("signature container"));
        }
        fs::rename(staging, output_path).map_err(|e| SignError::io(output_path, e))?;

        Ok(SignedArtifact {
            output_path: output_path.to_path_buf(),
            container,
            profile,
        })
    }

    /// Augments `signer` for long-term batches.
    ///
    /// Any augmentation failure keeps the plain signer and downgrades the
    /// attempt to the basic profile.
    fn with_validation_data(&self, signer: Vec<u8>) -> (Vec<u8>, SignatureProfile) {
        if !self.profile.is_long_term() {
            return (signer, SignatureProfile::Basic);
        }

        match self
            .session
            .provider()
            .append_validation_data(&signer, self.session.certificate())
        {
            Ok(augmented) if !augmented.is_empty() => (augmented, SignatureProfile::LongTerm),
            Ok(_) => {
                tracing::warn!("validation data came back empty, using basic signer");
                (signer, SignatureProfile::Basic)
            }
            Err(e) => {
                tracing::warn!(error = %e, "validation data unavailable, using basic signer");
                (signer, SignatureProfile::Basic)
            }
        }
    }
}

/// Sibling path a container is assembled under before it replaces `output`
fn staging_path_for(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn discard_partial(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "removed partial container"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not remove partial container")
        }
    }
}
