//! Application errors
//!
//! Batch-level failures. Per-file failures never show up here; they are
//! reported as failed results instead.

use crate::domain::repositories::ProviderError;
use crate::infrastructure::scanning::ScanError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors in the signer configuration or the material it points to
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Cannot read key file {path}: {source}")]
    KeyFile { path: PathBuf, source: io::Error },

    #[error("Cannot read certificate file {path}: {source}")]
    CertificateFile { path: PathBuf, source: io::Error },

    #[error("Unsupported signing key: {0}")]
    UnsupportedKeyType(ProviderError),
}

/// Errors that abort a whole batch
#[derive(Error, Debug)]
pub enum BatchError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Cannot open signing session: {0}")]
    Provider(ProviderError),

    #[error("Cannot start signing workers: {0}")]
    WorkerSpawn(io::Error),
}

impl From<ProviderError> for BatchError {
    fn from(err: ProviderError) -> Self {
        if err.is_fatal() {
            BatchError::Config(ConfigError::UnsupportedKeyType(err))
        } else {
            BatchError::Provider(err)
        }
    }
}

impl BatchError {
    /// Returns true when the root folder itself could not be used
    pub fn is_root_error(&self) -> bool {
        matches!(self, BatchError::Scan(_))
    }
}
