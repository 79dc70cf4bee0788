//! Signer configuration DTO

use crate::application::error::ConfigError;
use crate::domain::entities::{SignatureProfile, normalize_extension};
use crate::domain::services::RetryPolicy;
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(10);
const DEFAULT_MAX_WORKERS: usize = 10;
const DEFAULT_MAX_SCAN_DEPTH: usize = 64;
const DEFAULT_EXTENSIONS: [&str; 2] = [".pdf", ".xml"];

/// Batch-wide signer configuration.
///
/// Built once per run and shared read-only by every worker.
///
/// ```toml
/// key_file_path = "keys/signer.pem"
/// cert_file_path = "keys/signer.crt"
/// signature_profile = "long_term"
/// max_attempts = 3
/// retry_delay_secs = 10
/// max_workers = 8
/// extensions = [".pdf", ".xml"]
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SignerConfig {
    /// Private key file
    pub key_file_path: PathBuf,
    /// Certificate file; when absent the key's own certificate is used
    #[serde(default)]
    pub cert_file_path: Option<PathBuf>,
    /// Long-term or basic signatures
    #[serde(default)]
    pub signature_profile: SignatureProfile,
    /// Attempts per file before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base of the linear backoff between attempts
    #[serde(
        default = "default_retry_delay",
        rename = "retry_delay_secs",
        deserialize_with = "deserialize_secs"
    )]
    pub retry_delay_base: Duration,
    /// Size of the worker pool
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// Document extensions to sign
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Deepest directory level the scanner descends to
    #[serde(default = "default_max_scan_depth")]
    pub max_scan_depth: usize,
}

impl SignerConfig {
    /// Creates a configuration with defaults for everything but the key
    pub fn new(key_file_path: impl Into<PathBuf>) -> Self {
        Self {
            key_file_path: key_file_path.into(),
            cert_file_path: None,
            signature_profile: SignatureProfile::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_base: DEFAULT_RETRY_DELAY,
            max_workers: DEFAULT_MAX_WORKERS,
            extensions: default_extensions(),
            max_scan_depth: DEFAULT_MAX_SCAN_DEPTH,
        }
    }

    /// Loads a configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parses a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the certificate file
    pub fn with_certificate(mut self, path: impl Into<PathBuf>) -> Self {
        self.cert_file_path = Some(path.into());
        self
    }

    /// Sets the signature profile
    pub fn with_profile(mut self, profile: SignatureProfile) -> Self {
        self.signature_profile = profile;
        self
    }

    /// Sets the retry policy
    pub fn with_retry(mut self, max_attempts: u32, delay_base: Duration) -> Self {
        self.max_attempts = max_attempts;
        self.retry_delay_base = delay_base;
        self
    }

    /// Sets the worker pool size
    pub fn with_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Sets the document extensions
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Checks the values a batch cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_workers",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_scan_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_scan_depth",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.normalized_extensions().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "extensions",
                reason: "at least one extension is required".to_string(),
            });
        }
        Ok(())
    }

    /// Returns the extensions lowercased, dot-prefixed and deduplicated
    pub fn normalized_extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self
            .extensions
            .iter()
            .filter_map(|ext| normalize_extension(ext))
            .collect();
        extensions.sort();
        extensions.dedup();
        extensions
    }

    /// Returns the retry policy described by this configuration
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.retry_delay_base)
    }
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_retry_delay() -> Duration {
    DEFAULT_RETRY_DELAY
}

fn default_max_workers() -> usize {
    DEFAULT_MAX_WORKERS
}

fn default_max_scan_depth() -> usize {
    DEFAULT_MAX_SCAN_DEPTH
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect()
}

/// Converts a configured number of seconds into a retry delay
pub fn retry_delay_from_secs(secs: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs).map_err(|e| ConfigError::InvalidValue {
        field: "retry_delay_secs",
        reason: format!("{} is not a usable number of seconds: {}", secs, e),
    })
}

fn deserialize_secs<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?;
    retry_delay_from_secs(secs).map_err(serde::de::Error::custom)
}
