//! Signing provider trait
//!
//! Defines the narrow interface to the cryptographic library: key
//! loading, certificate handling, hashing, signer creation, validation
//! data and container assembly. The signer never touches key material or
//! container bytes directly.

use crate::domain::entities::{HashAlgorithm, KeyType, SignAlgorithm};
use std::io;
use std::path::Path;
use thiserror::Error;

/// Error codes used by the providers shipped with this crate.
///
/// Vendor libraries report their own codes; these only need to be
/// distinct from each other.
pub mod codes {
    pub const IO: u32 = 0x0001;
    pub const INVALID_KEY: u32 = 0x0010;
    pub const NO_CERTIFICATE: u32 = 0x0011;
    pub const INVALID_CERTIFICATE: u32 = 0x0012;
    pub const UNSUPPORTED_KEY_TYPE: u32 = 0x0013;
    pub const UNSUPPORTED_ALGORITHM: u32 = 0x0020;
    pub const SIGNING_FAILED: u32 = 0x0021;
    pub const NO_TRUST_SERVICE: u32 = 0x0030;
    pub const INVALID_CONTAINER: u32 = 0x0040;
}

/// How a provider failure should be treated by the signer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Library or network hiccup; worth another attempt
    Transient,
    /// Certificate/key-type resolution failed; fatal for the batch
    KeyType,
    /// File access failed inside the provider
    Io,
}

/// Error reported by a signing provider, carrying the library's code
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("provider error 0x{code:04x}: {message}")]
pub struct ProviderError {
    code: u32,
    message: String,
    kind: ProviderErrorKind,
}

impl ProviderError {
    /// Creates a transient (retryable) error
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            kind: ProviderErrorKind::Transient,
        }
    }

    /// Creates a key-type resolution error
    pub fn key_type(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            kind: ProviderErrorKind::KeyType,
        }
    }

    /// Creates an I/O error for `path`
    pub fn io(path: &Path, err: &io::Error) -> Self {
        Self {
            code: codes::IO,
            message: format!("{}: {}", path.display(), err),
            kind: ProviderErrorKind::Io,
        }
    }

    pub fn code(&self) -> u32 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> ProviderErrorKind {
        self.kind
    }

    /// Returns true for errors no retry can fix
    pub fn is_fatal(&self) -> bool {
        self.kind == ProviderErrorKind::KeyType
    }
}

/// What the signer needs to know about a certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateInfo {
    /// Public-key type, used to select algorithms
    pub public_key_type: KeyType,
    /// Subject distinguished name
    pub subject: String,
    /// Serial number as hex
    pub serial: String,
}

/// Trait for the cryptographic library behind the signer
///
/// One provider instance backs a whole batch. A provider whose native
/// handle cannot be used from several threads at once reports so through
/// [`SigningProvider::is_thread_safe`]; the signer then serialises every
/// attempt's call sequence.
///
/// # Example
///
/// ```ignore
/// let provider = SoftwareProvider::new();
/// let key = provider.load_private_key(&key_bytes, "password")?;
/// let info = provider.parse_certificate(&cert_bytes)?;
/// let algorithm = SignAlgorithm::for_key_type(info.public_key_type).unwrap();
/// let digest = provider.hash(algorithm.hash_algorithm(), &document)?;
/// let signer = provider.create_signer(&key, algorithm, &digest, true)?;
/// ```
pub trait SigningProvider: Send + Sync {
    /// Loaded private-key handle
    type Key: Send + Sync;

    /// Returns whether concurrent calls are safe
    fn is_thread_safe(&self) -> bool {
        true
    }

    /// Returns whether this provider can hash and sign with `algorithm`
    fn supports_algorithm(&self, _algorithm: SignAlgorithm) -> bool {
        true
    }

    /// Loads a private key from its serialized form
    fn load_private_key(&self, key_bytes: &[u8], password: &str)
    -> Result<Self::Key, ProviderError>;

    /// Returns the certificate that owns `key`
    fn get_owning_certificate(&self, key: &Self::Key) -> Result<Vec<u8>, ProviderError>;

    /// Parses a certificate
    fn parse_certificate(&self, certificate: &[u8]) -> Result<CertificateInfo, ProviderError>;

    /// Computes a digest of `data`
    fn hash(&self, algorithm: HashAlgorithm, data: &[u8]) -> Result<Vec<u8>, ProviderError>;

    /// Creates a detached signer over `digest`
    fn create_signer(
        &self,
        key: &Self::Key,
        algorithm: SignAlgorithm,
        digest: &[u8],
        include_timestamp: bool,
    ) -> Result<Vec<u8>, ProviderError>;

    /// Augments a signer with timestamp and revocation evidence
    fn append_validation_data(
        &self,
        signer: &[u8],
        certificate: &[u8],
    ) -> Result<Vec<u8>, ProviderError>;

    /// Writes an empty signature container bound to `certificate`
    fn create_empty_signature_container(
        &self,
        algorithm: SignAlgorithm,
        certificate: &[u8],
        path: &Path,
    ) -> Result<(), ProviderError>;

    /// Appends a signer to the container at `path`, in place
    fn append_signer_to_container(
        &self,
        algorithm: SignAlgorithm,
        signer: &[u8],
        certificate: &[u8],
        path: &Path,
    ) -> Result<(), ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_key_type_errors_are_fatal() {
        assert!(!ProviderError::new(codes::NO_TRUST_SERVICE, "tsp down").is_fatal());
        assert!(ProviderError::key_type(codes::UNSUPPORTED_KEY_TYPE, "ed25519").is_fatal());

        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = ProviderError::io(Path::new("x.p7s"), &io_err);
        assert_eq!(err.kind(), ProviderErrorKind::Io);
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_display_carries_code() {
        let err = ProviderError::new(0x30, "no service");
        assert_eq!(err.to_string(), "provider error 0x0030: no service");
    }
}
