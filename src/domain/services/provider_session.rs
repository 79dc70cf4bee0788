//! Provider session
//!
//! Holds what a batch loads once and every worker shares read-only: the
//! provider itself, the private key, the signing certificate and the
//! algorithm pair derived from it.

use crate::domain::entities::{HashAlgorithm, SignAlgorithm};
use crate::domain::repositories::{CertificateInfo, ProviderError, SigningProvider, codes};
use parking_lot::Mutex;
use std::sync::Arc;

/// A loaded key and certificate bound to one provider
///
/// The session must outlive every worker of the batch; workers hold it
/// through an `Arc`, so it cannot be torn down while they run.
pub struct ProviderSession<P: SigningProvider> {
    provider: Arc<P>,
    key: P::Key,
    certificate: Vec<u8>,
    certificate_info: CertificateInfo,
    algorithm: SignAlgorithm,
    call_lock: Option<Mutex<()>>,
}

impl<P: SigningProvider> ProviderSession<P> {
    /// Opens a session.
    ///
    /// An explicit certificate wins over the one the key carries. Fails
    /// with a fatal key-type error when the certificate's public key has
    /// no supported algorithm or the provider cannot sign with it.
    pub fn open(
        provider: Arc<P>,
        key_bytes: &[u8],
        password: &str,
        certificate: Option<Vec<u8>>,
    ) -> Result<Self, ProviderError> {
        let key = provider.load_private_key(key_bytes, password)?;

        let certificate = match certificate {
            Some(cert) => cert,
            None => provider.get_owning_certificate(&key)?,
        };
        if certificate.is_empty() {
            return Err(ProviderError::key_type(
                codes::NO_CERTIFICATE,
                "provider returned an empty certificate",
            ));
        }

        let certificate_info = provider.parse_certificate(&certificate)?;
        let algorithm = resolve_algorithm(&certificate_info)?;
        if !provider.supports_algorithm(algorithm) {
            return Err(ProviderError::key_type(
                codes::UNSUPPORTED_ALGORITHM,
                format!("provider cannot sign with {}", algorithm),
            ));
        }

        let call_lock = if provider.is_thread_safe() {
            None
        } else {
            Some(Mutex::new(()))
        };

        tracing::info!(
            subject = %certificate_info.subject,
            algorithm = %algorithm,
            serialized = call_lock.is_some(),
            "signing session opened"
        );

        Ok(Self {
            provider,
            key,
            certificate,
            certificate_info,
            algorithm,
            call_lock,
        })
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn key(&self) -> &P::Key {
        &self.key
    }

    /// Returns the signing certificate bytes
    pub fn certificate(&self) -> &[u8] {
        &self.certificate
    }

    pub fn certificate_info(&self) -> &CertificateInfo {
        &self.certificate_info
    }

    pub fn algorithm(&self) -> SignAlgorithm {
        self.algorithm
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.algorithm.hash_algorithm()
    }

    /// Returns whether provider calls are serialised
    pub fn is_serialized(&self) -> bool {
        self.call_lock.is_some()
    }

    /// Runs `f` with exclusive access to the provider when it is not
    /// thread-safe, and directly otherwise.
    pub fn exclusive<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.call_lock.as_ref().map(|lock| lock.lock());
        f()
    }
}

/// Selects the algorithm pair for a parsed certificate.
///
/// Unsupported key types are a fatal configuration error.
pub fn resolve_algorithm(info: &CertificateInfo) -> Result<SignAlgorithm, ProviderError> {
    SignAlgorithm::for_key_type(info.public_key_type).ok_or_else(|| {
        ProviderError::key_type(
            codes::UNSUPPORTED_KEY_TYPE,
            format!("unsupported key type in certificate: {}", info.public_key_type),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::KeyType;

    fn info(key_type: KeyType) -> CertificateInfo {
        CertificateInfo {
            public_key_type: key_type,
            subject: "CN=test".to_string(),
            serial: "01".to_string(),
        }
    }

    #[test]
    fn test_resolve_supported_types() {
        assert_eq!(
            resolve_algorithm(&info(KeyType::Rsa)).unwrap(),
            SignAlgorithm::RsaWithSha256
        );
        assert_eq!(
            resolve_algorithm(&info(KeyType::Dstu4145)).unwrap(),
            SignAlgorithm::Dstu4145WithDstu7564
        );
    }

    #[test]
    fn test_resolve_unsupported_type_is_fatal() {
        let err = resolve_algorithm(&info(KeyType::Other(7))).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.code(), codes::UNSUPPORTED_KEY_TYPE);
    }
}
