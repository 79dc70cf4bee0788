//! Pure-Rust signing provider
//!
//! Signs with RSA keys stored as PKCS#8 (PEM or DER, optionally
//! password-encrypted) and writes [`SignatureEnvelope`] containers. It has
//! no trust-service access, so long-term batches always fall back to
//! basic signatures.

use super::envelope::{SignatureEnvelope, SignerRecord};
use crate::domain::entities::{HashAlgorithm, KeyType, SignAlgorithm};
use crate::domain::repositories::{CertificateInfo, ProviderError, SigningProvider, codes};
use rsa::pkcs8::DecodePrivateKey;
use rsa::{BigUint, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use x509_parser::prelude::*;
use x509_parser::public_key::PublicKey;

/// Object identifier of DSTU 4145 public keys
const DSTU_4145_OID: &str = "1.2.804.2.1.1.1.1.3.1.1";

const SHA256_LEN: usize = 32;

/// A loaded RSA private key
#[derive(Debug, Clone)]
pub struct SoftwareKey {
    key: RsaPrivateKey,
}

impl SoftwareKey {
    pub fn public_key(&self) -> RsaPublicKey {
        self.key.to_public_key()
    }
}

/// Signing provider backed by the `rsa` and `x509-parser` crates
#[derive(Debug, Default, Clone)]
pub struct SoftwareProvider;

impl SoftwareProvider {
    pub fn new() -> Self {
        Self
    }
}

impl SigningProvider for SoftwareProvider {
    type Key = SoftwareKey;

    fn supports_algorithm(&self, algorithm: SignAlgorithm) -> bool {
        algorithm == SignAlgorithm::RsaWithSha256
    }

    fn load_private_key(
        &self,
        key_bytes: &[u8],
        password: &str,
    ) -> Result<SoftwareKey, ProviderError> {
        let key = match pem_text(key_bytes) {
            Some(pem) if pem.contains("ENCRYPTED PRIVATE KEY") => {
                RsaPrivateKey::from_pkcs8_encrypted_pem(pem, password.as_bytes())
            }
            Some(pem) => RsaPrivateKey::from_pkcs8_pem(pem),
            None if password.is_empty() => RsaPrivateKey::from_pkcs8_der(key_bytes),
            None => RsaPrivateKey::from_pkcs8_encrypted_der(key_bytes, password.as_bytes())
                .or_else(|_| RsaPrivateKey::from_pkcs8_der(key_bytes)),
        }
        .map_err(|e| {
            ProviderError::new(
                codes::INVALID_KEY,
                format!("cannot load private key: {}", e),
            )
        })?;

        tracing::debug!(bits = key_bits(&key), "private key loaded");
        Ok(SoftwareKey { key })
    }

    fn get_owning_certificate(&self, _key: &SoftwareKey) -> Result<Vec<u8>, ProviderError> {
        Err(ProviderError::new(
            codes::NO_CERTIFICATE,
            "PKCS#8 keys carry no certificate; configure a certificate file",
        ))
    }

    fn parse_certificate(&self, certificate: &[u8]) -> Result<CertificateInfo, ProviderError> {
        let der = certificate_der(certificate)?;
        let (_, cert) = parse_x509_certificate(&der).map_err(|e| {
            ProviderError::key_type(
                codes::INVALID_CERTIFICATE,
                format!("cannot parse certificate: {}", e),
            )
        })?;

        let spki = cert.public_key();
        let public_key_type = match spki.parsed() {
            Ok(PublicKey::RSA(_)) => KeyType::Rsa,
            Ok(PublicKey::EC(_)) => KeyType::Ecdsa,
            _ if spki.algorithm.algorithm.to_id_string() == DSTU_4145_OID => KeyType::Dstu4145,
            _ => KeyType::Other(0),
        };

        Ok(CertificateInfo {
            public_key_type,
            subject: cert.subject().to_string(),
            serial: hex::encode(cert.raw_serial()),
        })
    }

    fn hash(&self, algorithm: HashAlgorithm, data: &[u8]) -> Result<Vec<u8>, ProviderError> {
        match algorithm {
            HashAlgorithm::Sha256 => Ok(Sha256::digest(data).to_vec()),
            other => Err(unsupported_algorithm(other)),
        }
    }

    fn create_signer(
        &self,
        key: &SoftwareKey,
        algorithm: SignAlgorithm,
        digest: &[u8],
        include_timestamp: bool,
    ) -> Result<Vec<u8>, ProviderError> {
        if algorithm != SignAlgorithm::RsaWithSha256 {
            return Err(unsupported_algorithm(algorithm));
        }
        if digest.len() != SHA256_LEN {
            return Err(ProviderError::new(
                codes::SIGNING_FAILED,
                format!("expected a {}-byte digest, got {}", SHA256_LEN, digest.len()),
            ));
        }

        let signature = key
            .key
            .sign(Pkcs1v15Sign::new::<Sha256>(), digest)
            .map_err(|e| ProviderError::new(codes::SIGNING_FAILED, e.to_string()))?;

        let signing_time = include_timestamp.then(|| chrono::Utc::now().to_rfc3339());
        SignerRecord::new(algorithm, digest, &signature, signing_time).to_bytes()
    }

    fn append_validation_data(
        &self,
        _signer: &[u8],
        _certificate: &[u8],
    ) -> Result<Vec<u8>, ProviderError> {
        Err(ProviderError::new(
            codes::NO_TRUST_SERVICE,
            "no timestamp or revocation service configured",
        ))
    }

    fn create_empty_signature_container(
        &self,
        algorithm: SignAlgorithm,
        certificate: &[u8],
        path: &Path,
    ) -> Result<(), ProviderError> {
        let envelope = SignatureEnvelope::new(algorithm, &certificate_der(certificate)?);
        fs::write(path, envelope.to_bytes()?).map_err(|e| ProviderError::io(path, &e))
    }

    fn append_signer_to_container(
        &self,
        algorithm: SignAlgorithm,
        signer: &[u8],
        certificate: &[u8],
        path: &Path,
    ) -> Result<(), ProviderError> {
        let bytes = fs::read(path).map_err(|e| ProviderError::io(path, &e))?;
        let mut envelope = SignatureEnvelope::from_bytes(&bytes)?;

        if envelope.algorithm != algorithm {
            return Err(ProviderError::new(
                codes::INVALID_CONTAINER,
                format!("container algorithm {} does not match {}", envelope.algorithm, algorithm),
            ));
        }
        if envelope.certificate_der()? != certificate_der(certificate)? {
            return Err(ProviderError::new(
                codes::INVALID_CONTAINER,
                "container is bound to a different certificate",
            ));
        }

        envelope.signers.push(SignerRecord::from_bytes(signer)?);
        fs::write(path, envelope.to_bytes()?).map_err(|e| ProviderError::io(path, &e))
    }
}

/// Checks every signer of `container` against `document`.
///
/// Returns the number of signers verified; a container without signers
/// or with any bad signer is an error.
pub fn verify_container(container: &[u8], document: &[u8]) -> Result<usize, ProviderError> {
    let envelope = SignatureEnvelope::from_bytes(container)?;
    if envelope.signers.is_empty() {
        return Err(ProviderError::new(codes::INVALID_CONTAINER, "container has no signers"));
    }

    let der = envelope.certificate_der()?;
    let public_key = rsa_public_key(&der)?;
    let digest = Sha256::digest(document);

    for (i, record) in envelope.signers.iter().enumerate() {
        if record.digest_bytes()? != digest.as_slice() {
            return Err(ProviderError::new(
                codes::INVALID_CONTAINER,
                format!("signer {} covers a different document", i),
            ));
        }
        public_key
            .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, &record.signature_bytes()?)
            .map_err(|e| {
                ProviderError::new(codes::INVALID_CONTAINER, format!("signer {}: {}", i, e))
            })?;
    }

    Ok(envelope.signers.len())
}

fn rsa_public_key(der: &[u8]) -> Result<RsaPublicKey, ProviderError> {
    let (_, cert) = parse_x509_certificate(der).map_err(|e| {
        ProviderError::new(
            codes::INVALID_CERTIFICATE,
            format!("cannot parse certificate: {}", e),
        )
    })?;

    match cert.public_key().parsed() {
        Ok(PublicKey::RSA(rsa)) => RsaPublicKey::new(
            BigUint::from_bytes_be(rsa.modulus),
            BigUint::from_bytes_be(rsa.exponent),
        )
        .map_err(|e| ProviderError::new(codes::INVALID_CERTIFICATE, e.to_string())),
        _ => Err(ProviderError::key_type(
            codes::UNSUPPORTED_KEY_TYPE,
            "only RSA certificates can be verified",
        )),
    }
}

/// Returns DER bytes for a PEM or DER certificate
fn certificate_der(certificate: &[u8]) -> Result<Vec<u8>, ProviderError> {
    if pem_text(certificate).is_none() {
        return Ok(certificate.to_vec());
    }

    let (_, pem) = x509_parser::pem::parse_x509_pem(certificate).map_err(|e| {
        ProviderError::key_type(
            codes::INVALID_CERTIFICATE,
            format!("cannot decode PEM certificate: {}", e),
        )
    })?;
    Ok(pem.contents)
}

fn pem_text(bytes: &[u8]) -> Option<&str> {
    std::str::from_utf8(bytes)
        .ok()
        .filter(|text| text.trim_start().starts_with("-----BEGIN"))
}

fn key_bits(key: &RsaPrivateKey) -> usize {
    use rsa::traits::PublicKeyParts;
    key.n().bits()
}

fn unsupported_algorithm(algorithm: impl std::fmt::Display) -> ProviderError {
    ProviderError::key_type(
        codes::UNSUPPORTED_ALGORITHM,
        format!("{} is not supported by the software provider", algorithm),
    )
}
