//! Detached signature container format of the software provider
//!
//! A JSON document holding the signing certificate and one record per
//! signer:
//!
//! ```json
//! {
//!   "format": "cades-batch/1",
//!   "algorithm": "rsa_with_sha256",
//!   "certificate": "MIID...",
//!   "signers": [
//!     { "algorithm": "rsa_with_sha256", "digest": "9f86d0...", "signature": "Kx1...",
//!       "signing_time": "2026-10-18T09:12:44+00:00" }
//!   ]
//! }
//! ```

use crate::domain::entities::SignAlgorithm;
use crate::domain::repositories::{ProviderError, codes};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Format tag written into every container
pub const ENVELOPE_FORMAT: &str = "cades-batch/1";

/// Largest container the parser accepts
pub const MAX_ENVELOPE_SIZE: usize = 16 * 1024 * 1024;

/// One signature over a document digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerRecord {
    pub algorithm: SignAlgorithm,
    /// Hex digest of the signed document
    pub digest: String,
    /// Base64 raw signature
    pub signature: String,
    /// RFC 3339 signing time, present for long-term signers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_time: Option<String>,
}

impl SignerRecord {
    /// Creates a record from raw digest and signature bytes
    pub fn new(
        algorithm: SignAlgorithm,
        digest: &[u8],
        signature: &[u8],
        signing_time: Option<String>,
    ) -> Self {
        Self {
            algorithm,
            digest: hex::encode(digest),
            signature: STANDARD.encode(signature),
            signing_time,
        }
    }

    /// Parses a record produced by [`SignerRecord::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProviderError> {
        serde_json::from_slice(bytes).map_err(|e| invalid(format!("malformed signer: {}", e)))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ProviderError> {
        serde_json::to_vec(self)
            .map_err(|e| ProviderError::new(codes::SIGNING_FAILED, e.to_string()))
    }

    pub fn digest_bytes(&self) -> Result<Vec<u8>, ProviderError> {
        hex::decode(&self.digest).map_err(|e| invalid(format!("bad signer digest: {}", e)))
    }

    pub fn signature_bytes(&self) -> Result<Vec<u8>, ProviderError> {
        STANDARD
            .decode(&self.signature)
            .map_err(|e| invalid(format!("bad signer signature: {}", e)))
    }
}

/// A detached signature container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEnvelope {
    pub format: String,
    pub algorithm: SignAlgorithm,
    /// Base64 DER certificate
    pub certificate: String,
    #[serde(default)]
    pub signers: Vec<SignerRecord>,
}

impl SignatureEnvelope {
    /// Creates an empty container bound to a DER certificate
    pub fn new(algorithm: SignAlgorithm, certificate_der: &[u8]) -> Self {
        Self {
            format: ENVELOPE_FORMAT.to_string(),
            algorithm,
            certificate: STANDARD.encode(certificate_der),
            signers: Vec::new(),
        }
    }

    /// Parses and checks a container
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProviderError> {
        if bytes.len() > MAX_ENVELOPE_SIZE {
            return Err(invalid(format!("container too large: {} bytes", bytes.len())));
        }

        let envelope: Self = serde_json::from_slice(bytes)
            .map_err(|e| invalid(format!("malformed container: {}", e)))?;
        if envelope.format != ENVELOPE_FORMAT {
            return Err(invalid(format!("unknown container format: {}", envelope.format)));
        }
        Ok(envelope)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ProviderError> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| ProviderError::new(codes::INVALID_CONTAINER, e.to_string()))
    }

    pub fn certificate_der(&self) -> Result<Vec<u8>, ProviderError> {
        STANDARD
            .decode(&self.certificate)
            .map_err(|e| invalid(format!("bad container certificate: {}", e)))
    }
}

fn invalid(message: String) -> ProviderError {
    ProviderError::new(codes::INVALID_CONTAINER, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signer_record_encoding() {
        let record = SignerRecord::new(SignAlgorithm::RsaWithSha256, &[0xab, 0xcd], b"sig", None);
        assert_eq!(record.digest, "abcd");
        assert_eq!(record.signature_bytes().unwrap(), b"sig");

        let parsed = SignerRecord::from_bytes(&record.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed, record);
        assert!(!String::from_utf8(record.to_bytes().unwrap()).unwrap().contains("signing_time"));
    }

    #[test]
    fn test_rejects_foreign_format() {
        let bytes = br#"{"format":"other","algorithm":"rsa_with_sha256","certificate":""}"#;
        let err = SignatureEnvelope::from_bytes(bytes).unwrap_err();
        assert_eq!(err.code(), codes::INVALID_CONTAINER);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(SignatureEnvelope::from_bytes(b"\x00\x01not json").is_err());
        assert!(SignatureEnvelope::from_bytes(b"").is_err());
    }

    #[test]
    fn test_missing_signers_defaults_to_empty() {
        let bytes =
            br#"{"format":"cades-batch/1","algorithm":"rsa_with_sha256","certificate":"AAEC"}"#;
        let envelope = SignatureEnvelope::from_bytes(bytes).unwrap();
        assert!(envelope.signers.is_empty());
        assert_eq!(envelope.certificate_der().unwrap(), vec![0, 1, 2]);
    }
}
