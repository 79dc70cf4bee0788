//! Key and algorithm identifiers
//!
//! Maps the public-key type found in a signing certificate onto the
//! signature/hash algorithm pair the provider has to use for it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Public-key type reported by a parsed certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    /// Elliptic-curve key (ECDSA)
    Ecdsa,
    /// RSA key
    Rsa,
    /// DSTU 4145 national-curve key
    Dstu4145,
    /// Anything else, carrying the provider's raw type code
    Other(u32),
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyType::Ecdsa => write!(f, "ECDSA"),
            KeyType::Rsa => write!(f, "RSA"),
            KeyType::Dstu4145 => write!(f, "DSTU 4145"),
            KeyType::Other(code) => write!(f, "unknown key type ({})", code),
        }
    }
}

/// Digest algorithms a provider can compute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256
    Sha256,
    /// DSTU 7564 with a 256-bit output
    Dstu7564,
}

impl HashAlgorithm {
    /// Returns a human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "SHA-256",
            HashAlgorithm::Dstu7564 => "DSTU 7564-256",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Signature algorithms, each tied to exactly one hash algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignAlgorithm {
    /// ECDSA over a SHA-256 digest
    EcdsaWithSha256,
    /// RSA over a SHA-256 digest
    RsaWithSha256,
    /// DSTU 4145 over a DSTU 7564 digest
    Dstu4145WithDstu7564,
}

impl SignAlgorithm {
    /// Selects the algorithm for a certificate's key type.
    ///
    /// Returns `None` for key types the signer cannot handle; callers
    /// treat that as a fatal configuration error.
    pub fn for_key_type(key_type: KeyType) -> Option<Self> {
        match key_type {
            KeyType::Ecdsa => Some(SignAlgorithm::EcdsaWithSha256),
            KeyType::Rsa => Some(SignAlgorithm::RsaWithSha256),
            KeyType::Dstu4145 => Some(SignAlgorithm::Dstu4145WithDstu7564),
            KeyType::Other(_) => None,
        }
    }

    /// Returns the hash algorithm paired with this signature algorithm
    pub fn hash_algorithm(&self) -> HashAlgorithm {
        match self {
            SignAlgorithm::EcdsaWithSha256 | SignAlgorithm::RsaWithSha256 => HashAlgorithm::Sha256,
            SignAlgorithm::Dstu4145WithDstu7564 => HashAlgorithm::Dstu7564,
        }
    }

    /// Returns a human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            SignAlgorithm::EcdsaWithSha256 => "ECDSA with SHA-256",
            SignAlgorithm::RsaWithSha256 => "RSA with SHA-256",
            SignAlgorithm::Dstu4145WithDstu7564 => "DSTU 4145 with DSTU 7564",
        }
    }
}

impl fmt::Display for SignAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Signature profile applied to a whole batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureProfile {
    /// Signer augmented with timestamp and revocation evidence
    #[default]
    LongTerm,
    /// Plain signer without validation data
    Basic,
}

impl SignatureProfile {
    #[inline]
    pub fn is_long_term(self) -> bool {
        matches!(self, Self::LongTerm)
    }
}

impl fmt::Display for SignatureProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureProfile::LongTerm => write!(f, "long-term"),
            SignatureProfile::Basic => write!(f, "basic"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_pairs() {
        let ecdsa = SignAlgorithm::for_key_type(KeyType::Ecdsa).unwrap();
        assert_eq!(ecdsa.hash_algorithm(), HashAlgorithm::Sha256);

        let rsa = SignAlgorithm::for_key_type(KeyType::Rsa).unwrap();
        assert_eq!(rsa, SignAlgorithm::RsaWithSha256);
        assert_eq!(rsa.hash_algorithm(), HashAlgorithm::Sha256);

        let dstu = SignAlgorithm::for_key_type(KeyType::Dstu4145).unwrap();
        assert_eq!(dstu.hash_algorithm(), HashAlgorithm::Dstu7564);
    }

    #[test]
    fn test_unknown_key_type_has_no_algorithm() {
        assert!(SignAlgorithm::for_key_type(KeyType::Other(99)).is_none());
    }

    #[test]
    fn test_profile_default_is_long_term() {
        assert!(SignatureProfile::default().is_long_term());
        assert!(!SignatureProfile::Basic.is_long_term());
    }
}
