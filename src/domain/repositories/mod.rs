//! Repository traits (interfaces)
//!
//! These traits define the contracts for the external collaborators of
//! the signer: the cryptographic provider and the signing ledger.

mod signing_ledger;
mod signing_provider;

pub use signing_ledger::{LedgerError, SigningLedger, ledger_relative_path};
pub use signing_provider::{
    CertificateInfo, ProviderError, ProviderErrorKind, SigningProvider, codes,
};
