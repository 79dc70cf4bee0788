//! Signing provider implementations

mod envelope;
mod software_provider;

pub use envelope::{ENVELOPE_FORMAT, MAX_ENVELOPE_SIZE, SignatureEnvelope, SignerRecord};
pub use software_provider::{SoftwareKey, SoftwareProvider, verify_container};
