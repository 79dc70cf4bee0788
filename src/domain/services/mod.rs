//! Domain services
//!
//! The signing protocol, its retry policy and the provider session it
//! runs against.

mod provider_session;
mod retry;
mod signature_service;

pub use provider_session::{ProviderSession, resolve_algorithm};
pub use retry::RetryPolicy;
pub use signature_service::{SignError, SignatureService, SignedArtifact};
