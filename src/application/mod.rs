//! Application layer
//!
//! Batch use cases that orchestrate the domain services: the public
//! batch signer and the worker-pool orchestrator behind it.

mod batch_orchestrator;
mod batch_signer;
pub mod dto;
mod error;

pub use batch_orchestrator::{BatchOrchestrator, PROGRESS_POLL_INTERVAL, ProgressCallback};
pub use batch_signer::BatchSigner;
pub use error::{BatchError, ConfigError};
