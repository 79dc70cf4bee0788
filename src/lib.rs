//! Batch signing of documents with detached long-term signatures.
//!
//! Layers:
//! - [`domain`]: tasks, results, the signing protocol and the collaborator
//!   traits it runs against
//! - [`application`]: the batch orchestrator, the public [`BatchSigner`]
//!   and its configuration
//! - [`infrastructure`]: filesystem scanning, a software signing provider
//!   and a JSON ledger
//! - [`presentation`]: the `cades-batch` command line

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use application::dto::{BatchSummary, SignerConfig};
pub use application::{BatchError, BatchSigner, ConfigError, ProgressCallback};
pub use domain::entities::{CancellationToken, SignResult, SignatureProfile};
pub use domain::repositories::{ProviderError, SigningLedger, SigningProvider};
pub use infrastructure::scanning::{ScanError, find_unsigned_files, remove_signatures};
