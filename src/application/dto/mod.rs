//! Data Transfer Objects

mod batch_summary;
mod signer_config;

pub use batch_summary::BatchSummary;
pub use signer_config::{SignerConfig, retry_delay_from_secs};
