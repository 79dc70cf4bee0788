//! Domain layer - Core business logic
//!
//! This module contains the signing entities, the traits of the external
//! collaborators (signing provider, signing ledger) and the signature
//! service that runs the per-file protocol.

pub mod entities;
pub mod repositories;
pub mod services;
