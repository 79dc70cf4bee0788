//! Infrastructure layer
//!
//! Concrete implementations of the domain repositories: the filesystem
//! scanner, the software signing provider and the JSON ledger.

pub mod persistence;
pub mod providers;
pub mod scanning;
