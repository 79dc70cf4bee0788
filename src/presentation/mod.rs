//! Presentation layer
//!
//! User-facing command line interface.

pub mod cli;
