//! CLI module

mod commands;
mod progress;

pub use commands::{Cli, Commands, PASSWORD_ENV, SignArgs};
pub use progress::ProgressReporter;
