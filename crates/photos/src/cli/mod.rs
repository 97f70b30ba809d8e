//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the photos binary.

mod commands;
mod media;
mod run;

pub use commands::{Cli, Commands};
pub use media::{caption_latest, reread, stats, store_file};
pub use run::run_bot;
