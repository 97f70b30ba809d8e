//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Photos - chat bot keeping a rolling, captioned photo collection
#[derive(Parser, Debug)]
#[command(name = "photos")]
#[command(about = "Chat bot keeping a rolling, captioned photo collection", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, value_name = "PATH")]
    pub config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the bot over events recorded as JSON lines
    Run {
        /// Event file, one JSON event per line
        #[arg(long, value_name = "JSONL")]
        events: PathBuf,
    },

    /// Store a local file as if it had been received
    Store {
        /// File to store
        file: PathBuf,

        /// Name to store it under (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Burn a caption into the most recently stored file
    Caption {
        /// Caption text
        text: String,
    },

    /// Rebuild the ledgers from the media directory
    Reread,

    /// Show free disk space
    Stats,
}
