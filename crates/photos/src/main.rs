//! Photos CLI binary.
//!
//! This binary runs the photos bot and its media maintenance commands:
//! - Replay recorded chat events through the bot
//! - Store and caption files by hand
//! - Rebuild ledgers and report disk space

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, caption_latest, reread, run_bot, stats, store_file};

    // Load .env so RUST_LOG can live next to the config
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Configuration errors abort before anything else happens
    let config = photos::BotConfig::from_file(&cli.config)?;
    photos::init_logging(config.logging(), cli.verbose)?;
    tracing::info!(config = %cli.config.display(), "Starting photos");

    match cli.command {
        Commands::Run { events } => {
            run_bot(config, &events).await?;
        }

        Commands::Store { file, name } => {
            store_file(config.storage().clone(), &file, name.as_deref()).await?;
        }

        Commands::Caption { text } => {
            caption_latest(config.storage().clone(), &text).await?;
        }

        Commands::Reread => {
            reread(config.storage().clone()).await?;
        }

        Commands::Stats => {
            stats(config.storage().clone())?;
        }
    }

    Ok(())
}
