use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use orbgame::cli;
use orbgame::config::OrbConfig;
use orbgame::content::Epoch;
use orbgame::server;

#[derive(Parser)]
#[command(name = "orbgame", version, about = "Orb Game story backend")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server
    Serve,
    /// Top up the story cache (all epochs, or one with --epoch)
    Preload {
        /// Only preload this epoch
        #[arg(long)]
        epoch: Option<Epoch>,
        /// Re-attempt TTS for stories without audio
        #[arg(long)]
        repair_audio: bool,
    },
    /// Check store invariants; exits non-zero on violations
    Verify,
    /// Print cache coverage and usage statistics
    Stats,
    /// Import figure image metadata from a JSON file
    ImportImages { file: PathBuf },
    /// Import figure seeds from a JSON file
    ImportSeeds { file: PathBuf },
    /// Delete stories older than the given number of days
    ClearOld {
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = OrbConfig::load()?;

    // Initialize tracing with the configured log level, to stderr.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => {
            server::serve(config).await?;
        }
        Command::Preload {
            epoch,
            repair_audio,
        } => {
            cli::preload::run(&config, epoch, repair_audio).await?;
        }
        Command::Verify => {
            let violations = cli::verify::run(&config)?;
            if violations > 0 {
                std::process::exit(1);
            }
        }
        Command::Stats => {
            cli::stats::run(&config)?;
        }
        Command::ImportImages { file } => {
            cli::import::run_images(&config, &file)?;
        }
        Command::ImportSeeds { file } => {
            cli::import::run_seeds(&config, &file)?;
        }
        Command::ClearOld { days } => {
            cli::clear_old::run(&config, days)?;
        }
    }

    Ok(())
}
