//! opusrec - record raw PCM into Ogg Opus files.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{ConfigCommand, NormalizeCommand, RecordCommand};

/// opusrec - streaming Ogg Opus recorder.
///
/// Encodes 16-bit little-endian mono PCM at 16 kHz into Ogg Opus files
/// that standard players accept, and re-records headerless raw Opus packet
/// dumps the same way.
#[derive(Parser)]
#[command(name = "opusrec")]
#[command(about = "Record 16 kHz mono PCM into Ogg Opus files")]
#[command(version)]
pub struct Cli {
    /// Recorder config file (YAML)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Encode a raw PCM stream into an Ogg Opus file
    Record(RecordCommand),
    /// Re-record a file of fixed-size raw Opus packets
    Normalize(NormalizeCommand),
    /// Print the effective recorder configuration
    Config(ConfigCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Record(cmd) => cmd.run(&cli),
        Commands::Normalize(cmd) => cmd.run(&cli),
        Commands::Config(cmd) => cmd.run(&cli),
    }
}
