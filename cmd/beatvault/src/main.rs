//! Beatvault CLI - ingest waveform files into a song catalog.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{
    AddCommand, AttemptCommand, ConfigCommand, DeleteCommand, HistoryCommand, ListCommand,
    PacketsCommand, PreviewCommand, ShowCommand,
};

/// Beatvault CLI - a command line interface for the song catalog.
///
/// Songs are decoded from stereo WAV files, analyzed for beats, compressed
/// frame by frame and stored in a content store together with the catalog
/// of songs and play attempts.
///
/// Configuration is stored in ~/.beatvault/beatvault/config.yaml.
#[derive(Parser)]
#[command(name = "beatvault")]
#[command(about = "Song catalog CLI tool")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.beatvault/beatvault/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compress a WAV file into a new song
    Add(AddCommand),
    /// List cataloged songs
    List(ListCommand),
    /// Show one song with its beats
    Show(ShowCommand),
    /// Record a play attempt
    Attempt(AttemptCommand),
    /// List recorded play attempts
    History(HistoryCommand),
    /// Delete a song and its data
    Delete(DeleteCommand),
    /// Walk the stored packet stream of a song
    Packets(PacketsCommand),
    /// Decode a WAV file without compressing it
    Preview(PreviewCommand),
    /// Manage CLI configuration
    Config(ConfigCommand),
}

fn init_logging(cli: &Cli) {
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        let fallback = commands::get_config(cli)
            .map(|cfg| cfg.log_level)
            .unwrap_or_else(|_| "info".to_string());
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    match &cli.command {
        Commands::Add(cmd) => cmd.run(&cli),
        Commands::List(cmd) => cmd.run(&cli),
        Commands::Show(cmd) => cmd.run(&cli),
        Commands::Attempt(cmd) => cmd.run(&cli),
        Commands::History(cmd) => cmd.run(&cli),
        Commands::Delete(cmd) => cmd.run(&cli),
        Commands::Packets(cmd) => cmd.run(&cli),
        Commands::Preview(cmd) => cmd.run(&cli),
        Commands::Config(cmd) => cmd.run(&cli),
    }
}
