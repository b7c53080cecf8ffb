//! Song ingestion command.

use std::path::PathBuf;

use clap::Args;

use super::view::SongDetail;
use super::{HAS_ENCODER, open_catalog, output_result, print_success, resolve_bit_rate};
use crate::Cli;

/// Compress a stereo WAV file into a new song.
///
/// The file is decoded, analyzed for beats and compressed in one pass.
/// Adding a name that is already cataloged returns the existing song.
#[derive(Args)]
pub struct AddCommand {
    /// Path to a stereo WAV file
    wav: PathBuf,

    /// Song name (default: file stem)
    #[arg(long)]
    name: Option<String>,

    /// Target bitrate: 320, 256 or 128 (default from config)
    #[arg(long)]
    bit_rate: Option<String>,

    /// Lowest expected tempo in beats per minute
    #[arg(long)]
    min_bpm: Option<f32>,

    /// Highest expected tempo, at most twice --min-bpm
    #[arg(long)]
    max_bpm: Option<f32>,
}

impl AddCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        if !HAS_ENCODER {
            anyhow::bail!("this build has no frame encoder; rebuild beatvault with --features opus");
        }

        let name = match &self.name {
            Some(name) => name.clone(),
            None => self
                .wav
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
                .ok_or_else(|| anyhow::anyhow!("cannot derive a name from {}, use --name", self.wav.display()))?,
        };

        let (cfg, catalog) = open_catalog(cli)?;
        let bit_rate = resolve_bit_rate(&cfg, self.bit_rate.as_deref())?;
        let min_bpm = self.min_bpm.unwrap_or(cfg.min_bpm);
        let max_bpm = self.max_bpm.unwrap_or(cfg.max_bpm);

        tracing::debug!(%name, %bit_rate, min_bpm, max_bpm, "adding song");
        let song = catalog.add_song(&name, &self.wav, bit_rate, min_bpm, max_bpm)?;

        print_success(&format!("Song \"{}\" cataloged as {}", song.name, song.id));
        let attempts = catalog.library().attempts_for(&song.id).count();
        output_result(cli, &SongDetail::new(&song, attempts))
    }
}
