//! Catalog inspection and removal commands.

use clap::Args;
use uuid::Uuid;

use super::view::{SongDetail, SongSummary};
use super::{open_catalog, output_result, print_success};
use crate::Cli;

/// List cataloged songs.
#[derive(Args)]
pub struct ListCommand {}

impl ListCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let (_, catalog) = open_catalog(cli)?;
        let library = catalog.library();

        let mut songs: Vec<SongSummary> = library.songs().map(|s| SongSummary::from(s.as_ref())).collect();
        songs.sort_by(|a, b| a.name.cmp(&b.name));
        output_result(cli, &songs)
    }
}

/// Show one song with its sound and beats.
#[derive(Args)]
pub struct ShowCommand {
    /// Song ID or name
    song: String,
}

impl ShowCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let (_, catalog) = open_catalog(cli)?;
        let song = catalog.find(&self.song)?;
        let attempts = catalog.library().attempts_for(&song.id).count();
        output_result(cli, &SongDetail::new(&song, attempts))
    }
}

/// Delete a song, its stored data and its attempts.
#[derive(Args)]
pub struct DeleteCommand {
    /// Song ID
    id: Uuid,
}

impl DeleteCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let (_, catalog) = open_catalog(cli)?;
        if !catalog.delete_song(&self.id)? {
            anyhow::bail!("song {} not found", self.id);
        }
        print_success(&format!("Song {} deleted", self.id));
        Ok(())
    }
}
