//! Play attempt commands.

use std::time::Duration;

use beatvault_songs::SongAttempt;
use clap::Args;

use super::view::AttemptView;
use super::{open_catalog, output_result, print_success};
use crate::Cli;

/// Record a play attempt of a cataloged song.
#[derive(Args)]
pub struct AttemptCommand {
    /// Song ID or name
    song: String,

    /// Final score
    #[arg(long)]
    score: i64,

    /// How long the attempt lasted, in milliseconds
    #[arg(long)]
    length_ms: u64,

    /// The attempt ended in failure
    #[arg(long)]
    failed: bool,

    /// Zombies killed during the attempt
    #[arg(long, default_value_t = 0)]
    zombies: i32,
}

impl AttemptCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let (_, catalog) = open_catalog(cli)?;
        let song = catalog.find(&self.song)?;

        let attempt = SongAttempt::new(
            song.id,
            Duration::from_millis(self.length_ms),
            self.score,
            self.failed,
            self.zombies,
        );
        let view = AttemptView::new(&attempt, Some(&song));
        catalog.record_attempt(attempt)?;

        print_success(&format!("Attempt recorded for \"{}\"", song.name));
        output_result(cli, &view)
    }
}

/// List recorded play attempts, oldest first.
#[derive(Args)]
pub struct HistoryCommand {
    /// Only attempts of this song (ID or name)
    #[arg(long)]
    song: Option<String>,
}

impl HistoryCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let (_, catalog) = open_catalog(cli)?;
        let library = catalog.library();

        let filter = match &self.song {
            Some(key) => Some(catalog.find(key)?.id),
            None => None,
        };

        let views: Vec<AttemptView> = library
            .attempts()
            .iter()
            .filter(|a| filter.is_none_or(|id| a.song_id == id))
            .map(|a| AttemptView::new(a, library.get(&a.song_id).map(|s| s.as_ref())))
            .collect();
        output_result(cli, &views)
    }
}
