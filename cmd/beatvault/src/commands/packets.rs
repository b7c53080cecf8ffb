//! Stored bitstream inspection.

use beatvault_audio::PacketReader;
use beatvault_songs::keys::sound_data_key;
use clap::Args;
use serde::Serialize;

use super::{format_bytes, open_catalog, output_result};
use crate::Cli;

/// Walk the stored packet stream of a song.
///
/// Reads every `[length][bytes]` record and checks the totals against the
/// song's sound record.
#[derive(Args)]
pub struct PacketsCommand {
    /// Song ID or name
    song: String,

    /// Also list each packet length
    #[arg(long)]
    all: bool,
}

#[derive(Debug, Default, Serialize)]
struct PacketReport {
    song_id: String,
    packets: u32,
    max_packet_length: u32,
    payload_bytes: u64,
    payload: String,
    matches_sound: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    lengths: Vec<u32>,
}

impl PacketsCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let (_, catalog) = open_catalog(cli)?;
        let song = catalog.find(&self.song)?;

        let key = sound_data_key(&song.id);
        let reader = catalog
            .store()
            .open_reader(&key)?
            .ok_or_else(|| anyhow::anyhow!("sound data {} is missing", key))?;

        let mut report = PacketReport {
            song_id: song.id.to_string(),
            ..Default::default()
        };
        for packet in PacketReader::new(reader) {
            let len = packet?.len() as u32;
            report.packets += 1;
            report.max_packet_length = report.max_packet_length.max(len);
            report.payload_bytes += u64::from(len);
            if self.all {
                report.lengths.push(len);
            }
        }
        report.payload = format_bytes(report.payload_bytes);
        report.matches_sound = report.packets == song.sound.number_of_packets
            && report.max_packet_length == song.sound.max_packet_length;

        if !report.matches_sound {
            tracing::warn!(
                song_id = %song.id,
                stored = report.packets,
                recorded = song.sound.number_of_packets,
                "packet stream disagrees with sound record"
            );
        }
        output_result(cli, &report)
    }
}
