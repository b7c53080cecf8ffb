//! Uncompressed decode summary of a WAV file.

use std::path::PathBuf;

use beatvault_audio::{AnalyzerFactory, BpmRange, EnergyAnalyzerFactory, PreviewSound, WaveReader};
use beatvault_songs::{Beat, BeatType};
use clap::Args;
use serde::Serialize;

use super::{get_config, output_result};
use crate::Cli;

/// Decode a WAV file in memory without compressing or storing it.
#[derive(Args)]
pub struct PreviewCommand {
    /// Path to a mono or stereo WAV file
    wav: PathBuf,

    /// Also run beat detection with the configured tempo range
    #[arg(long)]
    beats: bool,
}

#[derive(Debug, Serialize)]
struct PreviewReport {
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
    encoding: String,
    frames: usize,
    duration_secs: f64,
    peak: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    beats: Option<BeatCounts>,
}

#[derive(Debug, Default, Serialize)]
struct BeatCounts {
    lower: usize,
    higher: usize,
}

impl PreviewCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let reader = WaveReader::open(&self.wav)?;
        let bits_per_sample = reader.bits_per_sample();
        let encoding = format!("{:?}", reader.encoding());
        let sound = PreviewSound::decode(reader)?;

        let beats = if self.beats {
            let cfg = get_config(cli)?;
            Some(count_beats(&sound, BpmRange::new(cfg.min_bpm, cfg.max_bpm)?)?)
        } else {
            None
        };

        let report = PreviewReport {
            channels: sound.channels,
            sample_rate: sound.sample_rate,
            bits_per_sample,
            encoding,
            frames: sound.frame_count(),
            duration_secs: sound.duration().as_secs_f64(),
            peak: sound.peak(),
            beats,
        };
        output_result(cli, &report)
    }
}

fn count_beats(sound: &PreviewSound, bpm: BpmRange) -> anyhow::Result<BeatCounts> {
    let mut analyzer = EnergyAnalyzerFactory.create(sound.sample_rate, sound.channels, bpm)?;
    let window = analyzer.window_size();

    let mut buf = vec![0.0f32; window];
    for chunk in sound.samples.chunks_exact(window) {
        for (dst, &src) in buf.iter_mut().zip(chunk) {
            *dst = f32::from(src) / 32768.0;
        }
        analyzer.step(&buf);
    }

    let mut counts = BeatCounts::default();
    for beat in analyzer.finalize().into_iter().map(Beat::from) {
        match beat.beat_type {
            BeatType::Lower => counts.lower += 1,
            BeatType::Higher => counts.higher += 1,
        }
    }
    Ok(counts)
}
