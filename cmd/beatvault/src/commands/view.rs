//! Serializable views of catalog data for command output.

use beatvault_songs::{BeatType, Song, SongAttempt};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SongSummary {
    pub id: String,
    pub name: String,
    pub length_secs: f64,
    pub beats: usize,
}

impl From<&Song> for SongSummary {
    fn from(song: &Song) -> Self {
        Self {
            id: song.id.to_string(),
            name: song.name.clone(),
            length_secs: song.length().as_secs_f64(),
            beats: song.beats.len(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SoundView {
    pub channels: u16,
    pub sample_rate: u32,
    pub samples: u64,
    pub number_of_packets: u32,
    pub max_packet_length: u32,
    pub compressed_data_key: String,
}

#[derive(Debug, Serialize)]
pub struct BeatView {
    pub time_ms: u128,
    #[serde(rename = "type")]
    pub beat_type: BeatType,
}

#[derive(Debug, Serialize)]
pub struct SongDetail {
    pub id: String,
    pub name: String,
    pub length_secs: f64,
    pub sound: SoundView,
    pub beats: Vec<BeatView>,
    pub attempts: usize,
}

impl SongDetail {
    pub fn new(song: &Song, attempts: usize) -> Self {
        let sound = &song.sound;
        Self {
            id: song.id.to_string(),
            name: song.name.clone(),
            length_secs: song.length().as_secs_f64(),
            sound: SoundView {
                channels: sound.channels,
                sample_rate: sound.sample_rate,
                samples: sound.samples,
                number_of_packets: sound.number_of_packets,
                max_packet_length: sound.max_packet_length,
                compressed_data_key: sound.compressed_data_key.clone(),
            },
            beats: song
                .beats
                .iter()
                .map(|b| BeatView {
                    time_ms: b.time_offset.as_millis(),
                    beat_type: b.beat_type,
                })
                .collect(),
            attempts,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AttemptView {
    pub song_id: String,
    /// Song name, absent when it can no longer be resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song: Option<String>,
    pub attempt_time: DateTime<Utc>,
    pub length_ms: u128,
    pub score: i64,
    pub failed: bool,
    pub zombies_killed: i32,
}

impl AttemptView {
    pub fn new(attempt: &SongAttempt, song: Option<&Song>) -> Self {
        Self {
            song_id: attempt.song_id.to_string(),
            song: song.map(|s| s.name.clone()),
            attempt_time: attempt.attempt_time,
            length_ms: attempt.attempt_length.as_millis(),
            score: attempt.score,
            failed: attempt.failed,
            zombies_killed: attempt.zombies_killed,
        }
    }
}
