use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use beatvault_audio::DetectedBeat;
use beatvault_audio::codec::packet::MAX_PACKET_LEN;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SongError;

/// Strongest-frequency values at or above this are [`BeatType::Higher`].
pub const BEAT_THRESHOLD: f32 = 0.45;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeatType {
    Lower,
    Higher,
}

impl BeatType {
    pub fn classify(strongest_frequency: f32) -> Self {
        if strongest_frequency < BEAT_THRESHOLD {
            BeatType::Lower
        } else {
            BeatType::Higher
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beat {
    pub time_offset: Duration,
    #[serde(rename = "type")]
    pub beat_type: BeatType,
}

impl From<DetectedBeat> for Beat {
    fn from(beat: DetectedBeat) -> Self {
        Self {
            time_offset: beat.time_offset,
            beat_type: BeatType::classify(beat.strongest_frequency),
        }
    }
}

/// Metadata of a compressed sound stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sound {
    pub channels: u16,
    pub sample_rate: u32,
    /// Audible length in samples per channel, excluding codec delay.
    pub samples: u64,
    pub number_of_packets: u32,
    pub max_packet_length: u32,
    /// Content store key of the packet bitstream.
    pub compressed_data_key: String,
    pub stream_from_disk: bool,
    pub spatialized: bool,
}

impl Sound {
    pub fn length(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples as f64 / f64::from(self.sample_rate))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub id: Uuid,
    pub name: String,
    pub sound: Sound,
    pub beats: Vec<Beat>,
}

impl Song {
    pub fn length(&self) -> Duration {
        self.sound.length()
    }
}

/// One play-through of a song.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongAttempt {
    pub song_id: Uuid,
    pub attempt_time: DateTime<Utc>,
    pub attempt_length: Duration,
    pub score: i64,
    pub failed: bool,
    pub zombies_killed: i32,
}

impl SongAttempt {
    /// An attempt starting now.
    ///
    /// Times are kept at microsecond precision, the resolution the catalog stores.
    pub fn new(song_id: Uuid, attempt_length: Duration, score: i64, failed: bool, zombies_killed: i32) -> Self {
        let now = Utc::now();
        let attempt_time = DateTime::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now);
        Self {
            song_id,
            attempt_time,
            attempt_length: Duration::from_micros(attempt_length.as_micros() as u64),
            score,
            failed,
            zombies_killed,
        }
    }
}

/// Target bitrate presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BitRate {
    Kbps320,
    Kbps256,
    Kbps128,
}

impl BitRate {
    pub fn kbps(self) -> u32 {
        match self {
            BitRate::Kbps320 => 320,
            BitRate::Kbps256 => 256,
            BitRate::Kbps128 => 128,
        }
    }

    pub fn bits_per_second(self) -> u32 {
        self.kbps() * 1000
    }

    /// Bytes per second of 16-bit PCM divided by target bytes per second.
    pub fn compression_ratio(self, sample_rate: u32) -> f64 {
        f64::from(sample_rate) * 2.0 / f64::from(self.kbps() * 128)
    }

    /// Output buffer size for one packet encoding `frame_size` interleaved samples.
    pub fn target_packet_capacity(self, frame_size: usize, sample_rate: u32) -> usize {
        let ratio = self.compression_ratio(sample_rate);
        if ratio <= 0.0 {
            return MAX_PACKET_LEN;
        }
        let capacity = (frame_size as f64 * 2.0 / ratio).floor();
        (capacity as usize).clamp(1, MAX_PACKET_LEN)
    }
}

impl fmt::Display for BitRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kbps{}", self.kbps())
    }
}

impl FromStr for BitRate {
    type Err = SongError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches("kbps").trim_end_matches("k");
        match digits {
            "320" => Ok(BitRate::Kbps320),
            "256" => Ok(BitRate::Kbps256),
            "128" => Ok(BitRate::Kbps128),
            _ => Err(SongError::InvalidArgument(format!(
                "unknown bit rate {s:?}, expected 320, 256 or 128"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_ratio() {
        let ratio = BitRate::Kbps128.compression_ratio(44100);
        assert!((ratio - 44100.0 * 2.0 / (128.0 * 128.0)).abs() < 1e-12);
        assert!((ratio - 5.38).abs() < 0.01);

        assert!((BitRate::Kbps320.compression_ratio(48000) - 2.34375).abs() < 1e-12);
    }

    #[test]
    fn test_target_packet_capacity() {
        // 512 stereo frames at 44.1 kHz
        assert_eq!(BitRate::Kbps128.target_packet_capacity(1024, 44100), 380);
        assert_eq!(BitRate::Kbps320.target_packet_capacity(1024, 44100), 951);
        assert_eq!(BitRate::Kbps128.target_packet_capacity(1 << 20, 8000), MAX_PACKET_LEN);
    }

    #[test]
    fn test_beat_threshold() {
        assert_eq!(BeatType::classify(0.0), BeatType::Lower);
        assert_eq!(BeatType::classify(0.449), BeatType::Lower);
        assert_eq!(BeatType::classify(0.45), BeatType::Higher);
        assert_eq!(BeatType::classify(1.0), BeatType::Higher);
    }

    #[test]
    fn test_song_length() {
        let sound = Sound {
            channels: 2,
            sample_rate: 44100,
            samples: 88200,
            number_of_packets: 174,
            max_packet_length: 100,
            compressed_data_key: "k".to_string(),
            stream_from_disk: true,
            spatialized: false,
        };
        assert_eq!(sound.length(), Duration::from_secs(2));
    }

    #[test]
    fn test_bit_rate_parse() {
        assert_eq!("128".parse::<BitRate>().unwrap(), BitRate::Kbps128);
        assert_eq!("kbps256".parse::<BitRate>().unwrap(), BitRate::Kbps256);
        assert_eq!("320k".parse::<BitRate>().unwrap(), BitRate::Kbps320);
        assert!("64".parse::<BitRate>().is_err());
        assert_eq!(BitRate::Kbps128.to_string(), "kbps128");
    }

    #[test]
    fn test_attempt_precision() {
        let attempt = SongAttempt::new(Uuid::nil(), Duration::from_nanos(1_500_999), 10, false, 3);
        assert_eq!(attempt.attempt_length, Duration::from_micros(1500));
        assert_eq!(attempt.attempt_time.timestamp_subsec_nanos() % 1000, 0);
    }
}
