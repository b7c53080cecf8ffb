//! Uncompressed in-memory decoding for short previews.

use std::io::Read;
use std::path::Path;
use std::time::Duration;

use crate::error::{AudioError, AudioResult};
use crate::wave::WaveReader;

/// Frames decoded per read.
const CHUNK_FRAMES: usize = 256;

/// A fully decoded mono or stereo sound held as 16-bit PCM.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewSound {
    pub channels: u16,
    pub sample_rate: u32,
    /// Interleaved samples.
    pub samples: Vec<i16>,
}

impl PreviewSound {
    /// Decodes every sample of `reader`.
    pub fn decode<R: Read>(mut reader: WaveReader<R>) -> AudioResult<Self> {
        let channels = reader.channels();
        if !(1..=2).contains(&channels) {
            return Err(AudioError::UnsupportedFormat(format!(
                "preview supports mono or stereo, source has {channels} channels"
            )));
        }

        let capacity = usize::try_from(reader.sample_count()).unwrap_or(0);
        let mut samples = Vec::with_capacity(capacity);
        let mut buf = vec![0.0f32; CHUNK_FRAMES * usize::from(channels)];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            samples.extend(buf[..n].iter().map(|&s| to_i16(s)));
        }

        Ok(Self {
            channels,
            sample_rate: reader.sample_rate(),
            samples,
        })
    }

    /// Samples per channel.
    pub fn frame_count(&self) -> usize {
        self.samples.len() / usize::from(self.channels.max(1))
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frame_count() as f64 / f64::from(self.sample_rate))
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> u16 {
        self.samples.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0)
    }
}

fn to_i16(sample: f32) -> i16 {
    (sample * 32768.0).clamp(-32768.0, 32767.0) as i16
}

/// Decodes a waveform file into memory.
pub fn load_preview<P: AsRef<Path>>(path: P) -> AudioResult<PreviewSound> {
    PreviewSound::decode(WaveReader::open(path)?)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::wave::tests::wav_bytes;

    #[test]
    fn test_decode_mono() {
        let data = wav_bytes(1, 22050, 16, false, |w| {
            for i in 0..1000 {
                w.write_sample((i % 100) as i16 * 300).unwrap();
            }
        });
        let preview = PreviewSound::decode(WaveReader::new(Cursor::new(data)).unwrap()).unwrap();
        assert_eq!(preview.channels, 1);
        assert_eq!(preview.frame_count(), 1000);
        assert_eq!(preview.samples[1], 300);
        assert_eq!(preview.peak(), 99 * 300);
    }

    #[test]
    fn test_float_clamping() {
        let data = wav_bytes(2, 48000, 32, true, |w| {
            for s in [1.5f32, -2.0, 0.5, -0.5] {
                w.write_sample(s).unwrap();
            }
        });
        let preview = PreviewSound::decode(WaveReader::new(Cursor::new(data)).unwrap()).unwrap();
        assert_eq!(preview.samples, vec![32767, -32768, 16384, -16384]);
        assert_eq!(preview.frame_count(), 2);
    }

    #[test]
    fn test_rejects_multichannel() {
        let data = wav_bytes(4, 48000, 16, false, |w| {
            for _ in 0..4 {
                w.write_sample(0i16).unwrap();
            }
        });
        let err = PreviewSound::decode(WaveReader::new(Cursor::new(data)).unwrap()).unwrap_err();
        assert!(matches!(err, AudioError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_load_preview_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        std::fs::write(
            &path,
            wav_bytes(2, 44100, 24, false, |w| {
                for _ in 0..600 {
                    w.write_sample(4194304i32).unwrap();
                }
            }),
        )
        .unwrap();

        let preview = load_preview(&path).unwrap();
        assert_eq!(preview.frame_count(), 300);
        assert!(preview.samples.iter().all(|&s| s == 16384));
    }
}
