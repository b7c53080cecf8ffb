//! Waveform container decoding.
//!
//! [`WaveReader`] opens a RIFF/WAVE container and exposes its samples as a
//! channel-interleaved stream of normalized `f32` values. No resampling or
//! channel remixing is performed.
//!
//! Normalization by source encoding:
//!
//! | Encoding        | Conversion            |
//! |-----------------|-----------------------|
//! | 16-bit PCM      | `s / 32768`           |
//! | 24-bit PCM      | `s / 8388608`         |
//! | 32-bit PCM      | `s / 2^31`            |
//! | 32-bit float    | unchanged             |

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::error::{AudioError, AudioResult};

/// Sample encoding of a waveform container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleEncoding {
    Int16,
    Int24,
    Int32,
    Float32,
}

impl SampleEncoding {
    fn from_spec(spec: &hound::WavSpec) -> AudioResult<Self> {
        match (spec.sample_format, spec.bits_per_sample) {
            (hound::SampleFormat::Int, 16) => Ok(Self::Int16),
            (hound::SampleFormat::Int, 24) => Ok(Self::Int24),
            (hound::SampleFormat::Int, 32) => Ok(Self::Int32),
            (hound::SampleFormat::Float, 32) => Ok(Self::Float32),
            (format, bits) => Err(AudioError::UnsupportedFormat(format!(
                "only 16, 24 or 32 bit PCM or 32 bit IEEE float is supported, got {bits} bit {format:?}"
            ))),
        }
    }

    /// Divisor mapping integer samples onto [-1, 1].
    fn scale(self) -> f32 {
        match self {
            Self::Int16 => 32768.0,
            Self::Int24 => 8388608.0,
            Self::Int32 => 2147483648.0,
            Self::Float32 => 1.0,
        }
    }

    /// Bits per sample.
    pub fn bits(self) -> u16 {
        match self {
            Self::Int16 => 16,
            Self::Int24 => 24,
            Self::Int32 | Self::Float32 => 32,
        }
    }
}

/// Reads normalized, channel-interleaved samples from a waveform container.
pub struct WaveReader<R: Read> {
    inner: hound::WavReader<R>,
    channels: u16,
    sample_rate: u32,
    encoding: SampleEncoding,
    sample_count: u64,
    position: u64,
}

impl WaveReader<BufReader<File>> {
    /// Opens a waveform file.
    pub fn open<P: AsRef<Path>>(path: P) -> AudioResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "audio: opening waveform");
        Self::from_hound(hound::WavReader::open(path)?)
    }
}

impl<R: Read> WaveReader<R> {
    /// Reads a waveform container from any byte stream.
    pub fn new(reader: R) -> AudioResult<Self> {
        Self::from_hound(hound::WavReader::new(reader)?)
    }

    fn from_hound(inner: hound::WavReader<R>) -> AudioResult<Self> {
        let spec = inner.spec();
        let encoding = SampleEncoding::from_spec(&spec)?;
        if spec.channels == 0 {
            return Err(AudioError::CorruptData("container declares zero channels".to_string()));
        }
        let sample_count = u64::from(inner.len());
        if sample_count % u64::from(spec.channels) != 0 {
            return Err(AudioError::CorruptData(format!(
                "{sample_count} samples do not divide into {} channels",
                spec.channels
            )));
        }
        Ok(Self {
            inner,
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            encoding,
            sample_count,
            position: 0,
        })
    }

    /// Number of interleaved channels.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Samples per second, per channel.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Source sample encoding.
    pub fn encoding(&self) -> SampleEncoding {
        self.encoding
    }

    /// Bits per source sample.
    pub fn bits_per_sample(&self) -> u16 {
        self.encoding.bits()
    }

    /// Total number of samples across all channels.
    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// Total number of sample frames (samples per channel).
    pub fn frame_count(&self) -> u64 {
        self.sample_count / u64::from(self.channels)
    }

    /// Interleaved samples read so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Audio duration of the whole stream.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frame_count() as f64 / f64::from(self.sample_rate))
    }

    /// Fails with `UnsupportedFormat` unless the stream has exactly `channels` channels.
    pub fn expect_channels(&self, channels: u16) -> AudioResult<()> {
        if self.channels != channels {
            return Err(AudioError::UnsupportedFormat(format!(
                "expected {channels} channel(s), source has {}",
                self.channels
            )));
        }
        Ok(())
    }

    /// Fills `buf` with up to `buf.len()` normalized interleaved samples.
    ///
    /// Returns the number of samples written; 0 means end of stream. A
    /// short read is legal at the end of the stream. `buf.len()` must be a
    /// multiple of the channel count.
    pub fn read(&mut self, buf: &mut [f32]) -> AudioResult<usize> {
        let channels = usize::from(self.channels);
        if buf.len() % channels != 0 {
            return Err(AudioError::InvalidArgument(format!(
                "buffer length {} is not a multiple of {channels} channels",
                buf.len()
            )));
        }

        let filled = match self.encoding {
            SampleEncoding::Float32 => fill(self.inner.samples::<f32>(), buf, |s| s),
            encoding => {
                let scale = encoding.scale();
                fill(self.inner.samples::<i32>(), buf, |s| s as f32 / scale)
            }
        };
        let n = match filled {
            Ok(n) => n,
            Err((n, e)) => {
                let at = self.position + n as u64;
                self.position = at;
                if at < self.sample_count {
                    return Err(AudioError::CorruptData(format!(
                        "data chunk truncated after {at} of {} samples: {e}",
                        self.sample_count
                    )));
                }
                return Err(e.into());
            }
        };

        self.position += n as u64;
        if n % channels != 0 {
            return Err(AudioError::CorruptData(format!(
                "stream ended in the middle of a sample frame after {} samples",
                self.position
            )));
        }
        Ok(n)
    }
}

/// Converts samples into `buf`. On error, also returns how many were written.
fn fill<S, I>(
    samples: I,
    buf: &mut [f32],
    convert: impl Fn(S) -> f32,
) -> Result<usize, (usize, hound::Error)>
where
    I: Iterator<Item = hound::Result<S>>,
{
    let mut n = 0;
    for (slot, sample) in buf.iter_mut().zip(samples) {
        *slot = convert(sample.map_err(|e| (n, e))?);
        n += 1;
    }
    Ok(n)
}
