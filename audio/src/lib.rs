//! Audio decoding, beat analysis and frame encoding for song ingestion.
//!
//! - `wave`: waveform container decoding into normalized `f32` samples
//! - `beat`: beat analyzer contract and an energy-based detector
//! - `codec`: frame encoder contract, packet bitstream and the optional
//!   libopus adapter (`opus` feature)
//! - `preview`: uncompressed in-memory decoding
//!
//! # Example
//!
//! ```no_run
//! use beatvault_audio::WaveReader;
//!
//! let mut reader = WaveReader::open("song.wav")?;
//! reader.expect_channels(2)?;
//!
//! let mut buf = vec![0.0f32; 1024 * 2];
//! loop {
//!     let n = reader.read(&mut buf)?;
//!     if n == 0 {
//!         break;
//!     }
//!     // process buf[..n]
//! }
//! # Ok::<(), beatvault_audio::AudioError>(())
//! ```

pub mod beat;
pub mod codec;
pub mod error;
pub mod preview;
pub mod wave;

pub use beat::{AnalyzerFactory, BeatAnalyzer, BpmRange, DetectedBeat, EnergyAnalyzerFactory, EnergyBeatDetector};
pub use codec::{EncoderFactory, FrameEncoder, PacketReader, PacketWriter};
pub use error::{AudioError, AudioResult};
pub use preview::{PreviewSound, load_preview};
pub use wave::{SampleEncoding, WaveReader};
