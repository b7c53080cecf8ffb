//! Frame codecs and the packet bitstream.
//!
//! A [`FrameEncoder`] turns one fixed-size frame of interleaved `f32` samples
//! into one variable-length packet. Packets are stored back to back as
//! `[u16 little-endian length][packet bytes]` records, see [`packet`].
//!
//! - `opus`: libopus adapter, behind the `opus` feature

pub mod packet;

#[cfg(feature = "opus")]
pub mod opus;

use crate::error::AudioResult;

pub use packet::{PacketReader, PacketWriter};

/// A stateful block encoder.
pub trait FrameEncoder: Send {
    /// Samples per channel the decoder emits before real content.
    fn decoder_sample_delay(&self) -> u32;

    /// Sets the target bitrate in bits per second.
    ///
    /// Encoders without rate control ignore this.
    fn set_bit_rate(&mut self, _bits_per_second: u32) -> AudioResult<()> {
        Ok(())
    }

    /// Encodes one full frame into `out`, returning the packet length.
    fn encode(&mut self, frame: &[f32], out: &mut [u8]) -> AudioResult<usize>;
}

/// Creates a frame encoder for a stream.
pub trait EncoderFactory: Send + Sync {
    fn create(
        &self,
        sample_rate: u32,
        samples_per_frame: usize,
        channels: u16,
    ) -> AudioResult<Box<dyn FrameEncoder>>;
}

impl<F> EncoderFactory for F
where
    F: Fn(u32, usize, u16) -> AudioResult<Box<dyn FrameEncoder>> + Send + Sync,
{
    fn create(
        &self,
        sample_rate: u32,
        samples_per_frame: usize,
        channels: u16,
    ) -> AudioResult<Box<dyn FrameEncoder>> {
        self(sample_rate, samples_per_frame, channels)
    }
}
