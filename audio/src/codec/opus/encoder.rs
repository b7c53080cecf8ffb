//! Opus frame encoder.

use std::ptr;

use tracing::debug;

use super::ffi::{self, OpusEncoder as OpusEncoderHandle};
use crate::codec::{EncoderFactory, FrameEncoder};
use crate::error::{AudioError, AudioResult};

/// Sample rates libopus accepts.
pub const SAMPLE_RATES: [u32; 5] = [8000, 12000, 16000, 24000, 48000];

/// Frame durations libopus accepts, in units of 2.5 ms.
const FRAME_UNITS: [u32; 6] = [1, 2, 4, 8, 16, 24];

/// Checks that Opus can encode `samples_per_frame` frames at `sample_rate`.
pub fn check_frame(sample_rate: u32, samples_per_frame: usize) -> AudioResult<()> {
    if !SAMPLE_RATES.contains(&sample_rate) {
        return Err(AudioError::UnsupportedFormat(format!(
            "opus cannot encode at {sample_rate} Hz"
        )));
    }
    let valid = FRAME_UNITS
        .iter()
        .any(|units| (sample_rate / 400 * units) as usize == samples_per_frame);
    if !valid {
        return Err(AudioError::UnsupportedFormat(format!(
            "{samples_per_frame} samples is not an opus frame size at {sample_rate} Hz"
        )));
    }
    Ok(())
}

/// Encodes interleaved float frames with libopus.
pub struct OpusFrameEncoder {
    handle: *mut OpusEncoderHandle,
    samples_per_frame: usize,
    channels: usize,
    lookahead: u32,
}

// Safety: the handle is owned exclusively and only touched through &mut self.
unsafe impl Send for OpusFrameEncoder {}

impl Drop for OpusFrameEncoder {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { ffi::opus_encoder_destroy(self.handle) };
            self.handle = ptr::null_mut();
        }
    }
}

impl OpusFrameEncoder {
    /// Creates a music-tuned encoder. `channels` must be 1 or 2.
    pub fn new(sample_rate: u32, samples_per_frame: usize, channels: u16) -> AudioResult<Self> {
        check_frame(sample_rate, samples_per_frame)?;
        if !(1..=2).contains(&channels) {
            return Err(AudioError::UnsupportedFormat(format!(
                "opus cannot encode {channels} channels"
            )));
        }

        let mut error = 0;
        let handle = unsafe {
            ffi::opus_encoder_create(
                sample_rate as i32,
                i32::from(channels),
                ffi::OPUS_APPLICATION_AUDIO,
                &mut error,
            )
        };
        if handle.is_null() || error != ffi::OPUS_OK {
            return Err(AudioError::Codec(format!(
                "opus: encoder create failed: {}",
                ffi::error_string(error)
            )));
        }

        let mut encoder = Self {
            handle,
            samples_per_frame,
            channels: usize::from(channels),
            lookahead: 0,
        };

        let mut lookahead: i32 = 0;
        let ret = unsafe {
            ffi::opus_encoder_ctl(
                encoder.handle,
                ffi::OPUS_GET_LOOKAHEAD_REQUEST,
                &mut lookahead as *mut i32,
            )
        };
        if ret != ffi::OPUS_OK {
            return Err(AudioError::Codec(format!(
                "opus: get lookahead failed: {}",
                ffi::error_string(ret)
            )));
        }
        encoder.lookahead = u32::try_from(lookahead).unwrap_or(0);

        debug!(sample_rate, samples_per_frame, channels, lookahead, "audio: opus encoder ready");
        Ok(encoder)
    }
}

impl FrameEncoder for OpusFrameEncoder {
    fn decoder_sample_delay(&self) -> u32 {
        self.lookahead
    }

    fn set_bit_rate(&mut self, bits_per_second: u32) -> AudioResult<()> {
        let bitrate = i32::try_from(bits_per_second)
            .map_err(|_| AudioError::InvalidArgument(format!("bitrate {bits_per_second} out of range")))?;
        let ret = unsafe {
            ffi::opus_encoder_ctl(self.handle, ffi::OPUS_SET_BITRATE_REQUEST, bitrate)
        };
        if ret != ffi::OPUS_OK {
            return Err(AudioError::Codec(format!(
                "opus: set bitrate failed: {}",
                ffi::error_string(ret)
            )));
        }
        Ok(())
    }

    fn encode(&mut self, frame: &[f32], out: &mut [u8]) -> AudioResult<usize> {
        if frame.len() != self.samples_per_frame * self.channels {
            return Err(AudioError::InvalidArgument(format!(
                "frame holds {} samples, expected {}",
                frame.len(),
                self.samples_per_frame * self.channels
            )));
        }

        let max_bytes = i32::try_from(out.len()).unwrap_or(i32::MAX);
        let n = unsafe {
            ffi::opus_encode_float(
                self.handle,
                frame.as_ptr(),
                self.samples_per_frame as i32,
                out.as_mut_ptr(),
                max_bytes,
            )
        };
        if n < 0 {
            return Err(AudioError::Codec(format!(
                "opus: encode failed: {}",
                ffi::error_string(n)
            )));
        }
        Ok(n as usize)
    }
}

/// Factory producing [`OpusFrameEncoder`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpusEncoderFactory;

impl EncoderFactory for OpusEncoderFactory {
    fn create(
        &self,
        sample_rate: u32,
        samples_per_frame: usize,
        channels: u16,
    ) -> AudioResult<Box<dyn FrameEncoder>> {
        Ok(Box::new(OpusFrameEncoder::new(sample_rate, samples_per_frame, channels)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_frame() {
        assert!(check_frame(48000, 960).is_ok());
        assert!(check_frame(48000, 120).is_ok());
        assert!(check_frame(48000, 2880).is_ok());
        assert!(check_frame(16000, 320).is_ok());

        assert!(matches!(check_frame(44100, 882), Err(AudioError::UnsupportedFormat(_))));
        assert!(matches!(check_frame(48000, 512), Err(AudioError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_encode_silence() {
        let mut encoder = OpusFrameEncoder::new(48000, 960, 2).unwrap();
        encoder.set_bit_rate(128_000).unwrap();
        assert!(encoder.decoder_sample_delay() > 0);

        let frame = vec![0.0f32; 960 * 2];
        let mut out = vec![0u8; 1500];
        let n = encoder.encode(&frame, &mut out).unwrap();
        assert!(n > 0 && n <= out.len());
    }

    #[test]
    fn test_wrong_frame_length() {
        let mut encoder = OpusFrameEncoder::new(48000, 960, 2).unwrap();
        let mut out = vec![0u8; 1500];
        let err = encoder.encode(&[0.0; 10], &mut out).unwrap_err();
        assert!(matches!(err, AudioError::InvalidArgument(_)));
    }
}
