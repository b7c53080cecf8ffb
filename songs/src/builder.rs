//! Song ingestion: decode, analyze, encode and persist in one pass.

use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use beatvault_audio::{
    AnalyzerFactory, BeatAnalyzer, BpmRange, EncoderFactory, FrameEncoder, PacketWriter, WaveReader,
};
use beatvault_kv::KVStore;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{SongError, SongResult};
use crate::keys::{sound_data_key, sound_key};
use crate::record::{rollback_song_data, save_song, save_sound};
use crate::types::{Beat, BitRate, Song, Sound};

/// Samples per channel in one encoded frame unless configured otherwise.
pub const DEFAULT_SAMPLES_PER_FRAME: usize = 512;

/// Channel count the compression pipeline accepts.
pub const REQUIRED_CHANNELS: u16 = 2;

/// Counters accumulated while compressing a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamStats {
    /// Audible samples per channel, excluding codec delay.
    pub samples: u64,
    pub number_of_packets: u32,
    pub max_packet_length: u32,
}

/// Builds songs from waveform files.
#[derive(Clone)]
pub struct SongBuilder {
    encoders: Arc<dyn EncoderFactory>,
    analyzers: Arc<dyn AnalyzerFactory>,
    samples_per_frame: usize,
}

impl SongBuilder {
    pub fn new<E, A>(encoders: E, analyzers: A) -> Self
    where
        E: EncoderFactory + 'static,
        A: AnalyzerFactory + 'static,
    {
        Self {
            encoders: Arc::new(encoders),
            analyzers: Arc::new(analyzers),
            samples_per_frame: DEFAULT_SAMPLES_PER_FRAME,
        }
    }

    /// Sets the samples per channel in each encoded frame.
    pub fn samples_per_frame(mut self, samples_per_frame: usize) -> Self {
        self.samples_per_frame = samples_per_frame;
        self
    }

    /// Compresses `source` and stores the song under `id`.
    ///
    /// Writes the sound data, then the sound record, then the song record.
    /// On failure every key already written for `id` is deleted again.
    pub fn build(
        &self,
        store: &dyn KVStore,
        id: Uuid,
        name: &str,
        source: &Path,
        bit_rate: BitRate,
        bpm: BpmRange,
    ) -> SongResult<Song> {
        let mut reader = WaveReader::open(source)?;
        reader.expect_channels(REQUIRED_CHANNELS)?;

        let result = self.build_from(store, id, name, &mut reader, bit_rate, bpm);
        if result.is_err() {
            rollback_song_data(store, &id);
        }
        result
    }

    fn build_from<R: Read>(
        &self,
        store: &dyn KVStore,
        id: Uuid,
        name: &str,
        reader: &mut WaveReader<R>,
        bit_rate: BitRate,
        bpm: BpmRange,
    ) -> SongResult<Song> {
        let sample_rate = reader.sample_rate();
        let channels = reader.channels();
        if sample_rate == 0 {
            return Err(SongError::UnsupportedFormat("sample rate of 0 Hz".to_string()));
        }

        let mut encoder = self.encoders.create(sample_rate, self.samples_per_frame, channels)?;
        encoder.set_bit_rate(bit_rate.bits_per_second())?;
        let mut analyzer = self.analyzers.create(sample_rate, channels, bpm)?;

        debug!(
            song_id = %id,
            name,
            sample_rate,
            frames = reader.frame_count(),
            delay = encoder.decoder_sample_delay(),
            "songs: compressing"
        );

        let data_key = sound_data_key(&id);
        let mut out = store.open_writer(&data_key)?;
        let stats = compress(
            reader,
            encoder.as_mut(),
            Some(analyzer.as_mut()),
            bit_rate,
            self.samples_per_frame,
            &mut out,
        )?;
        out.commit()?;

        let beats: Vec<Beat> = analyzer.finalize().into_iter().map(Beat::from).collect();

        let sound = Sound {
            channels,
            sample_rate,
            samples: stats.samples,
            number_of_packets: stats.number_of_packets,
            max_packet_length: stats.max_packet_length,
            compressed_data_key: data_key,
            stream_from_disk: true,
            spatialized: false,
        };
        save_sound(store, &sound_key(&id), &sound)?;

        let song = Song {
            id,
            name: name.to_string(),
            sound,
            beats,
        };
        save_song(store, &song)?;

        info!(
            song_id = %id,
            name,
            samples = stats.samples,
            packets = stats.number_of_packets,
            beats = song.beats.len(),
            "songs: song built"
        );
        Ok(song)
    }
}

/// Streams every sample of `reader` through `encoder` into `out`.
///
/// Frames hold `samples_per_frame` samples per channel. After the source
/// ends, `decoder_sample_delay` zero samples per channel are appended so the
/// codec flushes its lookahead; a final partial frame is zero filled. Only
/// genuine samples reach `analyzer`, re-chunked into its window size with a
/// trailing partial window dropped. The returned sample count is the source
/// length per channel.
pub fn compress<R: Read, W: Write>(
    reader: &mut WaveReader<R>,
    encoder: &mut dyn FrameEncoder,
    analyzer: Option<&mut dyn BeatAnalyzer>,
    bit_rate: BitRate,
    samples_per_frame: usize,
    out: W,
) -> SongResult<StreamStats> {
    let channels = usize::from(reader.channels());
    let frame_size = samples_per_frame * channels;
    if frame_size == 0 {
        return Err(SongError::InvalidArgument(
            "frame must hold at least one sample".to_string(),
        ));
    }

    let delay = encoder.decoder_sample_delay();
    let mut padding = u64::from(delay) * channels as u64;
    let mut frame = vec![0.0f32; frame_size];
    let mut packet = vec![0u8; bit_rate.target_packet_capacity(frame_size, reader.sample_rate())];
    let mut packets = PacketWriter::new(out);
    let mut windows = analyzer.and_then(WindowFeeder::new);
    let mut content: u64 = 0;
    let mut ended = false;

    loop {
        let mut filled = 0;
        while !ended && filled < frame_size {
            let n = reader.read(&mut frame[filled..])?;
            if n == 0 {
                ended = true;
            }
            filled += n;
        }
        if let Some(windows) = windows.as_mut() {
            windows.push(&frame[..filled]);
        }

        if ended && filled < frame_size {
            let pad = padding.min((frame_size - filled) as u64) as usize;
            padding -= pad as u64;
            frame[filled..].fill(0.0);
            content += (filled + pad) as u64;
            if filled + pad == 0 {
                break;
            }
        } else {
            content += filled as u64;
        }

        let len = encoder.encode(&frame, &mut packet)?;
        if len > packet.len() {
            return Err(SongError::Codec(format!(
                "encoder reported {len} bytes for a {} byte buffer",
                packet.len()
            )));
        }
        packets.write_packet(&packet[..len])?;
    }

    let samples = (content / channels as u64).saturating_sub(u64::from(delay));
    Ok(StreamStats {
        samples,
        number_of_packets: packets.packets(),
        max_packet_length: packets.max_packet_len() as u32,
    })
}

/// Regroups a sample stream into fixed analyzer windows.
struct WindowFeeder<'a> {
    analyzer: &'a mut dyn BeatAnalyzer,
    window: Vec<f32>,
    size: usize,
}

impl<'a> WindowFeeder<'a> {
    fn new(analyzer: &'a mut dyn BeatAnalyzer) -> Option<Self> {
        let size = analyzer.window_size();
        if size == 0 {
            return None;
        }
        Some(Self {
            analyzer,
            window: Vec::with_capacity(size),
            size,
        })
    }

    fn push(&mut self, mut samples: &[f32]) {
        while !samples.is_empty() {
            let take = (self.size - self.window.len()).min(samples.len());
            self.window.extend_from_slice(&samples[..take]);
            samples = &samples[take..];
            if self.window.len() == self.size {
                self.analyzer.step(&self.window);
                self.window.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use beatvault_audio::{AudioResult, DetectedBeat, PacketReader};

    use super::*;

    struct FixedEncoder {
        delay: u32,
        len: usize,
    }

    impl FrameEncoder for FixedEncoder {
        fn decoder_sample_delay(&self) -> u32 {
            self.delay
        }

        fn encode(&mut self, frame: &[f32], out: &mut [u8]) -> AudioResult<usize> {
            let n = self.len.min(out.len());
            out[..n].fill(frame.len() as u8);
            Ok(n)
        }
    }

    struct Collect(Vec<usize>);

    impl BeatAnalyzer for Collect {
        fn window_size(&self) -> usize {
            300
        }

        fn step(&mut self, window: &[f32]) {
            self.0.push(window.len());
        }

        fn finalize(self: Box<Self>) -> Vec<DetectedBeat> {
            Vec::new()
        }
    }

    fn stereo(frames: usize) -> WaveReader<Cursor<Vec<u8>>> {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for i in 0..frames * 2 {
                writer.write_sample((i % 1000) as i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.set_position(0);
        WaveReader::new(cursor).unwrap()
    }

    #[test]
    fn test_exact_frames_no_delay() {
        let mut reader = stereo(1024);
        let mut encoder = FixedEncoder { delay: 0, len: 10 };
        let mut out = Vec::new();
        let stats = compress(&mut reader, &mut encoder, None, BitRate::Kbps128, 512, &mut out).unwrap();

        assert_eq!(stats.samples, 1024);
        assert_eq!(stats.number_of_packets, 2);
        assert_eq!(stats.max_packet_length, 10);
        assert_eq!(out.len(), 2 * (2 + 10));
    }

    #[test]
    fn test_delay_padding_adds_frames() {
        let mut reader = stereo(1000);
        let mut encoder = FixedEncoder { delay: 100, len: 7 };
        let mut out = Vec::new();
        let stats = compress(&mut reader, &mut encoder, None, BitRate::Kbps128, 512, &mut out).unwrap();

        // 1000 + 100 frames of content need three 512-frame packets
        assert_eq!(stats.number_of_packets, 3);
        assert_eq!(stats.samples, 1000);

        let packets: Vec<Vec<u8>> = PacketReader::new(out.as_slice())
            .collect::<AudioResult<_>>()
            .unwrap();
        assert_eq!(packets.len(), 3);
        assert!(packets.iter().all(|p| p.len() == 7));
    }

    #[test]
    fn test_packets_capped_by_capacity() {
        let mut reader = stereo(600);
        let mut encoder = FixedEncoder { delay: 0, len: 10_000 };
        let stats = compress(&mut reader, &mut encoder, None, BitRate::Kbps128, 512, Vec::new()).unwrap();
        assert_eq!(stats.max_packet_length, 380);
    }

    #[test]
    fn test_analyzer_sees_only_source_windows() {
        let mut reader = stereo(1000);
        let mut encoder = FixedEncoder { delay: 512, len: 1 };
        let mut analyzer = Collect(Vec::new());
        compress(
            &mut reader,
            &mut encoder,
            Some(&mut analyzer),
            BitRate::Kbps128,
            512,
            Vec::new(),
        )
        .unwrap();

        // 2000 interleaved samples make six full 300-sample windows
        assert_eq!(analyzer.0, vec![300; 6]);
    }

    #[test]
    fn test_empty_source() {
        let mut reader = stereo(0);
        let mut encoder = FixedEncoder { delay: 0, len: 4 };
        let stats = compress(&mut reader, &mut encoder, None, BitRate::Kbps128, 512, Vec::new()).unwrap();
        assert_eq!(stats, StreamStats::default());

        let mut reader = stereo(0);
        let mut encoder = FixedEncoder { delay: 20, len: 4 };
        let stats = compress(&mut reader, &mut encoder, None, BitRate::Kbps128, 512, Vec::new()).unwrap();
        assert_eq!(stats.number_of_packets, 1);
        assert_eq!(stats.samples, 0);
    }

    #[test]
    fn test_zero_frame_rejected() {
        let mut reader = stereo(10);
        let mut encoder = FixedEncoder { delay: 0, len: 4 };
        let err = compress(&mut reader, &mut encoder, None, BitRate::Kbps128, 0, Vec::new()).unwrap_err();
        assert!(matches!(err, SongError::InvalidArgument(_)));
    }
}
