//! Energy-based beat detection.

use std::collections::VecDeque;
use std::time::Duration;

use tracing::trace;

use super::spectrum::Spectrum;
use super::{BeatAnalyzer, BpmRange, DetectedBeat};
use crate::error::{AudioError, AudioResult};

/// Frames per analysis window.
const WINDOW_FRAMES: usize = 1024;

/// A window must exceed the moving average by this factor to count as a beat.
const SENSITIVITY: f64 = 1.4;

/// Windows quieter than this never count as beats.
const MIN_ENERGY: f64 = 1e-4;

/// Lowest frequency on the strongest-frequency scale.
const LOW_HZ: f64 = 20.0;

/// Detects beats as windows whose energy jumps above the recent average.
///
/// Each window of interleaved samples is down-mixed to mono and its mean
/// square energy is compared with the average over roughly the last second.
/// Beats closer together than the range's maximum tempo allows are
/// suppressed. The strongest frequency of a beat is the dominant FFT bin of
/// its window, mapped onto a log scale from 20 Hz (0.0) to Nyquist (1.0).
pub struct EnergyBeatDetector {
    sample_rate: u32,
    channels: usize,
    min_interval: Duration,
    history: VecDeque<f64>,
    history_len: usize,
    mono: Vec<f64>,
    spectrum: Spectrum,
    frames_seen: u64,
    last_beat: Option<Duration>,
    beats: Vec<DetectedBeat>,
}

impl EnergyBeatDetector {
    pub fn new(sample_rate: u32, channels: u16, bpm: BpmRange) -> AudioResult<Self> {
        if sample_rate == 0 {
            return Err(AudioError::InvalidArgument("sample rate must be positive".to_string()));
        }
        if channels == 0 {
            return Err(AudioError::InvalidArgument("channel count must be positive".to_string()));
        }
        let history_len = (sample_rate as usize / WINDOW_FRAMES).max(1);
        Ok(Self {
            sample_rate,
            channels: usize::from(channels),
            min_interval: bpm.min_interval(),
            history: VecDeque::with_capacity(history_len),
            history_len,
            mono: Vec::with_capacity(WINDOW_FRAMES),
            spectrum: Spectrum::new(WINDOW_FRAMES),
            frames_seen: 0,
            last_beat: None,
            beats: Vec::new(),
        })
    }

    fn average_energy(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        self.history.iter().sum::<f64>() / self.history.len() as f64
    }

    fn strongest_frequency(&mut self) -> f32 {
        let Some(bin) = self.spectrum.dominant_bin(&self.mono) else {
            return 0.0;
        };
        let hz = bin as f64 * f64::from(self.sample_rate) / self.spectrum.size() as f64;
        let nyquist = f64::from(self.sample_rate) / 2.0;
        if hz <= LOW_HZ || nyquist <= LOW_HZ {
            return 0.0;
        }
        ((hz / LOW_HZ).ln() / (nyquist / LOW_HZ).ln()).clamp(0.0, 1.0) as f32
    }
}

impl BeatAnalyzer for EnergyBeatDetector {
    fn window_size(&self) -> usize {
        WINDOW_FRAMES * self.channels
    }

    fn step(&mut self, window: &[f32]) {
        let channels = self.channels;
        self.mono.clear();
        self.mono.extend(window.chunks(channels).map(|frame| {
            frame.iter().map(|&s| f64::from(s)).sum::<f64>() / channels as f64
        }));
        if self.mono.is_empty() {
            return;
        }

        let energy = self.mono.iter().map(|s| s * s).sum::<f64>() / self.mono.len() as f64;
        let offset = Duration::from_secs_f64(self.frames_seen as f64 / f64::from(self.sample_rate));
        let spaced = self
            .last_beat
            .is_none_or(|last| offset.saturating_sub(last) >= self.min_interval);

        if energy > MIN_ENERGY && energy > SENSITIVITY * self.average_energy() && spaced {
            let strongest_frequency = self.strongest_frequency();
            trace!(?offset, energy, strongest_frequency, "audio: beat");
            self.beats.push(DetectedBeat {
                time_offset: offset,
                strongest_frequency,
            });
            self.last_beat = Some(offset);
        }

        if self.history.len() == self.history_len {
            self.history.pop_front();
        }
        self.history.push_back(energy);
        self.frames_seen += self.mono.len() as u64;
    }

    fn finalize(self: Box<Self>) -> Vec<DetectedBeat> {
        self.beats
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;

    const RATE: u32 = 44100;

    /// Stereo silence with tone bursts of one window starting every `every` frames.
    fn bursts(freq: f64, every: usize, count: usize, total: usize) -> Vec<f32> {
        let mut out = vec![0.0f32; total * 2];
        for k in 0..count {
            let start = k * every;
            for i in 0..WINDOW_FRAMES {
                let s = 0.8 * (2.0 * PI * freq * i as f64 / f64::from(RATE)).sin();
                out[(start + i) * 2] = s as f32;
                out[(start + i) * 2 + 1] = s as f32;
            }
        }
        out
    }

    fn run(samples: &[f32], bpm: BpmRange) -> Vec<DetectedBeat> {
        let mut detector: Box<dyn BeatAnalyzer> =
            Box::new(EnergyBeatDetector::new(RATE, 2, bpm).unwrap());
        let window = detector.window_size();
        assert_eq!(window, WINDOW_FRAMES * 2);
        for chunk in samples.chunks_exact(window) {
            detector.step(chunk);
        }
        detector.finalize()
    }

    #[test]
    fn test_detects_bursts() {
        // 22 windows apart: about 0.51 s, i.e. ~117 bpm
        let every = 22 * WINDOW_FRAMES;
        let samples = bursts(1000.0, every, 4, every * 4);
        let beats = run(&samples, BpmRange::new(90.0, 180.0).unwrap());

        assert_eq!(beats.len(), 4, "{beats:?}");
        for (k, beat) in beats.iter().enumerate() {
            let expected = (k * every) as f64 / f64::from(RATE);
            assert!((beat.time_offset.as_secs_f64() - expected).abs() < 1e-6);
            // ln(50) / ln(1102.5) is about 0.56
            assert!(beat.strongest_frequency > 0.45, "{beat:?}");
        }
    }

    #[test]
    fn test_low_tone_maps_low() {
        let every = 22 * WINDOW_FRAMES;
        let samples = bursts(100.0, every, 2, every * 2);
        let beats = run(&samples, BpmRange::new(90.0, 180.0).unwrap());
        assert_eq!(beats.len(), 2);
        for beat in beats {
            assert!(beat.strongest_frequency < 0.45, "{beat:?}");
        }
    }

    #[test]
    fn test_min_spacing_suppresses_close_beats() {
        // 4 windows apart is ~0.09 s, far faster than 180 bpm allows
        let every = 4 * WINDOW_FRAMES;
        let samples = bursts(1000.0, every, 10, every * 10);
        let beats = run(&samples, BpmRange::new(90.0, 180.0).unwrap());

        assert!(!beats.is_empty());
        for pair in beats.windows(2) {
            let gap = pair[1].time_offset - pair[0].time_offset;
            assert!(gap.as_secs_f64() >= 60.0 / 180.0 - 1e-9, "{gap:?}");
        }
    }

    #[test]
    fn test_silence_has_no_beats() {
        let samples = vec![0.0f32; WINDOW_FRAMES * 2 * 50];
        assert!(run(&samples, BpmRange::new(60.0, 120.0).unwrap()).is_empty());
    }

    #[test]
    fn test_rejects_zero_rate() {
        let bpm = BpmRange::new(90.0, 180.0).unwrap();
        assert!(EnergyBeatDetector::new(0, 2, bpm).is_err());
        assert!(EnergyBeatDetector::new(44100, 0, bpm).is_err());
    }
}
