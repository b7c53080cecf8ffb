//! Beat analysis.
//!
//! A [`BeatAnalyzer`] is a stateful detector fed one window of interleaved
//! normalized samples at a time, in stream order. Once the stream is
//! exhausted, [`BeatAnalyzer::finalize`] yields the detected beats in time
//! order.
//!
//! Analyzers are created per song through an [`AnalyzerFactory`]. Any
//! `Fn(u32, u16, BpmRange) -> AudioResult<Box<dyn BeatAnalyzer>>` closure is a
//! factory, which keeps the orchestration testable against stubs.

mod energy;
mod spectrum;

use std::time::Duration;

use crate::error::{AudioError, AudioResult};

pub use energy::EnergyBeatDetector;

/// Tempo range a detector searches, in beats per minute.
///
/// The range never spans more than one octave: `max <= 2 * min`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BpmRange {
    min: f32,
    max: f32,
}

impl BpmRange {
    /// Creates a range, failing with `InvalidArgument` if `max > 2 * min`.
    pub fn new(min: f32, max: f32) -> AudioResult<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(AudioError::InvalidArgument(format!(
                "bpm bounds must be finite, got {min}..{max}"
            )));
        }
        if max > 2.0 * min {
            return Err(AudioError::InvalidArgument(format!(
                "max bpm {max} exceeds twice min bpm {min}"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    /// Shortest allowed time between two beats.
    pub fn min_interval(&self) -> Duration {
        if self.max <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(60.0 / f64::from(self.max))
    }
}

/// A beat as reported by a detector, before classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectedBeat {
    /// Position of the beat from the start of the stream.
    pub time_offset: Duration,
    /// Dominant frequency at the beat, on a 0..1 scale.
    pub strongest_frequency: f32,
}

/// A stateful beat detector.
pub trait BeatAnalyzer: Send {
    /// Number of interleaved samples expected per [`step`](Self::step).
    fn window_size(&self) -> usize;

    /// Consumes one window of interleaved samples.
    fn step(&mut self, window: &[f32]);

    /// Ends the stream and returns the beats found, in time order.
    fn finalize(self: Box<Self>) -> Vec<DetectedBeat>;
}

/// Creates a beat analyzer for a stream.
pub trait AnalyzerFactory: Send + Sync {
    fn create(
        &self,
        sample_rate: u32,
        channels: u16,
        bpm: BpmRange,
    ) -> AudioResult<Box<dyn BeatAnalyzer>>;
}

impl<F> AnalyzerFactory for F
where
    F: Fn(u32, u16, BpmRange) -> AudioResult<Box<dyn BeatAnalyzer>> + Send + Sync,
{
    fn create(
        &self,
        sample_rate: u32,
        channels: u16,
        bpm: BpmRange,
    ) -> AudioResult<Box<dyn BeatAnalyzer>> {
        self(sample_rate, channels, bpm)
    }
}

/// Factory producing [`EnergyBeatDetector`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnergyAnalyzerFactory;

impl AnalyzerFactory for EnergyAnalyzerFactory {
    fn create(
        &self,
        sample_rate: u32,
        channels: u16,
        bpm: BpmRange,
    ) -> AudioResult<Box<dyn BeatAnalyzer>> {
        Ok(Box::new(EnergyBeatDetector::new(sample_rate, channels, bpm)?))
    }
}
