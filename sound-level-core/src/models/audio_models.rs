use std::fmt;

use serde::{Deserialize, Serialize};

/// Borrowed view over one buffer delivered by the input device.
///
/// Samples are interleaved `f32` in `[-1.0, 1.0]`:
/// `[c0_f0, c1_f0, c0_f1, c1_f1, ...]`. The view only lives for the duration
/// of the capture callback; derive what you need from it and let it go.
#[derive(Debug, Clone, Copy)]
pub struct AudioBuffer<'a> {
    samples: &'a [f32],
    channels: u16,
    sample_rate: u32,
}

impl<'a> AudioBuffer<'a> {
    pub fn new(samples: &'a [f32], channels: u16, sample_rate: u32) -> Self {
        Self {
            samples,
            channels,
            sample_rate,
        }
    }

    /// Single-channel buffer.
    pub fn mono(samples: &'a [f32], sample_rate: u32) -> Self {
        Self::new(samples, 1, sample_rate)
    }

    pub fn samples(&self) -> &'a [f32] {
        self.samples
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of complete frames. A trailing partial frame is ignored.
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// True when the buffer carries no decodable channel data.
    pub fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }

    /// Samples of one channel, one per complete frame.
    ///
    /// Returns an empty iterator when `index` is out of range.
    pub fn channel(&self, index: u16) -> impl Iterator<Item = f32> + 'a {
        let stride = self.channels.max(1) as usize;
        let frames = if index < self.channels { self.frame_count() } else { 0 };
        self.samples
            .iter()
            .skip(index as usize)
            .step_by(stride)
            .take(frames)
            .copied()
    }
}

/// Loudness of one buffer in offset decibels, never negative.
///
/// Silence sits at 0, conversation and loud sound land roughly in 60..100.
/// This is a relative indicator, not a calibrated SPL measurement.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoudnessReading(f32);

impl LoudnessReading {
    /// Neutral value shown before the first reading or after a failed start.
    pub const ZERO: Self = Self(0.0);

    /// Build a reading, clamping negative and NaN values to zero.
    pub fn new(value: f32) -> Self {
        Self(value.max(0.0))
    }

    pub fn value(&self) -> f32 {
        self.0
    }

    pub fn is_loud(&self, threshold: f32) -> bool {
        self.0 > threshold
    }
}

impl fmt::Display for LoudnessReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} dB", self.0)
    }
}

impl From<LoudnessReading> for f32 {
    fn from(reading: LoudnessReading) -> Self {
        reading.0
    }
}

/// Native format reported by the input device before the stream starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFormat {
    pub sample_rate: u32,
    pub channels: u16,
    /// Backend-specific sample format name, e.g. `"f32"` or `"i16"`.
    pub sample_format: String,
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Hz, {} ch, {}",
            self.sample_rate, self.channels, self.sample_format
        )
    }
}

/// An input device backing a capture provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSource {
    pub id: String,
    pub name: String,
    pub is_default: bool,
}

/// Counters for debugging a capture session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionDiagnostics {
    pub buffers_received: u64,
    pub malformed_buffers: u64,
    pub readings_delivered: u64,
    pub stream_errors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_zero_of_interleaved_stereo() {
        let samples = [0.1, -0.5, 0.2, -0.6, 0.3, -0.7];
        let buffer = AudioBuffer::new(&samples, 2, 48_000);

        assert_eq!(buffer.frame_count(), 3);
        assert_eq!(buffer.channel(0).collect::<Vec<_>>(), vec![0.1, 0.2, 0.3]);
        assert_eq!(buffer.channel(1).collect::<Vec<_>>(), vec![-0.5, -0.6, -0.7]);
    }

    #[test]
    fn partial_trailing_frame_is_ignored() {
        let samples = [0.1, 0.2, 0.3];
        let buffer = AudioBuffer::new(&samples, 2, 44_100);

        assert_eq!(buffer.frame_count(), 1);
        assert_eq!(buffer.channel(0).collect::<Vec<_>>(), vec![0.1]);
        assert_eq!(buffer.channel(1).collect::<Vec<_>>(), vec![0.2]);
    }

    #[test]
    fn zero_channels_means_no_data() {
        let samples = [0.5; 8];
        let buffer = AudioBuffer::new(&samples, 0, 48_000);

        assert!(buffer.is_empty());
        assert_eq!(buffer.channel(0).count(), 0);
    }

    #[test]
    fn out_of_range_channel_is_empty() {
        let samples = [0.5; 4];
        let buffer = AudioBuffer::mono(&samples, 16_000);
        assert_eq!(buffer.channel(1).count(), 0);
    }

    #[test]
    fn reading_clamps_negative_and_nan() {
        assert_eq!(LoudnessReading::new(-3.0), LoudnessReading::ZERO);
        assert_eq!(LoudnessReading::new(f32::NAN), LoudnessReading::ZERO);
        assert_eq!(LoudnessReading::new(42.5).value(), 42.5);
    }

    #[test]
    fn reading_serializes_as_plain_number() {
        let json = serde_json::to_string(&LoudnessReading::new(61.25)).unwrap();
        assert_eq!(json, "61.25");
    }

    #[test]
    fn loud_threshold() {
        assert!(LoudnessReading::new(71.0).is_loud(70.0));
        assert!(!LoudnessReading::new(70.0).is_loud(70.0));
    }
}
