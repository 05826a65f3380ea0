use crate::models::audio_models::{AudioBuffer, LoudnessReading};
use crate::models::config::EstimatorConfig;

/// Converts one audio buffer into one loudness reading.
///
/// ```text
/// rms     = sqrt(sum(x^2) / N + epsilon)
/// level   = 20 * log10(rms)            (dBFS, <= 0 for full-scale input)
/// reading = max(level + offset, 0)
/// ```
///
/// Only channel 0 is measured. Pure and deterministic; cheap enough to run
/// on the device callback thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelEstimator {
    config: EstimatorConfig,
}

impl LevelEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    pub fn estimate(&self, buffer: &AudioBuffer<'_>) -> LoudnessReading {
        if buffer.is_empty() {
            log::trace!(
                "buffer without channel data ({} samples, {} channels), reporting silence",
                buffer.samples().len(),
                buffer.channels()
            );
            return LoudnessReading::ZERO;
        }

        let (sum_squares, count) = buffer
            .channel(0)
            .fold((0.0f64, 0usize), |(sum, n), sample| {
                let s = sample as f64;
                (sum + s * s, n + 1)
            });

        let level_db = Self::level_dbfs(sum_squares / count as f64, self.config.epsilon);
        LoudnessReading::new((level_db + self.config.offset_db) as f32)
    }

    /// Level in dBFS for a mean square value.
    pub fn level_dbfs(mean_square: f64, epsilon: f64) -> f64 {
        let rms = (mean_square + epsilon).sqrt();
        20.0 * rms.log10()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    fn sine(amplitude: f32, frames: usize) -> Vec<f32> {
        (0..frames)
            .map(|i| amplitude * (2.0 * PI * 440.0 * i as f32 / 48_000.0).sin())
            .collect()
    }

    fn square(amplitude: f32, frames: usize) -> Vec<f32> {
        (0..frames)
            .map(|i| if (i / 32) % 2 == 0 { amplitude } else { -amplitude })
            .collect()
    }

    #[test]
    fn silence_reads_exactly_zero() {
        let estimator = LevelEstimator::default();
        for len in [1, 7, 1024, 4096] {
            let samples = vec![0.0f32; len];
            let reading = estimator.estimate(&AudioBuffer::mono(&samples, 48_000));
            assert_eq!(reading.value(), 0.0, "len {len}");
        }
    }

    #[test]
    fn full_scale_constant_reads_offset() {
        let estimator = LevelEstimator::default();
        let samples = vec![1.0f32; 1024];
        let reading = estimator.estimate(&AudioBuffer::mono(&samples, 48_000));
        assert_relative_eq!(reading.value(), 100.0, epsilon = 1e-4);
    }

    #[test]
    fn half_amplitude_is_six_db_lower() {
        let estimator = LevelEstimator::default();
        let full = vec![1.0f32; 1024];
        let half = vec![0.5f32; 1024];

        let full = estimator.estimate(&AudioBuffer::mono(&full, 48_000));
        let half = estimator.estimate(&AudioBuffer::mono(&half, 48_000));

        assert_relative_eq!(full.value() - half.value(), 6.0206, epsilon = 1e-3);
    }

    #[test]
    fn louder_waves_read_higher() {
        let estimator = LevelEstimator::default();
        for wave in [sine as fn(f32, usize) -> Vec<f32>, square] {
            let full = wave(1.0, 1024);
            let half = wave(0.5, 1024);
            let full = estimator.estimate(&AudioBuffer::mono(&full, 48_000));
            let half = estimator.estimate(&AudioBuffer::mono(&half, 48_000));
            assert!(full > half, "{full} <= {half}");
        }
    }

    #[test]
    fn full_scale_sine_is_three_db_below_square() {
        let estimator = LevelEstimator::default();
        let samples = sine(1.0, 48_000);
        let reading = estimator.estimate(&AudioBuffer::mono(&samples, 48_000));
        assert_relative_eq!(reading.value(), 100.0 - 3.0103, epsilon = 1e-2);
    }

    #[test]
    fn deterministic() {
        let estimator = LevelEstimator::default();
        let samples = sine(0.3, 1024);
        let buffer = AudioBuffer::mono(&samples, 44_100);

        let first = estimator.estimate(&buffer);
        for _ in 0..10 {
            assert_eq!(estimator.estimate(&buffer), first);
        }
    }

    #[test]
    fn never_negative_for_quiet_input() {
        let estimator = LevelEstimator::default();
        let samples = vec![1e-7f32; 256];
        let reading = estimator.estimate(&AudioBuffer::mono(&samples, 48_000));
        assert!(reading.value() >= 0.0);
        assert!(reading.value().is_finite());
    }

    #[test]
    fn only_first_channel_counts() {
        let estimator = LevelEstimator::default();
        // Left silent, right full scale.
        let interleaved: Vec<f32> = (0..1024).flat_map(|_| [0.0f32, 1.0]).collect();
        let reading = estimator.estimate(&AudioBuffer::new(&interleaved, 2, 48_000));
        assert_eq!(reading.value(), 0.0);

        // Left full scale, right silent.
        let interleaved: Vec<f32> = (0..1024).flat_map(|_| [1.0f32, 0.0]).collect();
        let reading = estimator.estimate(&AudioBuffer::new(&interleaved, 2, 48_000));
        assert_relative_eq!(reading.value(), 100.0, epsilon = 1e-4);
    }

    #[test]
    fn empty_buffer_reads_zero() {
        let estimator = LevelEstimator::default();
        assert_eq!(
            estimator.estimate(&AudioBuffer::mono(&[], 48_000)),
            LoudnessReading::ZERO
        );
        let samples = [0.9f32; 16];
        assert_eq!(
            estimator.estimate(&AudioBuffer::new(&samples, 0, 48_000)),
            LoudnessReading::ZERO
        );
    }

    #[test]
    fn offset_is_configurable() {
        let estimator = LevelEstimator::new(EstimatorConfig {
            offset_db: 120.0,
            ..Default::default()
        });
        let samples = vec![0.1f32; 512];
        let reading = estimator.estimate(&AudioBuffer::mono(&samples, 48_000));
        assert_relative_eq!(reading.value(), 100.0, epsilon = 1e-3);
    }
}
