use crate::models::audio_models::LoudnessReading;

/// Exponential moving average over successive readings.
///
/// `smoothed = alpha * reading + (1 - alpha) * previous`. The first reading
/// passes through unchanged; `alpha = 1.0` disables smoothing.
#[derive(Debug, Clone)]
pub struct LevelSmoother {
    alpha: f32,
    current: Option<f32>,
}

impl LevelSmoother {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(f32::MIN_POSITIVE, 1.0),
            current: None,
        }
    }

    pub fn apply(&mut self, reading: LoudnessReading) -> LoudnessReading {
        let value = reading.value();
        let next = match self.current {
            Some(prev) => self.alpha * value + (1.0 - self.alpha) * prev,
            None => value,
        };
        self.current = Some(next);
        LoudnessReading::new(next)
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}
